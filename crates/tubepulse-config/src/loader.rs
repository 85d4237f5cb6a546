// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tubepulse.toml` > `~/.config/tubepulse/tubepulse.toml`
//! > `/etc/tubepulse/tubepulse.toml` with environment variable overrides via
//! the `TUBEPULSE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::TubepulseConfig;

/// Sections addressable from environment variables.
const ENV_SECTIONS: &[&str] = &["upstream", "quota", "storage", "logging"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tubepulse/tubepulse.toml`
/// 3. `~/.config/tubepulse/tubepulse.toml`
/// 4. `./tubepulse.toml`
/// 5. `TUBEPULSE_*` environment variables
pub fn load_config() -> Result<TubepulseConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<TubepulseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TubepulseConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TubepulseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TubepulseConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TubepulseConfig::default()))
        .merge(Toml::file("/etc/tubepulse/tubepulse.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("tubepulse/tubepulse.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("tubepulse.toml"))
        .merge(env_provider())
}

/// Environment provider mapping `TUBEPULSE_SECTION_KEY` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `TUBEPULSE_UPSTREAM_MAX_CONCURRENT` is `upstream.max_concurrent`.
fn env_provider() -> Env {
    Env::prefixed("TUBEPULSE_").map(|key| {
        let key_str = key.as_str();
        for section in ENV_SECTIONS {
            if let Some(rest) = key_str
                .strip_prefix(section)
                .and_then(|r| r.strip_prefix('_'))
            {
                return format!("{section}.{rest}").into();
            }
        }
        key_str.to_string().into()
    })
}
