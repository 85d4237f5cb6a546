// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Tubepulse.
//!
//! Defines the error type, the canonical video/channel/quota model, the
//! semi-structured [`RawValue`] used for upstream payloads, and the adapter
//! traits that storage and upstream backends implement.

pub mod error;
pub mod traits;
pub mod types;
pub mod value;

pub use error::TubepulseError;
pub use types::{
    AccountQuota, AdapterType, ChannelInfo, HealthStatus, QuotaOutcome, QuotaStatus,
    UsageEntry, UsageRecord, Video, VideoKind, BLOCKED_LIMIT, UNRESOLVABLE_LIMIT,
};
pub use value::RawValue;

pub use traits::{AccountStore, PluginAdapter, StorageAdapter, UpstreamClient, UsageStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_account_store<T: AccountStore>() {}
        fn _assert_usage_store<T: UsageStore>() {}
        fn _assert_upstream_client<T: UpstreamClient>() {}
    }

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [
            AdapterType::Storage,
            AdapterType::Upstream,
            AdapterType::Observability,
        ] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn health_status_serializes_with_detail() {
        let json = serde_json::to_value(HealthStatus::Degraded("3 waiting".into())).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["detail"], "3 waiting");
        let json = serde_json::to_value(HealthStatus::Healthy).unwrap();
        assert_eq!(json["status"], "healthy");
    }
}
