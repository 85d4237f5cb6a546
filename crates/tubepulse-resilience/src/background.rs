// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort work detached from the request path.
//!
//! A failure here never reaches the caller that spawned the task. It is
//! logged and counted instead, and [`BackgroundTasks::shutdown`] waits for
//! anything still in flight.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

/// Tracker for detached best-effort tasks.
#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
    failures: Arc<AtomicU64>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `fut` without tying its outcome to the caller.
    pub fn spawn_best_effort<Fut, T, E>(&self, name: &'static str, fut: Fut) -> JoinHandle<()>
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let failures = self.failures.clone();
        self.tracker.spawn(async move {
            match fut.await {
                Ok(_) => debug!(task = name, "background task completed"),
                Err(e) => {
                    failures.fetch_add(1, Ordering::Relaxed);
                    error!(task = name, error = %e, "background task failed");
                }
            }
        })
    }

    /// Failed tasks since creation.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Tasks spawned but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every in-flight task to finish.
    pub async fn shutdown(&self) {
        let pending = self.tracker.len();
        if pending > 0 {
            info!(pending, "waiting for background tasks");
        }
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tracing_test::traced_test;

    #[tokio::test]
    async fn successful_tasks_are_not_counted_as_failures() {
        let tasks = BackgroundTasks::new();
        tasks.spawn_best_effort("ok", async { Ok::<_, String>(1) });
        tasks.shutdown().await;
        assert_eq!(tasks.failures(), 0);
        assert_eq!(tasks.in_flight(), 0);
    }

    #[tokio::test]
    #[traced_test]
    async fn failures_are_counted_and_logged() {
        let tasks = BackgroundTasks::new();
        tasks.spawn_best_effort("increment", async { Err::<(), _>("store offline") });
        tasks.spawn_best_effort("increment", async { Err::<(), _>("store offline") });
        tasks.shutdown().await;

        assert_eq!(tasks.failures(), 2);
        assert!(logs_contain("background task failed"));
        assert!(logs_contain("store offline"));
    }

    #[tokio::test]
    async fn shutdown_waits_for_in_flight_work() {
        let tasks = BackgroundTasks::new();
        let done = Arc::new(AtomicU64::new(0));
        let flag = done.clone();
        tasks.spawn_best_effort("slow", async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            flag.store(1, Ordering::SeqCst);
            Ok::<_, String>(())
        });

        tasks.shutdown().await;
        assert_eq!(done.load(Ordering::SeqCst), 1);

        // Still usable afterwards.
        tasks.spawn_best_effort("again", async { Ok::<_, String>(()) });
        tasks.shutdown().await;
        assert_eq!(tasks.failures(), 0);
    }
}
