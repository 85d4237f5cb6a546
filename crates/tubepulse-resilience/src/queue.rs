// SPDX-FileCopyrightText: 2026 Tubepulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded-concurrency admission control.
//!
//! Slots are tokio semaphore permits. The semaphore hands released permits to
//! waiters in the order they started waiting, which gives FIFO admission among
//! queued tasks. A permit is returned when the task's future finishes or is
//! dropped, so a failing or cancelled task always lets the next one in.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, trace, warn};
use tubepulse_core::TubepulseError;

/// Point-in-time queue occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    /// Tasks currently holding a slot.
    pub active: usize,
    /// Tasks waiting for a slot.
    pub queued: usize,
    /// Maximum concurrent tasks.
    pub limit: usize,
}

/// Admission control wrapper around outbound calls.
///
/// Cloning is cheap; clones share slots and the wait list.
#[derive(Debug, Clone)]
pub struct RequestQueue {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    limit: usize,
    slots: Arc<Semaphore>,
    waiting: AtomicUsize,
}

impl RequestQueue {
    /// Create a queue admitting at most `limit` concurrent tasks.
    ///
    /// A limit of zero is raised to one so that queued tasks can always run.
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            inner: Arc::new(Inner {
                limit,
                slots: Arc::new(Semaphore::new(limit)),
                waiting: AtomicUsize::new(0),
            }),
        }
    }

    pub fn limit(&self) -> usize {
        self.inner.limit
    }

    /// Run `task` once a slot is free and return its output unchanged.
    ///
    /// Starts immediately when fewer than `limit` tasks are running, otherwise
    /// waits behind earlier arrivals.
    pub async fn enqueue<F, Fut>(&self, task: F) -> Fut::Output
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        let _slot = self.admit().await;
        task().await
    }

    /// [`enqueue`](Self::enqueue) under a caller-side deadline covering both
    /// the wait for a slot and the task itself.
    pub async fn enqueue_with_timeout<F, Fut, T>(
        &self,
        timeout: Duration,
        task: F,
    ) -> Result<T, TubepulseError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, TubepulseError>>,
    {
        match tokio::time::timeout(timeout, self.enqueue(task)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(timeout_ms = timeout.as_millis() as u64, "queued request timed out");
                Err(TubepulseError::Timeout { duration: timeout })
            }
        }
    }

    /// Non-blocking snapshot for health reporting. Not for control decisions.
    pub fn status(&self) -> QueueStatus {
        let limit = self.inner.limit;
        QueueStatus {
            active: limit.saturating_sub(self.inner.slots.available_permits()),
            queued: self.inner.waiting.load(Ordering::Acquire),
            limit,
        }
    }

    /// Wait for a slot. `None` means the semaphore was closed and the caller
    /// runs without one.
    async fn admit(&self) -> Option<OwnedSemaphorePermit> {
        if let Ok(permit) = self.inner.slots.clone().try_acquire_owned() {
            trace!(limit = self.inner.limit, "request admitted immediately");
            return Some(permit);
        }

        let _waiting = WaitingGuard::enter(&self.inner.waiting);
        debug!(
            queued = self.inner.waiting.load(Ordering::Relaxed),
            limit = self.inner.limit,
            "request queued"
        );
        match self.inner.slots.clone().acquire_owned().await {
            Ok(permit) => {
                trace!("queued request admitted");
                Some(permit)
            }
            Err(_) => {
                warn!(limit = self.inner.limit, "request queue closed, running without a slot");
                None
            }
        }
    }
}

/// Counts a caller in the wait list for as long as it is waiting, including
/// when the waiting future is dropped.
struct WaitingGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> WaitingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self { counter }
    }
}

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::sync::oneshot;
    use tokio::task::JoinSet;

    async fn wait_until<F: Fn() -> bool>(condition: F) {
        for _ in 0..1000 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_never_exceeds_limit() {
        let queue = RequestQueue::new(3);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut set = JoinSet::new();

        for i in 0..20 {
            let queue = queue.clone();
            let running = running.clone();
            let peak = peak.clone();
            set.spawn(async move {
                queue
                    .enqueue(|| async move {
                        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        running.fetch_sub(1, Ordering::SeqCst);
                        i
                    })
                    .await
            });
        }

        let mut completed = Vec::new();
        while let Some(result) = set.join_next().await {
            completed.push(result.unwrap());
        }
        completed.sort_unstable();
        assert_eq!(completed, (0..20).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(queue.status(), QueueStatus { active: 0, queued: 0, limit: 3 });
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn failures_stay_with_their_caller() {
        let queue = RequestQueue::new(1);
        let mut set = JoinSet::new();

        for i in 0..6u32 {
            let queue = queue.clone();
            set.spawn(async move {
                let result: Result<u32, String> = queue
                    .enqueue(|| async move {
                        tokio::time::sleep(Duration::from_millis(2)).await;
                        if i % 2 == 0 { Err(format!("task {i} failed")) } else { Ok(i) }
                    })
                    .await;
                (i, result)
            });
        }

        while let Some(joined) = set.join_next().await {
            let (i, result) = joined.unwrap();
            if i % 2 == 0 {
                assert_eq!(result, Err(format!("task {i} failed")));
            } else {
                assert_eq!(result, Ok(i));
            }
        }
        assert_eq!(queue.status().active, 0);
    }

    #[tokio::test]
    async fn waiting_tasks_start_in_arrival_order() {
        let queue = RequestQueue::new(1);
        let order = Arc::new(Mutex::new(Vec::new()));
        let (release, gate) = oneshot::channel::<()>();

        let blocker = {
            let queue = queue.clone();
            tokio::spawn(async move {
                queue
                    .enqueue(|| async move {
                        let _ = gate.await;
                    })
                    .await
            })
        };
        wait_until(|| queue.status().active == 1).await;

        let mut waiters = Vec::new();
        for i in 0..5 {
            let queue_for_task = queue.clone();
            let order = order.clone();
            waiters.push(tokio::spawn(async move {
                queue_for_task
                    .enqueue(|| async move {
                        order.lock().unwrap().push(i);
                    })
                    .await
            }));
            wait_until(|| queue.status().queued == i + 1).await;
        }

        release.send(()).unwrap();
        blocker.await.unwrap();
        for waiter in waiters {
            waiter.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn status_reports_active_and_queued() {
        let queue = RequestQueue::new(2);
        let mut gates = Vec::new();
        let mut handles = Vec::new();

        for _ in 0..3 {
            let (tx, rx) = oneshot::channel::<()>();
            gates.push(tx);
            let queue = queue.clone();
            handles.push(tokio::spawn(async move {
                queue
                    .enqueue(|| async move {
                        let _ = rx.await;
                    })
                    .await
            }));
        }

        wait_until(|| queue.status() == QueueStatus { active: 2, queued: 1, limit: 2 }).await;

        for gate in gates {
            let _ = gate.send(());
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(queue.status(), QueueStatus { active: 0, queued: 0, limit: 2 });
    }

    #[tokio::test]
    async fn timeout_surfaces_and_releases_the_slot() {
        let queue = RequestQueue::new(1);
        let result: Result<(), TubepulseError> = queue
            .enqueue_with_timeout(Duration::from_millis(20), || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(TubepulseError::Timeout { .. })));
        assert_eq!(queue.status().active, 0);

        let value = queue
            .enqueue_with_timeout(Duration::from_millis(200), || async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn abandoned_waiter_leaves_the_wait_list() {
        let queue = RequestQueue::new(1);
        let (release, gate) = oneshot::channel::<()>();
        let holder = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.enqueue(|| async move { let _ = gate.await; }).await })
        };
        wait_until(|| queue.status().active == 1).await;

        let abandoned = queue
            .enqueue_with_timeout(Duration::from_millis(10), || async { Ok(()) })
            .await;
        assert!(matches!(abandoned, Err(TubepulseError::Timeout { .. })));
        assert_eq!(queue.status().queued, 0);

        release.send(()).unwrap();
        holder.await.unwrap();
        assert_eq!(queue.enqueue(|| async { 1 }).await, 1);
    }

    #[tokio::test]
    async fn closed_semaphore_still_runs_tasks() {
        let queue = RequestQueue::new(1);
        queue.inner.slots.close();
        assert_eq!(queue.enqueue(|| async { 3 }).await, 3);
        assert_eq!(queue.status().queued, 0);
    }

    #[test]
    fn zero_limit_is_raised_to_one() {
        assert_eq!(RequestQueue::new(0).limit(), 1);
    }
}
