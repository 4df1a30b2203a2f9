//! In-process deferred call scheduler
//!
//! Runs each accepted `DeferredCall` on its own tokio task: sleep for the
//! remaining delay, then hand the notice to the dispatcher. Calls are
//! attempted once; there is no retry and no ordering between calls.

use crate::dispatcher::NotificationDispatcher;
use async_trait::async_trait;
use fm_platform::{DeferredCall, DeferredScheduler};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

/// Scheduler counters
#[derive(Debug, Default)]
struct SchedulerCounters {
    scheduled: AtomicU64,
    fired: AtomicU64,
    cancelled: AtomicU64,
}

/// Scheduler status information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub running: bool,
    pub scheduled: u64,
    pub fired: u64,
    pub cancelled: u64,
    pub pending: usize,
}

/// Tokio-backed deferred scheduler for threshold notifications
pub struct TokioScheduler {
    dispatcher: NotificationDispatcher,
    /// Only calls addressed to this handler are accepted
    handler: String,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    counters: Arc<SchedulerCounters>,
}

impl TokioScheduler {
    pub fn new(dispatcher: NotificationDispatcher, handler: impl Into<String>) -> Self {
        Self {
            dispatcher,
            handler: handler.into(),
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
            counters: Arc::new(SchedulerCounters::default()),
        }
    }

    /// Wait until every accepted call has fired or been cancelled
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Cancel pending calls and refuse new ones
    pub async fn shutdown(&self) {
        info!("Scheduler shutting down, {} calls pending", self.tracker.len());
        self.shutdown.cancel();
        self.drain().await;
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.is_running(),
            scheduled: self.counters.scheduled.load(Ordering::Relaxed),
            fired: self.counters.fired.load(Ordering::Relaxed),
            cancelled: self.counters.cancelled.load(Ordering::Relaxed),
            pending: self.tracker.len(),
        }
    }
}

#[async_trait]
impl DeferredScheduler for TokioScheduler {
    async fn schedule(&self, call: DeferredCall) -> anyhow::Result<()> {
        if !self.is_running() {
            anyhow::bail!("Scheduler is shut down");
        }
        if call.handler != self.handler {
            anyhow::bail!("Unknown deferred handler: {}", call.handler);
        }

        self.counters.scheduled.fetch_add(1, Ordering::Relaxed);
        debug!(
            "Scheduled {} on queue {} (delay: {:?})",
            call.handler, call.queue, call.delay
        );

        let dispatcher = self.dispatcher.clone();
        let shutdown = self.shutdown.clone();
        let counters = self.counters.clone();

        self.tracker.spawn(async move {
            if let Some(delay) = call.delay {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        counters.cancelled.fetch_add(1, Ordering::Relaxed);
                        debug!(
                            "Deferred notification to group {} cancelled",
                            call.notice.notification_group_id
                        );
                        return;
                    },
                    _ = tokio::time::sleep(delay) => {},
                }
            }
            dispatcher.dispatch(&call.notice).await;
            counters.fired.fetch_add(1, Ordering::Relaxed);
        });

        Ok(())
    }
}
