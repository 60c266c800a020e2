//! Scheduler trait and the tokio implementation

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::task::AbortHandle;

/// Handle identifying a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl TimerId {
    /// Allocates a fresh, process-unique timer id.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Trait for the scheduling primitive used by the search debounce.
///
/// `after` runs `task` once `delay` has passed unless `cancel` is called
/// first. Cancelling an unknown or already fired timer is a no-op.
pub trait Scheduler: Send + Sync {
    /// Schedules `task` to run after `delay`.
    fn after(&self, delay: Duration, task: BoxFuture<'static, ()>) -> TimerId;

    /// Cancels a pending task.
    fn cancel(&self, timer: TimerId);
}

/// Scheduler that spawns each task on the current tokio runtime.
///
/// Cancelled tasks are aborted, so a task that already started running is
/// stopped at its next await point.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use datatable_lib::schedule::{Scheduler, TokioScheduler};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let scheduler = TokioScheduler::new();
/// let timer = scheduler.after(Duration::from_millis(500), Box::pin(async {
///     println!("fired");
/// }));
/// scheduler.cancel(timer);
/// assert_eq!(scheduler.pending(), 0);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TokioScheduler {
    timers: Arc<DashMap<TimerId, AbortHandle>>,
}

impl TokioScheduler {
    /// Creates a scheduler with no pending tasks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of tasks that have not fired or been cancelled.
    pub fn pending(&self) -> usize {
        self.timers.len()
    }
}

impl Scheduler for TokioScheduler {
    fn after(&self, delay: Duration, task: BoxFuture<'static, ()>) -> TimerId {
        let id = TimerId::next();
        let timers = self.timers.clone();

        // Hold the slot until the handle is stored so the task's own removal
        // cannot run first.
        let slot = self.timers.entry(id);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            timers.remove(&id);
            task.await;
        });
        slot.insert(handle.abort_handle());

        log::trace!("[schedule] {} scheduled in {:?}", id, delay);
        id
    }

    fn cancel(&self, timer: TimerId) {
        if let Some((_, handle)) = self.timers.remove(&timer) {
            handle.abort();
            log::trace!("[schedule] {} cancelled", timer);
        }
    }
}
