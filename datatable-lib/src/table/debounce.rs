//! Debounced search commits.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::schedule::Scheduler;
use crate::schedule::TimerId;

/// Default quiescence interval for search input.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Outcome of feeding a keystroke to the [`Debouncer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Debounced {
    /// The commit was scheduled on a timer.
    Scheduled(TimerId),
    /// Debouncing is off; the caller commits this term right away.
    Immediate(String),
}

/// Delays search commits until the input has been quiet for an interval.
///
/// Every call to [`input`](Self::input) cancels the pending commit and
/// restarts the timer, so only the last term of a burst is committed.
pub struct Debouncer {
    scheduler: Arc<dyn Scheduler>,
    delay: Option<Duration>,
    pending: Mutex<Option<TimerId>>,
}

impl Debouncer {
    /// Creates a debouncer. A `delay` of `None` or zero commits immediately.
    pub fn new(scheduler: Arc<dyn Scheduler>, delay: Option<Duration>) -> Self {
        Self {
            scheduler,
            delay: delay.filter(|d| !d.is_zero()),
            pending: Mutex::new(None),
        }
    }

    /// Returns the quiescence interval, if debouncing is on.
    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    /// Feeds a new search term.
    ///
    /// `commit` produces the future that runs when the timer fires.
    pub fn input<F>(&self, term: String, commit: F) -> Debounced
    where
        F: FnOnce(String) -> BoxFuture<'static, ()>,
    {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = pending.take() {
            self.scheduler.cancel(timer);
        }

        match self.delay {
            Some(delay) => {
                let timer = self.scheduler.after(delay, commit(term));
                *pending = Some(timer);
                Debounced::Scheduled(timer)
            }
            None => Debounced::Immediate(term),
        }
    }

    /// Cancels the pending commit, if any.
    pub fn cancel(&self) {
        let timer = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(timer) = timer {
            self.scheduler.cancel(timer);
        }
    }

    /// Returns `true` while a commit is scheduled.
    ///
    /// A commit that already fired is still reported until the next
    /// `input` or `cancel`.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}
