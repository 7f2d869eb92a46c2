//! Watch handles and the shared terminal-state latch.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Process-unique id of one watch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(pub(crate) u64);

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch-{}", self.0)
    }
}

/// Lifecycle of one watch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchState {
    Running,
    Confirmed,
    TimedOut,
    Cancelled,
    Errored,
}

impl WatchState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => WatchState::Confirmed,
            2 => WatchState::TimedOut,
            3 => WatchState::Cancelled,
            4 => WatchState::Errored,
            _ => WatchState::Running,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            WatchState::Running => 0,
            WatchState::Confirmed => 1,
            WatchState::TimedOut => 2,
            WatchState::Cancelled => 3,
            WatchState::Errored => 4,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != WatchState::Running
    }
}

/// State shared between a watch task and everyone who may cancel it.
///
/// Leaving `Running` is a single compare-and-swap, so exactly one of "the task
/// delivers a terminal callback" and "a caller cancels" wins.
pub(crate) struct WatchControl {
    state: AtomicU8,
    attempts: AtomicU32,
    pub(crate) wake: Notify,
}

impl WatchControl {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(WatchState::Running.as_u8()),
            attempts: AtomicU32::new(0),
            wake: Notify::new(),
        }
    }

    pub(crate) fn state(&self) -> WatchState {
        WatchState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.state() == WatchState::Cancelled
    }

    /// Claim the right to finish with `terminal`. True for exactly one caller.
    pub(crate) fn try_finish(&self, terminal: WatchState) -> bool {
        debug_assert!(terminal.is_terminal());
        self.state
            .compare_exchange(
                WatchState::Running.as_u8(),
                terminal.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub(crate) fn cancel(&self) -> bool {
        let won = self.try_finish(WatchState::Cancelled);
        if won {
            // Stores a permit if the task is not parked right now.
            self.wake.notify_one();
        }
        won
    }

    pub(crate) fn record_attempt(&self, attempt: u32) {
        self.attempts.store(attempt, Ordering::Release);
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Acquire)
    }
}

/// Cloneable cancel-only view of a watch, safe to hand to other tasks.
#[derive(Clone)]
pub struct WatchCanceller {
    id: WatchId,
    control: Arc<WatchControl>,
}

impl WatchCanceller {
    pub fn id(&self) -> WatchId {
        self.id
    }

    /// Cancel the watch. Idempotent.
    ///
    /// Returns `true` if this call stopped a running watch. Once it returns, no
    /// callback of the watch will start.
    pub fn cancel(&self) -> bool {
        let cancelled = self.control.cancel();
        if cancelled {
            tracing::info!(watch = %self.id, "watch cancelled");
        }
        cancelled
    }

    pub fn state(&self) -> WatchState {
        self.control.state()
    }
}

/// Owner's handle to a running watch.
pub struct WatchHandle {
    canceller: WatchCanceller,
    task: JoinHandle<()>,
}

impl WatchHandle {
    pub(crate) fn new(id: WatchId, control: Arc<WatchControl>, task: JoinHandle<()>) -> Self {
        Self {
            canceller: WatchCanceller { id, control },
            task,
        }
    }

    pub fn id(&self) -> WatchId {
        self.canceller.id
    }

    /// See [`WatchCanceller::cancel`].
    pub fn cancel(&self) -> bool {
        self.canceller.cancel()
    }

    pub fn canceller(&self) -> WatchCanceller {
        self.canceller.clone()
    }

    pub fn state(&self) -> WatchState {
        self.canceller.state()
    }

    /// Polls issued so far.
    pub fn attempts(&self) -> u32 {
        self.canceller.control.attempts()
    }

    /// Whether the watch task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the watch task to exit.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_terminal_transition_wins() {
        let control = WatchControl::new();
        assert!(control.try_finish(WatchState::Confirmed));
        assert!(!control.cancel());
        assert!(!control.try_finish(WatchState::TimedOut));
        assert_eq!(control.state(), WatchState::Confirmed);
    }

    #[test]
    fn cancel_is_idempotent() {
        let control = WatchControl::new();
        assert!(control.cancel());
        assert!(!control.cancel());
        assert!(control.is_cancelled());
        assert!(!control.try_finish(WatchState::Confirmed));
    }

    #[test]
    fn state_encoding_roundtrips() {
        for s in [
            WatchState::Running,
            WatchState::Confirmed,
            WatchState::TimedOut,
            WatchState::Cancelled,
            WatchState::Errored,
        ] {
            assert_eq!(WatchState::from_u8(s.as_u8()), s);
        }
    }
}
