//! # Tick Scheduling Module
//!
//! The detection loop runs as a repeating task bound to the host's frame
//! clock. The host decides *when* a tick fires; the task decides *whether*
//! it may run. Each tick checks the task's [`CancellationToken`] on entry,
//! so a tick queued before a stop can never touch the store afterwards.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// A shared flag that flips once, from live to cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A cancellable task that fires once per `interval`.
#[derive(Debug)]
pub struct RepeatingTask {
    interval: Duration,
    token: CancellationToken,
    ticks: u64,
}

impl RepeatingTask {
    pub fn start(interval: Duration) -> Self {
        Self { interval, token: CancellationToken::new(), ticks: 0 }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// A handle that can cancel this task from anywhere.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_live(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Entry check for one tick. Returns `false` once the task has been
    /// cancelled; otherwise counts the tick and returns `true`.
    pub fn begin_tick(&mut self) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        self.ticks += 1;
        true
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
