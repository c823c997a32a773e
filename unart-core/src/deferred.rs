//! Deferred work requests
//!
//! Hard contexts never call consumer code directly. They post a request
//! here and a task running in a schedulable context picks it up. Posting an
//! already-pending request is a no-op, so a burst of completed bytes
//! results in one delivery that drains them all.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// One coalescing work item
pub struct Deferred {
    pending: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for Deferred {
    fn default() -> Self {
        Self::new()
    }
}

impl Deferred {
    pub const fn new() -> Self {
        Self {
            pending: Signal::new(),
        }
    }

    /// Request the work to run; safe from any context
    pub fn schedule(&self) {
        self.pending.signal(());
    }

    /// Check if a request is outstanding
    pub fn is_pending(&self) -> bool {
        self.pending.signaled()
    }

    /// Claim an outstanding request without waiting
    pub fn take(&self) -> bool {
        self.pending.try_take().is_some()
    }

    /// Wait for and claim the next request
    pub async fn wait(&self) {
        self.pending.wait().await
    }
}

/// Which deferred item became ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Work {
    /// Hand received bytes to the consumer
    PushReceived,
    /// Wake drain waiters and tell the consumer TX has room
    WakeWriters,
}

/// Wait for whichever of the two device work items is requested first
pub async fn next_work(push: &Deferred, wakeup: &Deferred) -> Work {
    match select(push.wait(), wakeup.wait()).await {
        Either::First(()) => Work::PushReceived,
        Either::Second(()) => Work::WakeWriters,
    }
}
