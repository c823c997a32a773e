//! Hard-deadline timer abstraction
//!
//! Models a one-shot high-resolution timer whose callback runs in hard
//! (non-deferred) context. The callback decides whether it fires again by
//! returning [`TimerRestart`]; before returning [`TimerRestart::Restart`] it
//! moves the deadline with [`HardTimer::forward`], which is relative to the
//! previous deadline so bit timing never accumulates callback latency.
//!
//! All times are integer nanoseconds on the facility's monotonic clock.

/// Outcome of a timer callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerRestart {
    /// Timer is done; it becomes inactive once the callback returns
    NoRestart,
    /// Timer fires again at the (already forwarded) deadline
    Restart,
}

impl TimerRestart {
    /// True if the timer stays armed
    pub fn is_restart(self) -> bool {
        self == TimerRestart::Restart
    }
}

/// One-shot hard timer
pub trait HardTimer {
    /// Current time of the timer's clock
    fn now_ns(&self) -> u64;

    /// Arm for an absolute deadline
    fn start_at(&mut self, deadline_ns: u64);

    /// Arm for `now + delay`
    fn start_after(&mut self, delay_ns: u64) {
        let deadline = self.now_ns().saturating_add(delay_ns);
        self.start_at(deadline);
    }

    /// Move the deadline one period past the previous deadline
    ///
    /// Only meaningful from inside the callback, right before returning
    /// [`TimerRestart::Restart`].
    fn forward(&mut self, period_ns: u64);

    /// Cancel a pending expiry
    ///
    /// No new callback starts after this returns, but one already running
    /// keeps running; poll [`HardTimer::is_active`] to wait for it.
    fn cancel(&mut self);

    /// True while armed or while the callback is executing
    fn is_active(&self) -> bool;
}
