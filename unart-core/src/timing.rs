//! Line timing
//!
//! Bit period and RX sample offset, derived from the baud rate. Recomputed
//! on every rate change; a frame already in flight keeps the timing it was
//! using when its next deadline was computed.

/// Nanoseconds per second
pub const NSEC_PER_SEC: u64 = 1_000_000_000;

/// Timing of one line direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineTiming {
    /// Duration of one bit (ns)
    pub period_ns: u64,
    /// Delay from a detected start edge to the first sample (ns)
    pub skew_ns: u64,
}

impl LineTiming {
    /// Compute timing for a baud rate and sample offset
    ///
    /// `skew_percent` is clamped to 100. The resulting skew is kept strictly
    /// inside the bit (`skew_ns < period_ns`) so the first sample always
    /// lands in the start bit.
    ///
    /// Returns `None` for a rate of zero or one so high the period
    /// truncates to zero.
    pub fn new(baud_rate: u32, skew_percent: u32) -> Option<Self> {
        if baud_rate == 0 {
            return None;
        }
        let period_ns = NSEC_PER_SEC / baud_rate as u64;
        if period_ns == 0 {
            return None;
        }
        let skew_ns = (period_ns * skew_percent.min(100) as u64 / 100).min(period_ns - 1);
        Some(Self { period_ns, skew_ns })
    }

    /// Duration of a whole 10-bit frame (ns)
    pub fn frame_ns(&self) -> u64 {
        self.period_ns * 10
    }
}
