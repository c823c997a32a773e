//! Configuration
//!
//! Global defaults (one set per system), per-device overrides, and the
//! runtime diagnostic switch shared by both engines of every device.

use portable_atomic::{AtomicBool, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default RX sample offset, percent of one bit period
///
/// Below the centre of the bit to leave room for interrupt latency, which
/// only ever delays the sample. Too far from the centre makes RX sensitive
/// to clock drift and slow edges.
pub const DEFAULT_RX_SKEW_PERCENT: u32 = 30;

/// Default line speed before any line configuration is applied
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Global parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnartParams {
    /// RX sample offset used when a device does not set its own (0-100)
    pub rx_skew_percent: u32,
    /// Start with diagnostic mode enabled
    pub rx_debug: bool,
    /// Initial baud rate for both directions
    pub baud_rate: u32,
}

impl Default for UnartParams {
    fn default() -> Self {
        Self {
            rx_skew_percent: DEFAULT_RX_SKEW_PERCENT,
            rx_debug: false,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// Per-device properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceConfig {
    /// RX sample offset override (percent, clamped to 0-100)
    pub rx_skew_percent: Option<u32>,
}

impl DeviceConfig {
    /// Effective skew: the device value if set, else the global one, clamped
    pub fn effective_skew_percent(&self, params: &UnartParams) -> u32 {
        self.rx_skew_percent
            .unwrap_or(params.rx_skew_percent)
            .min(100)
    }
}

/// Diagnostic (RX timing measurement) mode
///
/// When enabled, TX ignores all written data and the TX line is toggled
/// every time RX samples its line, so sampling can be checked against the
/// incoming signal on a scope. Can be flipped at any time.
#[derive(Debug, Default)]
pub struct DiagnosticMode {
    enabled: AtomicBool,
}

impl DiagnosticMode {
    /// Create with an initial state
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    /// Create from the global parameters
    pub const fn from_params(params: &UnartParams) -> Self {
        Self::new(params.rx_debug)
    }

    /// Check if diagnostic mode is on
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Switch diagnostic mode on or off
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }
}
