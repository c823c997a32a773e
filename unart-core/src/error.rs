//! Error types

use unart_hal::LineDirection;

/// Errors that prevent an engine from being created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetupError {
    /// Line access may sleep, which the hard contexts cannot tolerate
    LineCanSleep(LineDirection),
    /// Baud rate is zero or too high to give a non-zero bit period
    InvalidBaudRate(u32),
}

/// Errors from applying line settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineConfigError {
    /// Framing other than 8N1 was requested
    ///
    /// The baud rate has still been applied.
    UnsupportedFraming,
    /// Baud rate is zero or too high; previous timing kept
    InvalidBaudRate(u32),
}

