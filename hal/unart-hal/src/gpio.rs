//! Line I/O abstractions
//!
//! The engines touch their lines from interrupt and hard-timer context, so
//! every implementation must be callable without blocking. Lines that cannot
//! promise this (GPIOs behind an I2C/SPI expander, for example) report it via
//! `can_sleep` and are refused at setup.

/// Which side of the soft UART a line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineDirection {
    /// Receive line (input)
    Rx,
    /// Transmit line (output)
    Tx,
}

/// Digital input line
pub trait InputLine {
    /// Read the current logic level (true = 1)
    fn is_high(&mut self) -> bool;

    /// Read the current logic level inverted
    fn is_low(&mut self) -> bool {
        !self.is_high()
    }

    /// Read the level as a bit value (0 or 1)
    fn read_bit(&mut self) -> u8 {
        u8::from(self.is_high())
    }

    /// True if reading this line may sleep
    fn can_sleep(&self) -> bool;
}

/// Digital output line
pub trait OutputLine {
    /// Drive the line high (logic 1)
    fn set_high(&mut self);

    /// Drive the line low (logic 0)
    fn set_low(&mut self);

    /// Drive the line to a specific level
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// True if driving this line may sleep
    fn can_sleep(&self) -> bool;
}

/// Falling-edge interrupt source attached to an input line
///
/// The board glue calls the receiver's edge handler from the interrupt.
/// The source starts out disabled.
pub trait EdgeInterrupt {
    /// Start delivering falling-edge interrupts
    fn enable_falling_edge(&mut self);

    /// Stop delivering interrupts
    ///
    /// A handler already running may still complete.
    fn disable(&mut self);
}
