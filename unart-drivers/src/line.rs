//! embedded-hal pin adapters
//!
//! Pin errors never reach the engines: they run in interrupt and timer
//! context with nobody to report to. A failed read returns the idle (high)
//! level, so a flaky pin cannot fake a start bit. A failed write is
//! dropped; the next bit overwrites it anyway.

use embedded_hal::digital::{InputPin, OutputPin};
use unart_hal::{EdgeInterrupt, InputLine, OutputLine};

/// RX line: an input pin plus the interrupt that watches it
///
/// `embedded-hal` has no blocking edge-interrupt API, so the board supplies
/// its own [`EdgeInterrupt`] (EXTI line, GPIO bank IRQ, ...).
pub struct HalInput<P, E> {
    pin: P,
    irq: E,
    can_sleep: bool,
}

impl<P: InputPin, E: EdgeInterrupt> HalInput<P, E> {
    /// Memory-mapped pin, safe to read from interrupt context
    pub fn new(pin: P, irq: E) -> Self {
        Self {
            pin,
            irq,
            can_sleep: false,
        }
    }

    /// Pin behind a bus (I2C/SPI expander); setup will refuse it
    pub fn may_sleep(pin: P, irq: E) -> Self {
        Self {
            pin,
            irq,
            can_sleep: true,
        }
    }

    pub fn release(self) -> (P, E) {
        (self.pin, self.irq)
    }
}

impl<P: InputPin, E> InputLine for HalInput<P, E> {
    fn is_high(&mut self) -> bool {
        self.pin.is_high().unwrap_or(true)
    }

    fn can_sleep(&self) -> bool {
        self.can_sleep
    }
}

impl<P, E: EdgeInterrupt> EdgeInterrupt for HalInput<P, E> {
    fn enable_falling_edge(&mut self) {
        self.irq.enable_falling_edge();
    }

    fn disable(&mut self) {
        self.irq.disable();
    }
}

/// TX line
pub struct HalOutput<P> {
    pin: P,
    can_sleep: bool,
}

impl<P: OutputPin> HalOutput<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            can_sleep: false,
        }
    }

    /// Pin behind a bus (I2C/SPI expander); setup will refuse it
    pub fn may_sleep(pin: P) -> Self {
        Self {
            pin,
            can_sleep: true,
        }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> OutputLine for HalOutput<P> {
    fn set_high(&mut self) {
        let _ = self.pin.set_high();
    }

    fn set_low(&mut self) {
        let _ = self.pin.set_low();
    }

    fn can_sleep(&self) -> bool {
        self.can_sleep
    }
}
