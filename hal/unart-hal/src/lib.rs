//! unart Hardware Abstraction Layer
//!
//! This crate defines the capabilities the soft UART consumes but does not
//! implement itself. A board port provides them on top of its GPIO, edge
//! interrupt and high-resolution timer hardware.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  unart-core (RX / TX bit engines)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  unart-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ unart-drivers │       │  board timer  │
//! │ (embedded-hal)│       │   + IRQ glue  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::InputLine`], [`gpio::OutputLine`], [`gpio::EdgeInterrupt`] - Line I/O
//! - [`timer::HardTimer`] - One-shot hard-deadline timer with forward rearm
//! - [`uart::UartConfig`] - Requested serial line settings

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod timer;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use gpio::{EdgeInterrupt, InputLine, LineDirection, OutputLine};
pub use timer::{HardTimer, TimerRestart};
pub use uart::{DataBits, Parity, StopBits, UartConfig};
