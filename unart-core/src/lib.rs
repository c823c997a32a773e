//! Bit-banged UART engines
//!
//! This crate contains the protocol logic of the soft UART, independent of
//! any particular board:
//!
//! - Byte queues between the bit engines and the byte-stream side
//! - Line timing derived from the baud rate and RX sample skew
//! - RX engine (falling-edge interrupt + hard timer sampling)
//! - TX engine (write path + hard timer driving)
//! - Deferred notifier decoupling consumer callbacks from hard contexts
//! - Device assembly and configuration
//!
//! # Execution contexts
//!
//! ```text
//!  edge IRQ ──▶ RxEngine ──▶ RX queue ──▶ Deferred ──▶ ByteConsumer
//!  RX timer ──▶    │                        (task)
//!                  │ diagnostic toggle
//!                  ▼
//!  write() ───▶ TxEngine ◀── TX queue
//!  TX timer ──▶    │ drained ──▶ Deferred ──▶ writers / ByteConsumer
//! ```
//!
//! Edge and timer handlers never block. Everything that may sleep runs from
//! [`Unart::run_deferred`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod config;
pub mod consumer;
pub mod deferred;
pub mod device;
pub mod error;
pub mod frame;
pub mod queue;
pub mod rx;
pub mod timing;
pub mod tx;

#[cfg(test)]
pub(crate) mod sim;

pub use config::{DeviceConfig, DiagnosticMode, UnartParams};
pub use consumer::ByteConsumer;
pub use device::Unart;
pub use error::{LineConfigError, SetupError};
pub use rx::{RxEngine, RxStats, SampleProbe, RX_QUEUE_SIZE};
pub use timing::LineTiming;
pub use tx::{TxEngine, TxStats, TX_QUEUE_SIZE};
