//! Line adapters for the soft UART
//!
//! Bridges `embedded-hal` 1.0 digital pins onto the line traits in
//! `unart-hal`, so any HAL with blocking GPIO can carry the engines in
//! `unart-core`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod line;

pub use line::{HalInput, HalOutput};
