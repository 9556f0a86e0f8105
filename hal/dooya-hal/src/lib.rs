//! Dooya Hardware Abstraction Layer
//!
//! Traits for the two pieces of hardware the cover driver touches: the
//! serial port wired to the RS-485 transceiver, and the transceiver's
//! driver-enable (DE) pin that switches the half-duplex bus between
//! receive and transmit.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  dooya-core (HalfDuplexLink)            │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  dooya-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  dooya-firmware (embassy-rp adapters)   │
//! └─────────────────────────────────────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod uart;

pub use gpio::{NoPin, OutputPin};
pub use uart::{Parity, StopBits, UartConfig, UartTx};
