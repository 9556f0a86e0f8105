//! Dooya RS-485 Motor Protocol
//!
//! This crate defines the half-duplex serial protocol spoken by Dooya
//! tubular motors (DT-series and compatibles). It contains no I/O: bytes go
//! in, frames and decoded messages come out.
//!
//! # Protocol Overview
//!
//! Commands and replies share one frame layout:
//! ```text
//! ┌───────┬─────────┬───────┬──────────────┬──────────────┐
//! │ START │ ADDRESS │ CLASS │ PAYLOAD      │ CRC-16 (LE)  │
//! │ 1B    │ 2B      │ 1B    │ 1–26B        │ 2B           │
//! └───────┴─────────┴───────┴──────────────┴──────────────┘
//! ```
//!
//! Frames carry no length field. A receiver knows a frame is complete only
//! when the trailing two bytes match the CRC of everything before them, so
//! the [`FrameAssembler`] re-checks the CRC after every byte once the
//! shortest possible frame has arrived.
//!
//! The class byte tells the two reply kinds apart: a `CONTROL` frame echoes
//! a motion command, a `READ` frame reports the register that was polled.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod commands;
pub mod frame;
pub mod messages;

pub use commands::{CommandClass, ControlCommand, ReadRequest};
pub use frame::{
    crc16, validate, DeviceAddress, Frame, FrameAssembler, FrameError, FRAME_START,
    MAX_FRAME_SIZE, MIN_FRAME_SIZE,
};
pub use messages::{DecodeError, Message, MotorStatus, PositionReading, StatusReport};
