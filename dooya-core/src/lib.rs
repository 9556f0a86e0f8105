//! Board-agnostic cover logic for Dooya tubular motors
//!
//! This crate turns the wire protocol from `dooya-protocol` into a window
//! cover with a tracked position and motion state:
//!
//! - Cover state model (operation + position)
//! - Reply interpretation and the poll register rotation
//! - Half-duplex link handshake over an RS-485 transceiver
//! - Poll scheduling (register rotation, stale reply recovery)
//! - Configuration types and a `no_std` TOML parser
//!
//! Nothing here owns a timer or an executor. The firmware feeds received
//! bytes in, asks for poll frames on its own schedule, and decides what to
//! do when the link stays busy.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod cover;
pub mod link;
pub mod scheduler;
pub mod state;

pub use config::{parse_config, CoverConfig, ParseError, UnknownPositionPolicy};
pub use cover::{Cover, CoverError, Outcome};
pub use link::{CoverDriver, DriverError, HalfDuplexLink, LinkError, StatePublisher};
pub use scheduler::{PollScheduler, PollTick};
pub use state::{CoverAction, CoverOperation, CoverState, CoverTraits};
