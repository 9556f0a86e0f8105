//! Configuration types and parsing
//!
//! The firmware embeds a `cover.toml` and parses it at boot with the
//! `no_std` parser in [`toml`].

pub mod toml;
pub mod types;

pub use self::toml::{parse_config, ParseError};
pub use types::*;
