//! Minimal TOML parser for cover configuration
//!
//! Handles only the subset `cover.toml` needs. It does NOT support the
//! full TOML grammar.
//!
//! Supported features:
//! - `[cover]` and `[uart]` section headers
//! - Key = value pairs (string, decimal or `0x` hex integer)
//! - Comments (# ...), including trailing comments
//!
//! Example:
//! ```toml
//! [cover]
//! address = 0xFEFE
//! poll_interval_ms = 2000
//! unknown_position = "midpoint"
//!
//! [uart]
//! baudrate = 9600
//! ```

use dooya_hal::uart::{Parity, StopBits};
use dooya_protocol::DeviceAddress;

use super::types::{CoverConfig, UnknownPositionPolicy};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not valid in its section
    UnknownKey,
    /// Line is not `key = value`
    InvalidLine,
    /// Invalid value type or out of range
    InvalidValue,
    /// No `address` given in `[cover]`
    MissingAddress,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Cover,
    Uart,
}

/// Parse TOML configuration into a [`CoverConfig`]
pub fn parse_config(input: &str) -> Result<CoverConfig, ParseError> {
    let mut config = CoverConfig::default();
    let mut section = Section::Root;
    let mut have_address = false;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidLine)?;
        match section {
            Section::Cover => {
                if key == "address" {
                    have_address = true;
                }
                apply_cover_value(&mut config, key, value)?;
            }
            Section::Uart => apply_uart_value(&mut config, key, value)?,
            Section::Root => return Err(ParseError::UnknownKey),
        }
    }

    if !have_address {
        return Err(ParseError::MissingAddress);
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "cover" => Ok(Section::Cover),
        "uart" => Ok(Section::Uart),
        _ => Err(ParseError::InvalidSection),
    }
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = if let Some(hash_pos) = value.find('#') {
        // Make sure # is not inside a string
        let quote_count = value[..hash_pos].matches('"').count();
        if quote_count % 2 == 0 {
            value[..hash_pos].trim()
        } else {
            value
        }
    } else {
        value
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn parse_string(value: &str) -> &str {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        // Allow unquoted strings for simple values
        value
    }
}

/// Parse a decimal or `0x`-prefixed hex integer, with optional `_` separators
fn parse_int<T: TryFrom<u32>>(value: &str) -> Result<T, ParseError> {
    let mut digits = [0u8; 16];
    let mut len = 0;
    for &b in value.as_bytes().iter().filter(|&&b| b != b'_') {
        *digits.get_mut(len).ok_or(ParseError::InvalidValue)? = b;
        len += 1;
    }
    let text = core::str::from_utf8(&digits[..len]).map_err(|_| ParseError::InvalidValue)?;

    let raw = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse::<u32>(),
    }
    .map_err(|_| ParseError::InvalidValue)?;

    T::try_from(raw).map_err(|_| ParseError::InvalidValue)
}

fn parse_unknown_position(value: &str) -> Result<UnknownPositionPolicy, ParseError> {
    match parse_string(value) {
        "midpoint" => Ok(UnknownPositionPolicy::Midpoint),
        "keep" => Ok(UnknownPositionPolicy::Keep),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_parity(value: &str) -> Result<Parity, ParseError> {
    match parse_string(value) {
        "none" => Ok(Parity::None),
        "even" => Ok(Parity::Even),
        "odd" => Ok(Parity::Odd),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_stop_bits(value: &str) -> Result<StopBits, ParseError> {
    match parse_int::<u8>(value)? {
        1 => Ok(StopBits::One),
        2 => Ok(StopBits::Two),
        _ => Err(ParseError::InvalidValue),
    }
}

fn apply_cover_value(config: &mut CoverConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "address" => config.address = DeviceAddress::from(parse_int::<u16>(value)?),
        "poll_interval_ms" => {
            let interval = parse_int::<u32>(value)?;
            if interval == 0 {
                return Err(ParseError::InvalidValue);
            }
            config.poll_interval_ms = interval;
        }
        "position_refresh_polls" => config.position_refresh_polls = parse_int(value)?,
        "stale_after_polls" => config.stale_after_polls = parse_int(value)?,
        "unknown_position" => config.unknown_position = parse_unknown_position(value)?,
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

fn apply_uart_value(config: &mut CoverConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "baudrate" => config.uart.baudrate = parse_int(value)?,
        "parity" => config.uart.parity = parse_parity(value)?,
        "stop_bits" => config.uart.stop_bits = parse_stop_bits(value)?,
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}
