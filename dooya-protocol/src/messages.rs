//! Replies received from the motor
//!
//! Both reply kinds use the same frame layout; the class byte decides how
//! the payload is read:
//! - `CONTROL`: the motor echoes the motion command it accepted
//! - `READ`: the motor reports the register that was polled. The report
//!   does not say which register it is, so the caller supplies the request
//!   it has outstanding.

use crate::commands::{
    CommandClass, ControlCommand, ReadRequest, CTRL_CLOSE, CTRL_OPEN, CTRL_SET_POSITION,
    CTRL_STOP, NO_TARGET,
};
use crate::frame::Frame;

/// Offset of the echoed sub-command in a control reply
pub const CONTROL_CODE_OFFSET: usize = 4;

/// Offset of the echoed target in a `SET_POSITION` reply
pub const CONTROL_TARGET_OFFSET: usize = 5;

/// Offset of the register value in a status report
pub const STATUS_VALUE_OFFSET: usize = 6;

/// Position value reported while the motor has no travel limits set
pub const POSITION_UNKNOWN: u8 = 0xFF;

// Motor run state codes
const STATUS_STOPPED: u8 = 0x00;
const STATUS_OPENING: u8 = 0x01;
const STATUS_CLOSING: u8 = 0x02;

/// Errors decoding a CRC-valid frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Control echo carries an unknown sub-command
    UnknownControl(u8),
    /// Status report carries an unknown run state
    UnknownStatus(u8),
    /// Frame ends before the field being read
    MissingField,
}

/// Position register value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PositionReading {
    /// Travel limits not set; the motor cannot tell where it is
    Unknown,
    /// Percentage open, as reported (not clamped)
    Percent(u8),
}

impl PositionReading {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            POSITION_UNKNOWN => PositionReading::Unknown,
            percent => PositionReading::Percent(percent),
        }
    }
}

/// Status register value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorStatus {
    Stopped,
    Opening,
    Closing,
}

impl MotorStatus {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            STATUS_STOPPED => Some(MotorStatus::Stopped),
            STATUS_OPENING => Some(MotorStatus::Opening),
            STATUS_CLOSING => Some(MotorStatus::Closing),
            _ => None,
        }
    }
}

/// Decoded status report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusReport {
    Position(PositionReading),
    Motion(MotorStatus),
}

/// Decoded reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    /// Echo of an accepted motion command
    Response(ControlCommand),
    /// Answer to a register poll
    Status(StatusReport),
}

impl Message {
    /// Decode a reply
    ///
    /// `pending` is the register most recently polled; it decides how a
    /// `READ` frame is interpreted and is ignored for `CONTROL` frames.
    pub fn decode(frame: &Frame, pending: ReadRequest) -> Result<Self, DecodeError> {
        match frame.class() {
            CommandClass::Control => Self::decode_response(frame).map(Message::Response),
            CommandClass::Read => Self::decode_status(frame, pending).map(Message::Status),
        }
    }

    fn decode_response(frame: &Frame) -> Result<ControlCommand, DecodeError> {
        let code = field(frame, CONTROL_CODE_OFFSET)?;
        match code {
            CTRL_STOP => Ok(ControlCommand::Stop),
            CTRL_OPEN => Ok(ControlCommand::Open),
            CTRL_CLOSE => Ok(ControlCommand::Close),
            CTRL_SET_POSITION => {
                let target = field(frame, CONTROL_TARGET_OFFSET)?;
                Ok(ControlCommand::SetPosition(
                    (target != NO_TARGET).then_some(target),
                ))
            }
            other => Err(DecodeError::UnknownControl(other)),
        }
    }

    fn decode_status(frame: &Frame, pending: ReadRequest) -> Result<StatusReport, DecodeError> {
        let value = field(frame, STATUS_VALUE_OFFSET)?;
        match pending {
            ReadRequest::Position => Ok(StatusReport::Position(PositionReading::from_byte(value))),
            ReadRequest::Status => MotorStatus::from_byte(value)
                .map(StatusReport::Motion)
                .ok_or(DecodeError::UnknownStatus(value)),
        }
    }
}

fn field(frame: &Frame, offset: usize) -> Result<u8, DecodeError> {
    frame.byte_at(offset).ok_or(DecodeError::MissingField)
}
