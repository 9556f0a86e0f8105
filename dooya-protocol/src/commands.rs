//! Command payloads sent to the motor
//!
//! Commands fall into two classes:
//! - `CONTROL`: motion commands, echoed back by the motor
//! - `READ`: register polls, answered with a status report

use crate::frame::{DeviceAddress, Frame, FrameError};

// Command class identifiers
pub const CLASS_READ: u8 = 0x01;
pub const CLASS_CONTROL: u8 = 0x03;

// Control sub-commands
pub const CTRL_OPEN: u8 = 0x01;
pub const CTRL_CLOSE: u8 = 0x02;
pub const CTRL_STOP: u8 = 0x03;
pub const CTRL_SET_POSITION: u8 = 0x04;

/// Target byte meaning "no target" in a `SET_POSITION` command
pub const NO_TARGET: u8 = 0xFF;

// Readable registers
pub const REG_POSITION: u8 = 0x02;
pub const REG_STATUS: u8 = 0x05;

/// Number of registers requested by a poll
const READ_COUNT: u8 = 0x01;

/// Frame class byte
///
/// `WRITE` (0x02) exists on the wire for reconfiguring a motor but is
/// never sent or accepted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandClass {
    Read,
    Control,
}

impl CommandClass {
    /// Parse a class from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            CLASS_READ => Some(CommandClass::Read),
            CLASS_CONTROL => Some(CommandClass::Control),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            CommandClass::Read => CLASS_READ,
            CommandClass::Control => CLASS_CONTROL,
        }
    }
}

/// Motion command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlCommand {
    Stop,
    /// Run to the fully open limit
    Open,
    /// Run to the fully closed limit
    Close,
    /// Run to a percentage (0 = closed, 100 = open); `None` is sent as
    /// [`NO_TARGET`]
    SetPosition(Option<u8>),
}

impl ControlCommand {
    /// Sub-command byte
    pub fn code(&self) -> u8 {
        match self {
            ControlCommand::Stop => CTRL_STOP,
            ControlCommand::Open => CTRL_OPEN,
            ControlCommand::Close => CTRL_CLOSE,
            ControlCommand::SetPosition(_) => CTRL_SET_POSITION,
        }
    }

    /// Encode this command into a frame for `address`
    pub fn to_frame(&self, address: DeviceAddress) -> Result<Frame, FrameError> {
        match self {
            ControlCommand::SetPosition(target) => Frame::encode(
                address,
                CommandClass::Control,
                &[CTRL_SET_POSITION, target.unwrap_or(NO_TARGET)],
            ),
            _ => Frame::encode(address, CommandClass::Control, &[self.code()]),
        }
    }
}

/// Register polled by a `READ` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadRequest {
    /// Position percentage
    #[default]
    Position,
    /// Motor run state
    Status,
}

impl ReadRequest {
    /// Parse a request from its register byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            REG_POSITION => Some(ReadRequest::Position),
            REG_STATUS => Some(ReadRequest::Status),
            _ => None,
        }
    }

    /// Register byte
    pub fn to_byte(self) -> u8 {
        match self {
            ReadRequest::Position => REG_POSITION,
            ReadRequest::Status => REG_STATUS,
        }
    }

    /// Encode this request into a frame for `address`
    pub fn to_frame(&self, address: DeviceAddress) -> Result<Frame, FrameError> {
        Frame::encode(address, CommandClass::Read, &[self.to_byte(), READ_COUNT])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{crc16, FRAME_START};

    const ADDR: DeviceAddress = DeviceAddress::new(0x01, 0x02);

    #[test]
    fn test_close_frame_bytes() {
        let frame = ControlCommand::Close.to_frame(ADDR).unwrap();
        assert_eq!(
            frame.as_bytes(),
            &[FRAME_START, 0x01, 0x02, CLASS_CONTROL, CTRL_CLOSE, 0x09, 0x01]
        );
    }

    #[test]
    fn test_single_byte_control_payloads() {
        for (cmd, code) in [
            (ControlCommand::Stop, CTRL_STOP),
            (ControlCommand::Open, CTRL_OPEN),
            (ControlCommand::Close, CTRL_CLOSE),
        ] {
            let frame = cmd.to_frame(ADDR).unwrap();
            assert_eq!(frame.class(), CommandClass::Control);
            assert_eq!(frame.payload(), &[code]);
        }
    }

    #[test]
    fn test_set_position_payload() {
        let frame = ControlCommand::SetPosition(Some(42)).to_frame(ADDR).unwrap();
        assert_eq!(frame.payload(), &[CTRL_SET_POSITION, 42]);

        let frame = ControlCommand::SetPosition(None).to_frame(ADDR).unwrap();
        assert_eq!(frame.payload(), &[CTRL_SET_POSITION, NO_TARGET]);
    }

    #[test]
    fn test_read_request_payload() {
        let frame = ReadRequest::Position.to_frame(ADDR).unwrap();
        assert_eq!(frame.class(), CommandClass::Read);
        assert_eq!(frame.payload(), &[REG_POSITION, 0x01]);

        let frame = ReadRequest::Status.to_frame(ADDR).unwrap();
        assert_eq!(frame.payload(), &[REG_STATUS, 0x01]);
        let crc = crc16(&frame.as_bytes()[..6]);
        assert_eq!(frame.checksum(), crc);
    }

    #[test]
    fn test_class_bytes() {
        assert_eq!(CommandClass::from_byte(CLASS_READ), Some(CommandClass::Read));
        assert_eq!(CommandClass::from_byte(CLASS_CONTROL), Some(CommandClass::Control));
        // WRITE
        assert_eq!(CommandClass::from_byte(0x02), None);
    }

    #[test]
    fn test_unknown_register() {
        assert_eq!(ReadRequest::from_byte(REG_STATUS), Some(ReadRequest::Status));
        assert!(ReadRequest::from_byte(0x03).is_none());
    }
}
