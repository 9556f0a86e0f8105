//! Cover session for a single motor
//!
//! [`Cover`] owns everything the protocol needs to remember between bytes:
//! the receive assembler, the tracked [`CoverState`], and which register the
//! next poll asks for. It performs no I/O. Commands come out as [`Frame`]s
//! for the caller to transmit, and every received byte goes through
//! [`Cover::feed`], which reports when a reply has settled the link.

use dooya_protocol::commands::NO_TARGET;
use dooya_protocol::{
    ControlCommand, DecodeError, DeviceAddress, Frame, FrameAssembler, FrameError, Message,
    MotorStatus, PositionReading, ReadRequest, StatusReport,
};

use crate::config::{CoverConfig, UnknownPositionPolicy};
use crate::state::{
    percent_to_position, position_to_percent, CoverAction, CoverOperation, CoverState,
    CoverTraits, COVER_CLOSED, COVER_OPEN, POSITION_MIDPOINT,
};

/// Errors from the cover session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CoverError {
    /// CRC-valid reply that makes no sense; dropped without a state change
    Decode(DecodeError),
    /// Command frame could not be built
    Frame(FrameError),
    /// Requested position outside 0.0..=1.0
    PositionOutOfRange,
}

impl From<DecodeError> for CoverError {
    fn from(e: DecodeError) -> Self {
        CoverError::Decode(e)
    }
}

impl From<FrameError> for CoverError {
    fn from(e: FrameError) -> Self {
        CoverError::Frame(e)
    }
}

/// Result of feeding one byte
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// No complete reply yet
    Pending,
    /// A reply was applied and the bus is free for the next command.
    /// `publish` carries the new state when it should be pushed to the
    /// automation side.
    Settled { publish: Option<CoverState> },
}

/// Protocol session for one motor
#[derive(Debug, Clone)]
pub struct Cover {
    address: DeviceAddress,
    assembler: FrameAssembler,
    state: CoverState,
    request: ReadRequest,
    unknown_position: UnknownPositionPolicy,
    position_known: bool,
}

impl Cover {
    pub fn new(config: &CoverConfig) -> Self {
        Self {
            address: config.address,
            assembler: FrameAssembler::new(config.address),
            state: CoverState::default(),
            request: ReadRequest::Position,
            unknown_position: config.unknown_position,
            position_known: false,
        }
    }

    pub fn traits(&self) -> CoverTraits {
        CoverTraits::default()
    }

    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    /// Current tracked state
    pub fn state(&self) -> CoverState {
        self.state
    }

    /// Register the next poll will ask for
    pub fn pending_request(&self) -> ReadRequest {
        self.request
    }

    /// Make the next poll ask for the position again
    ///
    /// After a position reply the session switches to status polls and
    /// stays there; the poll scheduler calls this to rotate back.
    pub fn request_position(&mut self) {
        self.request = ReadRequest::Position;
    }

    /// Drop any partially received reply
    pub fn reset_receiver(&mut self) {
        self.assembler.reset();
    }

    /// Build the frame for `action`
    ///
    /// Returns `Ok(None)` when the cover already sits at the requested
    /// position. `Stop` is always sent.
    pub fn control(&self, action: CoverAction) -> Result<Option<Frame>, CoverError> {
        let command = match action {
            CoverAction::Stop => ControlCommand::Stop,
            CoverAction::MoveTo(position) => {
                if !(COVER_CLOSED..=COVER_OPEN).contains(&position) {
                    return Err(CoverError::PositionOutOfRange);
                }
                if position == self.state.position {
                    return Ok(None);
                }
                if position == COVER_OPEN {
                    ControlCommand::Open
                } else if position == COVER_CLOSED {
                    ControlCommand::Close
                } else {
                    ControlCommand::SetPosition(Some(position_to_percent(position)))
                }
            }
        };

        #[cfg(feature = "defmt")]
        defmt::debug!("Sending {}", command);
        Ok(Some(command.to_frame(self.address)?))
    }

    /// Build the next poll frame
    pub fn poll(&self) -> Result<Frame, CoverError> {
        Ok(self.request.to_frame(self.address)?)
    }

    /// Feed one received byte
    pub fn feed(&mut self, byte: u8) -> Result<Outcome, CoverError> {
        match self.assembler.feed(byte) {
            Some(frame) => self.handle_frame(&frame),
            None => Ok(Outcome::Pending),
        }
    }

    /// Apply a complete reply
    pub fn handle_frame(&mut self, frame: &Frame) -> Result<Outcome, CoverError> {
        let message = Message::decode(frame, self.request).map_err(|e| {
            #[cfg(feature = "defmt")]
            defmt::error!("Invalid reply from motor: {}", e);
            CoverError::from(e)
        })?;

        let publish = match message {
            Message::Response(echo) => {
                self.apply_response(echo);
                Some(self.state)
            }
            Message::Status(StatusReport::Position(reading)) => {
                let changed = self.apply_position(reading);
                self.request = ReadRequest::Status;
                changed.then_some(self.state)
            }
            Message::Status(StatusReport::Motion(status)) => {
                // Run state is tracked but not pushed on its own
                self.state.operation = operation_for(status);
                None
            }
        };

        #[cfg(feature = "defmt")]
        defmt::debug!("Settled: {}", self.state);
        Ok(Outcome::Settled { publish })
    }

    fn apply_response(&mut self, echo: ControlCommand) {
        self.state.operation = match echo {
            ControlCommand::Stop => CoverOperation::Idle,
            ControlCommand::Open => CoverOperation::Opening,
            ControlCommand::Close => CoverOperation::Closing,
            ControlCommand::SetPosition(target) => {
                if target.unwrap_or(NO_TARGET) > self.state.percent() {
                    CoverOperation::Opening
                } else {
                    CoverOperation::Closing
                }
            }
        };
    }

    /// Returns true if the tracked position changed
    fn apply_position(&mut self, reading: PositionReading) -> bool {
        let position = match (reading, self.unknown_position) {
            (PositionReading::Percent(percent), _) => {
                self.position_known = true;
                percent_to_position(percent)
            }
            (PositionReading::Unknown, UnknownPositionPolicy::Keep) if self.position_known => {
                self.state.position
            }
            (PositionReading::Unknown, _) => POSITION_MIDPOINT,
        };

        if position == self.state.position {
            return false;
        }
        self.state.position = position;
        true
    }

    /// Log the configured address
    pub fn dump_config(&self) {
        #[cfg(feature = "defmt")]
        defmt::info!("Dooya cover: address {=u16:#X}", self.address.as_u16());
    }
}

fn operation_for(status: MotorStatus) -> CoverOperation {
    match status {
        MotorStatus::Stopped => CoverOperation::Idle,
        MotorStatus::Opening => CoverOperation::Opening,
        MotorStatus::Closing => CoverOperation::Closing,
    }
}
