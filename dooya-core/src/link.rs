//! Half-duplex link handshake
//!
//! Only one side of an RS-485 pair may drive the bus at a time, and the
//! motor answers every command. [`HalfDuplexLink`] enforces one command in
//! flight: a transmit clears the ready flag and only a settled reply (or
//! the scheduler giving up on one) sets it again. Nothing is queued. A
//! transmit while busy fails with [`LinkError::Busy`] and the caller
//! decides whether to retry later or drop it.

use dooya_hal::{OutputPin, UartTx};
use dooya_protocol::Frame;

use crate::config::CoverConfig;
use crate::cover::{Cover, CoverError, Outcome};
use crate::state::{CoverAction, CoverState};

/// Link errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError<E> {
    /// A command is still waiting for its reply
    Busy,
    /// The UART reported an error
    Transport(E),
}

/// Errors from [`CoverDriver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError<E> {
    Cover(CoverError),
    Link(LinkError<E>),
}

impl<E> From<CoverError> for DriverError<E> {
    fn from(e: CoverError) -> Self {
        DriverError::Cover(e)
    }
}

impl<E> From<LinkError<E>> for DriverError<E> {
    fn from(e: LinkError<E>) -> Self {
        DriverError::Link(e)
    }
}

/// Receiver of cover state updates
pub trait StatePublisher {
    fn publish(&mut self, state: &CoverState);
}

impl<F: FnMut(&CoverState)> StatePublisher for F {
    fn publish(&mut self, state: &CoverState) {
        self(state)
    }
}

/// UART plus driver-enable pin with a one-command-in-flight gate
pub struct HalfDuplexLink<T, P> {
    tx: T,
    de: P,
    ready: bool,
}

impl<T: UartTx, P: OutputPin> HalfDuplexLink<T, P> {
    /// Create a link in receive mode, ready to transmit
    pub fn new(tx: T, mut de: P) -> Self {
        de.set_low();
        Self { tx, de, ready: true }
    }

    /// Whether a new command may be sent
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Send one frame
    ///
    /// The driver-enable pin is released again even if the write fails. A
    /// failed write leaves the link ready since nothing reached the motor.
    pub fn transmit(&mut self, frame: &Frame) -> Result<(), LinkError<T::Error>> {
        if !self.ready {
            return Err(LinkError::Busy);
        }

        self.de.set_high();
        let result = self
            .tx
            .write_blocking(frame.as_bytes())
            .and_then(|_| self.tx.flush());
        self.de.set_low();

        result.map_err(LinkError::Transport)?;
        self.ready = false;
        Ok(())
    }

    /// Mark the outstanding command as answered
    pub fn settle(&mut self) {
        self.ready = true;
    }

    /// Give the UART and pin back
    pub fn release(self) -> (T, P) {
        (self.tx, self.de)
    }
}

/// A [`Cover`] session wired to a [`HalfDuplexLink`]
pub struct CoverDriver<T, P> {
    cover: Cover,
    link: HalfDuplexLink<T, P>,
}

impl<T: UartTx, P: OutputPin> CoverDriver<T, P> {
    pub fn new(config: &CoverConfig, tx: T, de: P) -> Self {
        Self {
            cover: Cover::new(config),
            link: HalfDuplexLink::new(tx, de),
        }
    }

    pub fn cover(&self) -> &Cover {
        &self.cover
    }

    pub fn cover_mut(&mut self) -> &mut Cover {
        &mut self.cover
    }

    /// Whether a new command may be sent
    pub fn is_ready(&self) -> bool {
        self.link.is_ready()
    }

    /// Carry out a cover action
    ///
    /// Returns `Ok(false)` when the action needed no frame.
    pub fn control(&mut self, action: CoverAction) -> Result<bool, DriverError<T::Error>> {
        match self.cover.control(action)? {
            Some(frame) => {
                self.link.transmit(&frame)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Send the next poll
    pub fn poll(&mut self) -> Result<(), DriverError<T::Error>> {
        let frame = self.cover.poll()?;
        self.link.transmit(&frame)?;
        Ok(())
    }

    /// Handle one received byte
    ///
    /// A settled reply frees the link; state changes go to `publisher`.
    pub fn on_byte<S: StatePublisher>(
        &mut self,
        byte: u8,
        publisher: &mut S,
    ) -> Result<(), CoverError> {
        if let Outcome::Settled { publish } = self.cover.feed(byte)? {
            self.link.settle();
            if let Some(state) = publish {
                publisher.publish(&state);
            }
        }
        Ok(())
    }

    /// Abandon an unanswered command
    ///
    /// For the scheduler to call when a reply is overdue: drops any partial
    /// reply and frees the link.
    pub fn recover(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::warn!("No reply from motor, releasing link");
        self.cover.reset_receiver();
        self.link.settle();
    }
}
