//! GPIO pin abstractions

/// Digital output pin
///
/// Used for the RS-485 driver-enable line: high while transmitting,
/// low while listening.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;
}

/// Placeholder for transceivers with automatic direction control
///
/// Some RS-485 modules switch direction on their own; they have no DE pin
/// to drive.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPin;

impl OutputPin for NoPin {
    fn set_high(&mut self) {}

    fn set_low(&mut self) {}

    fn is_set_high(&self) -> bool {
        false
    }
}
