//! Cover state model
//!
//! Position follows the usual home-automation convention: 0.0 is fully
//! closed, 1.0 is fully open. The motor speaks whole percentages.

/// Fully open position
pub const COVER_OPEN: f32 = 1.0;

/// Fully closed position
pub const COVER_CLOSED: f32 = 0.0;

/// Position assumed while the motor reports "unknown"
pub const POSITION_MIDPOINT: f32 = 0.5;

/// Current motion of the cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CoverOperation {
    #[default]
    Idle,
    Opening,
    Closing,
}

/// Snapshot handed to whoever displays or automates the cover
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoverState {
    pub operation: CoverOperation,
    /// 0.0 (closed) to 1.0 (open)
    pub position: f32,
}

impl Default for CoverState {
    fn default() -> Self {
        Self {
            operation: CoverOperation::Idle,
            position: POSITION_MIDPOINT,
        }
    }
}

impl CoverState {
    /// Position as the motor's whole percentage
    pub fn percent(&self) -> u8 {
        position_to_percent(self.position)
    }

    pub fn is_open(&self) -> bool {
        self.position == COVER_OPEN
    }

    pub fn is_closed(&self) -> bool {
        self.position == COVER_CLOSED
    }
}

/// Features this cover supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoverTraits {
    pub supports_position: bool,
    pub supports_tilt: bool,
    pub supports_stop: bool,
}

impl Default for CoverTraits {
    fn default() -> Self {
        Self {
            supports_position: true,
            supports_tilt: false,
            supports_stop: true,
        }
    }
}

/// Request from the automation side
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CoverAction {
    Stop,
    /// Move to an absolute position; 1.0 and 0.0 map to the motor's own
    /// open and close commands
    MoveTo(f32),
}

impl CoverAction {
    pub fn open() -> Self {
        CoverAction::MoveTo(COVER_OPEN)
    }

    pub fn close() -> Self {
        CoverAction::MoveTo(COVER_CLOSED)
    }
}

/// Round a position in 0.0..=1.0 to a whole percentage
pub fn position_to_percent(position: f32) -> u8 {
    // Float-to-int `as` saturates, so out-of-range input cannot wrap
    (position * 100.0 + 0.5) as u8
}

/// Convert a reported percentage to a position, clamping above 100
pub fn percent_to_position(percent: u8) -> f32 {
    percent.min(100) as f32 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounding() {
        assert_eq!(position_to_percent(0.0), 0);
        assert_eq!(position_to_percent(0.424), 42);
        assert_eq!(position_to_percent(0.426), 43);
        assert_eq!(position_to_percent(1.0), 100);
    }

    #[test]
    fn test_percent_clamping() {
        assert_eq!(percent_to_position(50), 0.5);
        assert_eq!(percent_to_position(100), 1.0);
        assert_eq!(percent_to_position(150), 1.0);
    }

    #[test]
    fn test_default_state() {
        let state = CoverState::default();
        assert_eq!(state.operation, CoverOperation::Idle);
        assert_eq!(state.percent(), 50);
        assert!(!state.is_open());
        assert!(!state.is_closed());
    }

    #[test]
    fn test_action_helpers() {
        assert_eq!(CoverAction::open(), CoverAction::MoveTo(1.0));
        assert_eq!(CoverAction::close(), CoverAction::MoveTo(0.0));
    }
}
