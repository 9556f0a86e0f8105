//! Configuration type definitions

use dooya_hal::UartConfig;
use dooya_protocol::DeviceAddress;

/// How a "position unknown" report is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UnknownPositionPolicy {
    /// Report the midpoint (0.5) every time the motor says "unknown"
    #[default]
    Midpoint,
    /// Report the midpoint only until a real reading has arrived, then keep
    /// the last real reading
    Keep,
}

/// Cover configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoverConfig {
    /// Motor address (set on the motor with its programming button)
    pub address: DeviceAddress,
    /// Serial settings for the RS-485 bus
    pub uart: UartConfig,
    /// Interval between poll frames
    pub poll_interval_ms: u32,
    /// Force a position poll every N polls (0 = never force)
    pub position_refresh_polls: u8,
    /// Consider the link stuck after N polls without a reply (0 = never)
    pub stale_after_polls: u8,
    /// Handling of "position unknown" reports
    pub unknown_position: UnknownPositionPolicy,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            address: DeviceAddress::BROADCAST,
            uart: UartConfig::default(),
            poll_interval_ms: 2000,
            position_refresh_polls: 2,
            stale_after_polls: 3,
            unknown_position: UnknownPositionPolicy::Midpoint,
        }
    }
}

impl CoverConfig {
    /// Default configuration for a motor at `address`
    pub fn with_address(address: DeviceAddress) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }
}
