//! Inter-task communication channels

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use dooya_core::CoverAction;

/// Channel capacity for cover actions
const COMMAND_CHANNEL_SIZE: usize = 4;

/// Cover actions from local buttons (or any other control source)
pub static COVER_COMMANDS: Channel<CriticalSectionRawMutex, CoverAction, COMMAND_CHANNEL_SIZE> =
    Channel::new();
