//! Local control buttons
//!
//! Three active-low inputs mapped to open, close and stop.

use defmt::*;
use embassy_futures::select::{select3, Either3};
use embassy_rp::gpio::Input;
use embassy_time::Timer;

use dooya_core::CoverAction;

use crate::channels::COVER_COMMANDS;

/// Ignore further edges for this long after a press
const DEBOUNCE_MS: u64 = 50;

#[embassy_executor::task]
pub async fn buttons_task(
    mut open: Input<'static>,
    mut close: Input<'static>,
    mut stop: Input<'static>,
) {
    info!("Buttons task started");

    loop {
        let action = match select3(
            open.wait_for_falling_edge(),
            close.wait_for_falling_edge(),
            stop.wait_for_falling_edge(),
        )
        .await
        {
            Either3::First(()) => CoverAction::open(),
            Either3::Second(()) => CoverAction::close(),
            Either3::Third(()) => CoverAction::Stop,
        };

        debug!("Button: {:?}", action);
        if COVER_COMMANDS.try_send(action).is_err() {
            warn!("Command channel full, dropping {:?}", action);
        }

        Timer::after_millis(DEBOUNCE_MS).await;
    }
}
