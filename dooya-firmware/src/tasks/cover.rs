//! Cover bus task
//!
//! Owns the RS-485 link. Received bytes, poll ticks and queued actions are
//! handled in one loop so the half-duplex gate never sees two writers.

use defmt::*;
use embassy_futures::select::{select3, Either3};
use embassy_rp::uart::BufferedUartRx;
use embassy_time::{Duration, Ticker};
use embedded_io_async::Read;

use dooya_core::{CoverAction, CoverState, DriverError, LinkError, PollScheduler, PollTick};

use crate::channels::COVER_COMMANDS;
use crate::rs485::Driver;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 32;

/// Cover task - polls the motor and carries out queued actions
#[embassy_executor::task]
pub async fn cover_task(
    mut driver: Driver,
    mut scheduler: PollScheduler,
    mut rx: BufferedUartRx,
    poll_interval_ms: u32,
) {
    info!("Cover task started");

    let mut ticker = Ticker::every(Duration::from_millis(poll_interval_ms as u64));
    let mut buf = [0u8; RX_BUF_SIZE];
    let mut publisher = |state: &CoverState| {
        info!("Cover {:?} at {}%", state.operation, state.percent());
    };

    loop {
        let event = select3(rx.read(&mut buf), ticker.next(), COVER_COMMANDS.receive()).await;

        match event {
            Either3::First(Ok(n)) => {
                trace!("RX: {} bytes", n);
                for &byte in &buf[..n] {
                    if let Err(e) = driver.on_byte(byte, &mut publisher) {
                        warn!("Dropped reply: {:?}", e);
                    }
                }
            }
            Either3::First(Err(e)) => {
                warn!("UART read error: {:?}", e);
            }
            Either3::Second(()) => match scheduler.tick(&mut driver) {
                Ok(PollTick::Sent(request)) => trace!("Poll sent: {:?}", request),
                Ok(PollTick::Waiting) => trace!("Poll skipped, reply outstanding"),
                Err(e) => warn!("Poll failed: {:?}", e),
            },
            Either3::Third(action) => handle_action(&mut driver, action),
        }
    }
}

/// Carry out one queued action
///
/// Actions arriving while a reply is outstanding are dropped; the user can
/// press again once the motor has answered.
fn handle_action(driver: &mut Driver, action: CoverAction) {
    match driver.control(action) {
        Ok(true) => debug!("Action sent: {:?}", action),
        Ok(false) => debug!("Already at target, nothing sent"),
        Err(DriverError::Link(LinkError::Busy)) => {
            warn!("Link busy, dropping {:?}", action);
        }
        Err(e) => warn!("Action {:?} failed: {:?}", action, e),
    }
}
