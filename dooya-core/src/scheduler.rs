//! Poll scheduling
//!
//! The motor never speaks unless asked, so the firmware polls it on a fixed
//! interval. [`PollScheduler`] decides what each tick does:
//!
//! - skip the tick while a command is still unanswered
//! - give up on a reply after `stale_after_polls` skipped ticks
//! - send a position poll every `position_refresh_polls` polls, and a
//!   status poll otherwise (the session moves to status on its own after a
//!   position reply; this is what moves it back)

use dooya_hal::{OutputPin, UartTx};
use dooya_protocol::ReadRequest;

use crate::config::CoverConfig;
use crate::link::{CoverDriver, DriverError};

/// What a poll tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollTick {
    /// Link busy; nothing sent
    Waiting,
    /// Poll sent for this register
    Sent(ReadRequest),
}

#[derive(Debug, Clone)]
pub struct PollScheduler {
    position_refresh_polls: u8,
    stale_after_polls: u8,
    since_refresh: u8,
    busy_ticks: u8,
}

impl PollScheduler {
    pub fn new(config: &CoverConfig) -> Self {
        Self {
            position_refresh_polls: config.position_refresh_polls,
            stale_after_polls: config.stale_after_polls,
            since_refresh: 0,
            busy_ticks: 0,
        }
    }

    /// Run one poll interval
    pub fn tick<T: UartTx, P: OutputPin>(
        &mut self,
        driver: &mut CoverDriver<T, P>,
    ) -> Result<PollTick, DriverError<T::Error>> {
        if !driver.is_ready() {
            self.busy_ticks = self.busy_ticks.saturating_add(1);
            if self.stale_after_polls == 0 || self.busy_ticks < self.stale_after_polls {
                return Ok(PollTick::Waiting);
            }
            driver.recover();
        }
        self.busy_ticks = 0;

        if self.position_refresh_polls != 0 {
            if self.since_refresh == 0 {
                driver.cover_mut().request_position();
            }
            self.since_refresh = (self.since_refresh + 1) % self.position_refresh_polls;
        }

        let request = driver.cover().pending_request();
        driver.poll()?;
        Ok(PollTick::Sent(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dooya_protocol::commands::{REG_POSITION, REG_STATUS};
    use dooya_protocol::{CommandClass, DeviceAddress, Frame};

    use crate::state::CoverState;

    const ADDR: DeviceAddress = DeviceAddress::new(0x01, 0x02);

    struct NullUart;

    impl UartTx for NullUart {
        type Error = ();

        fn write_blocking(&mut self, _data: &[u8]) -> Result<(), ()> {
            Ok(())
        }

        fn flush(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    type Driver = CoverDriver<NullUart, dooya_hal::gpio::NoPin>;

    fn setup(refresh: u8, stale: u8) -> (Driver, PollScheduler) {
        let mut config = CoverConfig::with_address(ADDR);
        config.position_refresh_polls = refresh;
        config.stale_after_polls = stale;
        (
            CoverDriver::new(&config, NullUart, dooya_hal::gpio::NoPin),
            PollScheduler::new(&config),
        )
    }

    fn reply(driver: &mut Driver, register: u8, value: u8) {
        let frame = Frame::encode(ADDR, CommandClass::Read, &[register, 0x01, value]).unwrap();
        let mut publisher = |_: &CoverState| {};
        for &b in frame.as_bytes() {
            driver.on_byte(b, &mut publisher).unwrap();
        }
    }

    #[test]
    fn test_alternates_with_refresh_two() {
        let (mut driver, mut scheduler) = setup(2, 0);

        assert_eq!(scheduler.tick(&mut driver), Ok(PollTick::Sent(ReadRequest::Position)));
        reply(&mut driver, REG_POSITION, 10);
        assert_eq!(scheduler.tick(&mut driver), Ok(PollTick::Sent(ReadRequest::Status)));
        reply(&mut driver, REG_STATUS, 0);
        assert_eq!(scheduler.tick(&mut driver), Ok(PollTick::Sent(ReadRequest::Position)));
    }

    #[test]
    fn test_no_refresh_stays_on_status() {
        let (mut driver, mut scheduler) = setup(0, 0);

        assert_eq!(scheduler.tick(&mut driver), Ok(PollTick::Sent(ReadRequest::Position)));
        reply(&mut driver, REG_POSITION, 10);
        for _ in 0..3 {
            assert_eq!(scheduler.tick(&mut driver), Ok(PollTick::Sent(ReadRequest::Status)));
            reply(&mut driver, REG_STATUS, 0);
        }
    }

    #[test]
    fn test_waits_while_busy() {
        let (mut driver, mut scheduler) = setup(2, 0);

        scheduler.tick(&mut driver).unwrap();
        for _ in 0..10 {
            assert_eq!(scheduler.tick(&mut driver), Ok(PollTick::Waiting));
        }
    }

    #[test]
    fn test_recovers_stale_link() {
        let (mut driver, mut scheduler) = setup(1, 3);

        scheduler.tick(&mut driver).unwrap();
        assert_eq!(scheduler.tick(&mut driver), Ok(PollTick::Waiting));
        assert_eq!(scheduler.tick(&mut driver), Ok(PollTick::Waiting));
        assert_eq!(scheduler.tick(&mut driver), Ok(PollTick::Sent(ReadRequest::Position)));
        assert!(!driver.is_ready());
    }
}
