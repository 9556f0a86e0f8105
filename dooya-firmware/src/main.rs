//! Dooya cover controller firmware
//!
//! Drives one Dooya tubular motor over RS-485 from an RP2040 board.
//! Local buttons issue open/close/stop; the motor is polled on a fixed
//! interval to keep position and run state current.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use dooya_core::{parse_config, CoverConfig, CoverDriver, PollScheduler};

use crate::rs485::{DePin, Rs485Tx};

/// Embedded configuration (compiled into firmware)
/// Edit cover.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../cover.toml");

/// UART ring buffer size; a reply is at most nine bytes
const UART_BUF_SIZE: usize = 64;

mod channels;
mod rs485;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; UART_BUF_SIZE]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; UART_BUF_SIZE]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Dooya cover firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();

    // Setup UART for the RS-485 transceiver
    // Pin assignments are board-specific (UART0: TX=GPIO0, RX=GPIO1)
    let uart_config = rs485::uart_config(&config.uart);
    let tx_buf = TX_BUF.init([0u8; UART_BUF_SIZE]);
    let rx_buf = RX_BUF.init([0u8; UART_BUF_SIZE]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    // DE and /RE are tied together on GPIO2; low = receive
    let de = Output::new(p.PIN_2, Level::Low);

    info!("RS-485 initialized at {} baud", config.uart.baudrate);

    let driver = CoverDriver::new(&config, Rs485Tx::new(tx), DePin::new(de));
    driver.cover().dump_config();
    let scheduler = PollScheduler::new(&config);

    // Local control buttons, active low
    let open_btn = Input::new(p.PIN_3, Pull::Up);
    let close_btn = Input::new(p.PIN_4, Pull::Up);
    let stop_btn = Input::new(p.PIN_5, Pull::Up);

    // Spawn tasks
    spawner
        .spawn(tasks::cover_task(driver, scheduler, rx, config.poll_interval_ms))
        .unwrap();
    spawner
        .spawn(tasks::buttons_task(open_btn, close_btn, stop_btn))
        .unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Parse the embedded cover.toml
///
/// build.rs validates the file, so failure here means the parser and the
/// build check disagree. Fall back to defaults rather than halt.
fn load_config() -> CoverConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {}", e);
            error!("Using default configuration (broadcast address)");
            CoverConfig::default()
        }
    }
}
