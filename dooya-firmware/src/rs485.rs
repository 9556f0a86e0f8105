//! embassy-rp adapters for the dooya-hal traits

use embassy_rp::gpio::Output;
use embassy_rp::uart::{self, BufferedUartTx};
use embedded_io::Write;

use dooya_core::CoverDriver;
use dooya_hal::{OutputPin, Parity, StopBits, UartConfig, UartTx};

/// Cover driver as wired on this board
pub type Driver = CoverDriver<Rs485Tx, DePin>;

/// Buffered UART transmitter
///
/// `BufferedUartTx::flush` only waits for the software ring buffer to
/// drain. The interrupt handler moves a whole frame into the 32-byte
/// hardware FIFO almost at once, so that returns while the frame is still
/// on the wire. [`UartTx::flush`] here additionally waits for the UART's
/// BUSY flag to clear before the driver-enable pin may drop.
pub struct Rs485Tx {
    tx: BufferedUartTx,
}

impl Rs485Tx {
    pub fn new(tx: BufferedUartTx) -> Self {
        Self { tx }
    }
}

impl UartTx for Rs485Tx {
    type Error = uart::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.tx.write_all(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Write::flush(&mut self.tx)?;
        // FIFO and shift register
        while self.tx.busy() {}
        Ok(())
    }
}

/// Transceiver driver-enable pin
pub struct DePin {
    pin: Output<'static>,
}

impl DePin {
    pub fn new(pin: Output<'static>) -> Self {
        Self { pin }
    }
}

impl OutputPin for DePin {
    fn set_high(&mut self) {
        self.pin.set_high();
    }

    fn set_low(&mut self) {
        self.pin.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.pin.is_set_high()
    }
}

/// Convert bus settings to the embassy-rp UART config
pub fn uart_config(bus: &UartConfig) -> uart::Config {
    let mut cfg = uart::Config::default();
    cfg.baudrate = bus.baudrate;
    cfg.parity = match bus.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    cfg.stop_bits = match bus.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    cfg
}
