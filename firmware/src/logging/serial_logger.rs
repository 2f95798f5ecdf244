//! Plain text log lines on the USART1 debug port.

use core::cell::RefCell;
use core::fmt::Write;

use cortex_m::interrupt::{self, Mutex};
use log::{Level, Record};
use stm32f4xx_hal::{pac::USART1, serial::Tx};

pub type LoggerType = Tx<USART1>;

static SERIAL_LOGGER: Mutex<RefCell<Option<LoggerType>>> = Mutex::new(RefCell::new(None));

pub(super) fn init(port: LoggerType) {
    interrupt::free(|cs| SERIAL_LOGGER.borrow(cs).replace(Some(port)));
}

pub(super) fn log(record: &Record) {
    let level = match record.level() {
        Level::Trace => "trace",
        Level::Debug => "debug",
        Level::Info => "info",
        Level::Warn => "warn",
        Level::Error => "error",
    };

    interrupt::free(|cs| {
        if let Some(tx) = SERIAL_LOGGER.borrow(cs).borrow_mut().as_mut() {
            // Nowhere left to report a failed log write.
            let _ = write!(tx, "{}: {}\r\n", level, record.args());
        }
    });
}
