//! `log` front end for the firmware.
//!
//! Records go to every enabled sink. Filtering is left to `log::max_level`
//! so the supervisor can change it at runtime.

#[cfg(feature = "defmt_logger")]
pub mod defmt_logger;

#[cfg(feature = "serial_logger")]
pub mod serial_logger;

pub use log::Level;
use log::{Metadata, Record, SetLoggerError};

struct LoggerType;

static LOGGER: LoggerType = LoggerType;

pub fn init(
    level: Level,
    #[cfg(feature = "serial_logger")] port: serial_logger::LoggerType,
) -> Result<(), SetLoggerError> {
    #[cfg(feature = "serial_logger")]
    serial_logger::init(port);

    log::set_logger(&LOGGER)?;
    log::set_max_level(level.to_level_filter());
    Ok(())
}

impl log::Log for LoggerType {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            #[cfg(feature = "defmt_logger")]
            defmt_logger::log(record);

            #[cfg(feature = "serial_logger")]
            serial_logger::log(record);
        }
    }

    fn flush(&self) {}
}
