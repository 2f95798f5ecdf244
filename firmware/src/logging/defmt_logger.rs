use alloc::string::ToString;

use defmt::{debug, error, info, trace, warn};
use defmt_rtt as _;
use log::{Level, Record};

pub(super) fn log(record: &Record) {
    let args = record.args();
    let record_str = match args.as_str() {
        Some(s) => s.to_string(),
        None => args.to_string(),
    };
    match record.level() {
        Level::Trace => trace!("{=str}", record_str.as_str()),
        Level::Debug => debug!("{=str}", record_str.as_str()),
        Level::Info => info!("{=str}", record_str.as_str()),
        Level::Warn => warn!("{=str}", record_str.as_str()),
        Level::Error => error!("{=str}", record_str.as_str()),
    }
}
