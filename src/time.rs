use fugit::{MillisDurationU64, TimerInstantU64};

pub type Millis = TimerInstantU64<1000>;
pub type MillisDuration = MillisDurationU64;

pub fn dur_from_millis(millis: u64) -> MillisDuration {
    MillisDuration::millis(millis)
}

pub fn instant_from_millis(millis: u64) -> Millis {
    Millis::from_ticks(millis)
}

/// Time from `since` to `now`, zero if the clock appears to have gone backwards.
pub fn elapsed(now: Millis, since: Millis) -> MillisDuration {
    now.checked_duration_since(since)
        .unwrap_or_else(|| MillisDuration::from_ticks(0))
}
