use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;

/// Granularity of the refill window.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Length of `count` units.
    pub fn duration(self, count: u32) -> Duration {
        let count = u64::from(count);
        match self {
            TimeUnit::Nanoseconds => Duration::from_nanos(count),
            TimeUnit::Microseconds => Duration::from_micros(count),
            TimeUnit::Milliseconds => Duration::from_millis(count),
            TimeUnit::Seconds => Duration::from_secs(count),
            TimeUnit::Minutes => Duration::from_secs(count * 60),
            TimeUnit::Hours => Duration::from_secs(count * 60 * 60),
            TimeUnit::Days => Duration::from_secs(count * 24 * 60 * 60),
        }
    }
}

/// Monotonic time from the tokio clock, so waits are measured on the
/// same clock the refill timer runs on.
pub fn now_instant() -> Instant {
    Instant::now()
}

pub fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
