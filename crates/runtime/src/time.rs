use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of wall clock time, swappable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;

    /// Milliseconds since the unix epoch, saturating to zero for times before it.
    fn now_millis(&self) -> u64 {
        self.now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Whole seconds elapsed between two epoch-millisecond timestamps, rounded to the nearest
/// second. Timestamps in the future count as zero.
pub fn rounded_age_seconds(since_millis: u64, now_millis: u64) -> u64 {
    let elapsed = Duration::from_millis(now_millis.saturating_sub(since_millis));
    (elapsed.as_millis() as u64 + 500) / 1000
}
