//! Wall-clock sources used for timestamps and rotation boundaries

use chrono::{DateTime, Local, TimeDelta};
use std::time::Instant;

/// Source of local wall-clock time
pub trait Clock: Send + Sync + 'static {
    /// Current local time
    fn now(&self) -> DateTime<Local>;
}

/// The system clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that starts at a chosen instant and then advances in real time.
///
/// Useful for exercising midnight and hour boundaries without waiting for
/// them: start a few hundred milliseconds before the boundary and the
/// writer's timers fire almost immediately.
#[derive(Debug, Clone)]
pub struct OffsetClock {
    start: DateTime<Local>,
    origin: Instant,
}

impl OffsetClock {
    /// Create a clock whose current time is `start`
    #[must_use]
    pub fn starting_at(start: DateTime<Local>) -> Self {
        Self {
            start,
            origin: Instant::now(),
        }
    }
}

impl Clock for OffsetClock {
    fn now(&self) -> DateTime<Local> {
        let elapsed = TimeDelta::from_std(self.origin.elapsed()).unwrap_or(TimeDelta::zero());
        self.start + elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn offset_clock_advances_from_start() {
        let start = Local.with_ymd_and_hms(2024, 3, 14, 23, 59, 0).unwrap();
        let clock = OffsetClock::starting_at(start);

        let first = clock.now();
        assert!(first >= start);

        thread::sleep(Duration::from_millis(20));
        let second = clock.now();
        assert!(second >= first + TimeDelta::milliseconds(20));
        assert!(second < start + TimeDelta::seconds(5));
    }
}
