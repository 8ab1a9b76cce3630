//! Rotation policy and log file naming
//!
//! Files are named `<prefix><stamp>.<NN>.log` for the primary stream and
//! `<prefix><stamp>.<NN>.error.log` for the error mirror, where `stamp` is
//! the local date (`%Y%m%d`, or `%Y%m%d%H` when hourly rotation is on) and
//! `NN` is a two-digit sequence starting at `01`.
//!
//! The two streams number their files independently. The mirror only grows
//! with errors, so it rotates by size at its own pace, and after a restart
//! each stream resumes its own last file. `20240314.03.log` may sit next to
//! `20240314.01.error.log`; the stamp, not `NN`, ties files to a period.

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, TimeZone, Timelike};
use crossbeam::channel::{self, Receiver};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// A time boundary at which every open file is rotated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Local midnight
    Daily,
    /// Top of an hour that is a multiple of the configured interval
    Hourly,
}

/// When to start a new log file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RotationPolicy {
    /// Rotate once a file would grow past this many bytes (0 = unbounded)
    pub max_size: u64,
    /// Rotate at local midnight
    pub daily: bool,
    /// Rotate every N hours, aligned to local hour multiples (0 = off)
    pub hourly_interval: u32,
}

impl RotationPolicy {
    /// Whether appending `incoming` bytes to a file of `current_size` bytes
    /// should go to a fresh file instead.
    ///
    /// An empty file never rotates, so a single oversized line still lands
    /// somewhere.
    #[must_use]
    pub const fn should_rotate(&self, current_size: u64, incoming: u64) -> bool {
        self.max_size > 0
            && current_size > 0
            && current_size.saturating_add(incoming) > self.max_size
    }

    /// Time remaining until the next `boundary` after `now`, or `None` if
    /// that boundary is disabled
    #[must_use]
    pub fn next_boundary(&self, boundary: Boundary, now: DateTime<Local>) -> Option<Duration> {
        let next = match boundary {
            Boundary::Daily if self.daily => {
                let midnight = now.date_naive().succ_opt()?.and_hms_opt(0, 0, 0)?;
                resolve_local(midnight)?
            }
            Boundary::Hourly if self.hourly_interval > 0 => {
                let interval = self.hourly_interval.clamp(1, 24);
                let top_of_hour = now.naive_local().date().and_hms_opt(now.hour(), 0, 0)?;
                let mut candidate = top_of_hour + TimeDelta::hours(1);
                while candidate.hour() % interval != 0 {
                    candidate += TimeDelta::hours(1);
                }
                resolve_local(candidate)?
            }
            Boundary::Daily | Boundary::Hourly => return None,
        };

        Some((next - now).to_std().unwrap_or(Duration::ZERO))
    }

    /// A one-shot timer channel that fires at the next `boundary`, or never
    #[must_use]
    pub fn timer(&self, boundary: Boundary, now: DateTime<Local>) -> Receiver<Instant> {
        match self.next_boundary(boundary, now) {
            Some(delay) => channel::after(delay),
            None => channel::never(),
        }
    }

    /// Date stamp used in file names created at `now`
    #[must_use]
    pub fn stamp(&self, now: DateTime<Local>) -> String {
        let layout = if self.hourly_interval > 0 {
            "%Y%m%d%H"
        } else {
            "%Y%m%d"
        };
        now.format(layout).to_string()
    }
}

/// Map a local wall time to an instant, stepping over a DST gap if needed
fn resolve_local(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| Local.from_local_datetime(&(naive + TimeDelta::hours(1))).earliest())
}

/// Builds paths for one stream of log files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNamer {
    dir: PathBuf,
    prefix: String,
    suffix: &'static str,
}

impl FileNamer {
    /// Namer for the primary stream (`.log`)
    pub fn primary(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            suffix: "log",
        }
    }

    /// Namer for the error mirror (`.error.log`)
    pub fn error_mirror(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            suffix: "error.log",
        }
    }

    /// Directory the files live in
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of file number `index` for `stamp`
    #[must_use]
    pub fn path(&self, stamp: &str, index: u32) -> PathBuf {
        self.dir
            .join(format!("{}{stamp}.{index:02}.{}", self.prefix, self.suffix))
    }

    /// The lowest-numbered path for `stamp` that does not exist yet
    #[must_use]
    pub fn fresh(&self, stamp: &str) -> PathBuf {
        self.first_unused(stamp, 1)
    }

    /// Where to continue writing after a restart.
    ///
    /// Follows the consecutive chain `01, 02, ...` for `stamp` and reopens its
    /// last file if that file is still below `max_size` (0 = unbounded).
    /// Otherwise returns the next unused path.
    #[must_use]
    pub fn resume(&self, stamp: &str, max_size: u64) -> PathBuf {
        let mut index = 1;
        while self.path(stamp, index + 1).exists() {
            index += 1;
        }

        let last = self.path(stamp, index);
        match std::fs::metadata(&last) {
            Ok(meta) if max_size > 0 && meta.len() >= max_size => {
                self.first_unused(stamp, index + 1)
            }
            _ => last,
        }
    }

    fn first_unused(&self, stamp: &str, start: u32) -> PathBuf {
        let mut index = start;
        loop {
            let candidate = self.path(stamp, index);
            if !candidate.exists() {
                return candidate;
            }
            index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn size_threshold() {
        let policy = RotationPolicy {
            max_size: 100,
            ..RotationPolicy::default()
        };

        assert!(!policy.should_rotate(0, 500), "empty files take any line");
        assert!(!policy.should_rotate(60, 40));
        assert!(policy.should_rotate(60, 41));
        assert!(policy.should_rotate(100, 1));

        let unbounded = RotationPolicy::default();
        assert!(!unbounded.should_rotate(u64::MAX - 1, 10));
    }

    #[test]
    fn daily_boundary_is_next_midnight() {
        let policy = RotationPolicy {
            daily: true,
            ..RotationPolicy::default()
        };

        let delay = policy
            .next_boundary(Boundary::Daily, at(2024, 3, 14, 23, 59, 30))
            .unwrap();
        assert_eq!(delay, Duration::from_secs(30));

        let delay = policy
            .next_boundary(Boundary::Daily, at(2024, 3, 14, 0, 0, 0))
            .unwrap();
        assert_eq!(delay, Duration::from_secs(24 * 3600));
    }

    #[test]
    fn hourly_boundary_aligns_to_interval() {
        let every_six = RotationPolicy {
            hourly_interval: 6,
            ..RotationPolicy::default()
        };

        // 13:20 -> 18:00
        let delay = every_six
            .next_boundary(Boundary::Hourly, at(2024, 3, 14, 13, 20, 0))
            .unwrap();
        assert_eq!(delay, Duration::from_secs(4 * 3600 + 40 * 60));

        // 20:00 -> 00:00 next day
        let delay = every_six
            .next_boundary(Boundary::Hourly, at(2024, 3, 14, 20, 0, 0))
            .unwrap();
        assert_eq!(delay, Duration::from_secs(4 * 3600));

        let every_hour = RotationPolicy {
            hourly_interval: 1,
            ..RotationPolicy::default()
        };
        let delay = every_hour
            .next_boundary(Boundary::Hourly, at(2024, 3, 14, 9, 59, 59))
            .unwrap();
        assert_eq!(delay, Duration::from_secs(1));
    }

    #[test]
    fn disabled_boundaries_never_fire() {
        let policy = RotationPolicy::default();
        let now = at(2024, 3, 14, 12, 0, 0);

        assert_eq!(policy.next_boundary(Boundary::Daily, now), None);
        assert_eq!(policy.next_boundary(Boundary::Hourly, now), None);
        assert!(
            policy
                .timer(Boundary::Daily, now)
                .recv_timeout(Duration::from_millis(20))
                .is_err()
        );
    }

    #[test]
    fn stamp_includes_hour_only_when_hourly() {
        let now = at(2024, 3, 14, 7, 0, 0);
        let daily = RotationPolicy {
            daily: true,
            ..RotationPolicy::default()
        };
        let hourly = RotationPolicy {
            hourly_interval: 2,
            ..RotationPolicy::default()
        };

        assert_eq!(daily.stamp(now), "20240314");
        assert_eq!(hourly.stamp(now), "2024031407");
    }

    #[test]
    fn file_names() {
        let primary = FileNamer::primary("/var/log/app", "api-");
        let errors = FileNamer::error_mirror("/var/log/app", "api-");

        assert_eq!(
            primary.path("20240314", 1),
            PathBuf::from("/var/log/app/api-20240314.01.log")
        );
        assert_eq!(
            errors.path("20240314", 12),
            PathBuf::from("/var/log/app/api-20240314.12.error.log")
        );
    }

    #[test]
    fn fresh_skips_existing_files() {
        let dir = TempDir::new().unwrap();
        let namer = FileNamer::primary(dir.path(), "");
        assert_eq!(namer.fresh("20240314"), namer.path("20240314", 1));

        fs::write(namer.path("20240314", 1), "a").unwrap();
        fs::write(namer.path("20240314", 2), "b").unwrap();
        assert_eq!(namer.fresh("20240314"), namer.path("20240314", 3));
        assert_eq!(namer.fresh("20240315"), namer.path("20240315", 1));
    }

    #[test]
    fn resume_reopens_last_file_below_threshold() {
        let dir = TempDir::new().unwrap();
        let namer = FileNamer::primary(dir.path(), "");

        fs::write(namer.path("20240314", 1), vec![b'x'; 100]).unwrap();
        fs::write(namer.path("20240314", 2), vec![b'x'; 10]).unwrap();

        assert_eq!(namer.resume("20240314", 50), namer.path("20240314", 2));
        assert_eq!(namer.resume("20240314", 0), namer.path("20240314", 2));
    }

    #[test]
    fn resume_moves_on_from_full_file() {
        let dir = TempDir::new().unwrap();
        let namer = FileNamer::primary(dir.path(), "");

        fs::write(namer.path("20240314", 1), vec![b'x'; 100]).unwrap();
        assert_eq!(namer.resume("20240314", 100), namer.path("20240314", 2));
    }

    #[test]
    fn resume_with_no_files_starts_at_one() {
        let dir = TempDir::new().unwrap();
        let namer = FileNamer::error_mirror(dir.path(), "svc");

        assert_eq!(namer.resume("20240314", 100), namer.path("20240314", 1));
    }
}
