//! Wall-clock sources for record headers and hour-based rotation.
//!
//! Everything that asks "what time is it" goes through a [`Clock`], so the
//! rotation policy can be driven deterministically in tests with a
//! [`ManualClock`] while production code uses [`SystemClock`].

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local, Offset};
use parking_lot::Mutex;

const SECS_PER_HOUR: i64 = 3600;

/// A source of local wall-clock time.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Local>;
}

/// The operating system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
///
/// # Examples
///
/// ```
/// # use cascade_logger::clock::{Clock, ManualClock, hour_bucket};
/// # use std::time::Duration;
/// let clock = ManualClock::new(chrono::Local::now());
/// let before = hour_bucket(&clock.now());
/// clock.advance(Duration::from_secs(3600));
/// assert_eq!(hour_bucket(&clock.now()), before + 1);
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        // Out-of-range steps leave the clock where it is.
        if let Some(next) = chrono::Duration::from_std(by)
            .ok()
            .and_then(|step| now.checked_add_signed(step))
        {
            *now = next;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock()
    }
}

/// Whole local hours since the Unix epoch. Buckets line up with
/// [`hour_stamp`] even in zones offset by a fraction of an hour.
#[inline]
pub fn hour_bucket(t: &DateTime<Local>) -> i64 {
    let offset = i64::from(t.offset().fix().local_minus_utc());
    (t.timestamp() + offset).div_euclid(SECS_PER_HOUR)
}

/// `YYYYMMDDHH` in local time, as used in log file names.
pub fn hour_stamp(t: &DateTime<Local>) -> String {
    t.format("%Y%m%d%H").to_string()
}
