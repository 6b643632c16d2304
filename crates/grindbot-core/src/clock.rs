//! Time source for the session loop.
//!
//! Every sleep and every "now" goes through [`Clock`] so tests can drive the
//! loop with [`ManualClock`] instead of blocking.

use chrono::{DateTime, Duration as ChronoDuration, Local, Utc};
use std::cell::Cell;
use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Instant;
    fn wall(&self) -> DateTime<Utc>;
    fn sleep(&self, duration: Duration);
}

/// Real time, real sleeps.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Clock that advances only when slept on. Records total slept time.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    wall_origin: DateTime<Utc>,
    offset: Cell<Duration>,
    sleeps: Cell<usize>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    pub fn starting_at(wall: DateTime<Utc>) -> Self {
        Self {
            origin: Instant::now(),
            wall_origin: wall,
            offset: Cell::new(Duration::ZERO),
            sleeps: Cell::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }

    pub fn sleep_count(&self) -> usize {
        self.sleeps.get()
    }

    /// Local date of the current wall time.
    pub fn local_date(&self) -> chrono::NaiveDate {
        self.wall().with_timezone(&Local).date_naive()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }

    fn wall(&self) -> DateTime<Utc> {
        let offset =
            ChronoDuration::from_std(self.offset.get()).unwrap_or_else(|_| ChronoDuration::zero());
        self.wall_origin + offset
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.set(self.sleeps.get() + 1);
        self.advance(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn wall(&self) -> DateTime<Utc> {
        (**self).wall()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}
