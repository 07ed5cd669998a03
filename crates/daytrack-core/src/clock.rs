//! Wall-clock seam: which day document is "today", and id minting time.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{Local, NaiveDate};

/// Source of the current date and time.
pub trait Clock: Send + Sync {
    /// Local calendar date selecting the day document.
    fn today(&self) -> NaiveDate;

    /// Milliseconds since the Unix epoch, used to mint task ids.
    fn now_millis(&self) -> i64;
}

/// The system clock in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now_millis(&self) -> i64 {
        Local::now().timestamp_millis()
    }
}

/// A clock pinned to one date whose millisecond counter only moves when
/// told to.
#[derive(Debug)]
pub struct FixedClock {
    date: NaiveDate,
    millis: AtomicI64,
}

impl FixedClock {
    pub fn new(date: NaiveDate, millis: i64) -> Self {
        Self {
            date,
            millis: AtomicI64::new(millis),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date
    }

    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}
