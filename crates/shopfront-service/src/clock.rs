//! # Clock
//!
//! Source of "today" for promotion windows and coupon expiry.
//!
//! Only this layer reads the wall clock. Services ask their [`Clock`] for
//! the date once per call and pass it down as `as_of`.

use chrono::{Local, NaiveDate};
use std::fmt::Debug;
use std::sync::Mutex;

/// Supplies the business date.
pub trait Clock: Send + Sync + Debug {
    fn today(&self) -> NaiveDate;
}

/// The store's local calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to a date, for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    date: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        FixedClock {
            date: Mutex::new(date),
        }
    }

    /// Moves the clock to `date`.
    pub fn set(&self, date: NaiveDate) {
        *self.date.lock().unwrap_or_else(|e| e.into_inner()) = date;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.date.lock().unwrap_or_else(|e| e.into_inner())
    }
}
