//! Source of "today" for date-sensitive transitions.

use std::sync::Mutex;

use chrono::{Days, NaiveDate, Utc};

pub trait Clock: Send + Sync {
  fn today(&self) -> NaiveDate;
}

/// The wall clock, in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn today(&self) -> NaiveDate { Utc::now().date_naive() }
}

/// A clock pinned to a date that tests can move forward.
#[derive(Debug)]
pub struct FixedClock(Mutex<NaiveDate>);

impl FixedClock {
  pub fn new(today: NaiveDate) -> Self { Self(Mutex::new(today)) }

  pub fn set(&self, today: NaiveDate) {
    *self.0.lock().unwrap_or_else(|e| e.into_inner()) = today;
  }

  pub fn advance(&self, days: u64) {
    let mut guard = self.0.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(next) = guard.checked_add_days(Days::new(days)) {
      *guard = next;
    }
  }
}

impl Clock for FixedClock {
  fn today(&self) -> NaiveDate { *self.0.lock().unwrap_or_else(|e| e.into_inner()) }
}
