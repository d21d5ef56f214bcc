//! Temporal range model.
//!
//! A period is a calendar-date range with an optional end. An absent end
//! means the record is open-ended. Whether a record counts as active on a
//! given day is decided by [`end_is_active`] and nothing else, so every read
//! and write path agrees on the boundary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Whether an end date equal to the reference day still counts as active.
///
/// `false`: a record ending on `D` is inactive on `D`. Unassigning sets the
/// end to today, so the slot is free again the same day.
pub const ACTIVE_BOUNDARY_INCLUSIVE: bool = false;

/// Is a record with end marker `end` active on `on`?
pub fn end_is_active(end: Option<NaiveDate>, on: NaiveDate) -> bool {
  match end {
    None => true,
    Some(end) if ACTIVE_BOUNDARY_INCLUSIVE => end >= on,
    Some(end) => end > on,
  }
}

/// A `[start, end]` date range; `end == None` is treated as +∞.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
  pub start: NaiveDate,
  pub end:   Option<NaiveDate>,
}

impl Period {
  /// Build a period, rejecting an end that precedes the start.
  pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Result<Self> {
    if let Some(end) = end
      && end < start
    {
      return Err(Error::validation(format!(
        "end date {end} is before start date {start}"
      )));
    }
    Ok(Self { start, end })
  }

  pub fn open(start: NaiveDate) -> Self { Self { start, end: None } }

  pub fn is_active_on(&self, on: NaiveDate) -> bool { end_is_active(self.end, on) }

  /// Closed-interval overlap with open ends treated as +∞.
  pub fn overlaps(&self, other: &Period) -> bool {
    let self_ends_first = matches!(self.end, Some(e) if e < other.start);
    let other_ends_first = matches!(other.end, Some(e) if e < self.start);
    !(self_ends_first || other_ends_first)
  }
}
