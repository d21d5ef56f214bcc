//! The at-most-one-active arbiter.
//!
//! Given the existing records for a key, decide whether a new active record
//! may be created, and if not, which record is in the way. The arbiter is
//! pure: callers must run it in the same transaction as the write it guards,
//! and the storage layer must back it with a uniqueness constraint over the
//! active predicate so that concurrent writers cannot both pass.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  Error, Result,
  enrollment::{Enrollment, EnrollmentStatus, InstructorAssignment, RecordKey},
};

/// A record that participates in at-most-one-active arbitration.
pub trait Tracked {
  fn record_id(&self) -> Uuid;
  fn record_key(&self) -> RecordKey;
}

impl Tracked for InstructorAssignment {
  fn record_id(&self) -> Uuid { self.assignment_id }

  fn record_key(&self) -> RecordKey { self.key() }
}

impl Tracked for Enrollment {
  fn record_id(&self) -> Uuid { self.enrollment_id }

  fn record_key(&self) -> RecordKey { self.key() }
}

/// First record with key `key` (other than `exclude`) satisfying `occupies`.
pub fn find_blocking<'a, R, F>(
  existing: &'a [R],
  key: RecordKey,
  exclude: Option<Uuid>,
  occupies: F,
) -> Option<&'a R>
where
  R: Tracked,
  F: Fn(&R) -> bool,
{
  existing.iter().find(|r| {
    r.record_key() == key && Some(r.record_id()) != exclude && occupies(r)
  })
}

/// May a new instructor assignment for `key` start, given today's date?
pub fn can_assign(
  existing: &[InstructorAssignment],
  key: RecordKey,
  today: NaiveDate,
) -> Result<()> {
  match find_blocking(existing, key, None, |a| a.is_active_on(today)) {
    None => Ok(()),
    Some(active) => Err(Error::conflict(
      "this instructor is already actively assigned to this class",
      Some(active.assignment_id),
    )),
  }
}

/// May a record (other than `exclude`) hold `status` for `key`?
///
/// Every status is exclusive per key here, which is stricter than the
/// storage constraints (those only cover open statuses).
pub fn can_hold_status(
  existing: &[Enrollment],
  key: RecordKey,
  status: EnrollmentStatus,
  exclude: Option<Uuid>,
) -> Result<()> {
  match find_blocking(existing, key, exclude, |e| e.status == status) {
    None => Ok(()),
    Some(dup) => Err(Error::conflict(
      format!("a {status} enrollment already exists for this student and class"),
      Some(dup.enrollment_id),
    )),
  }
}

/// May a brand-new record be created for `key`? Any existing record, in any
/// status, blocks it.
pub fn can_create_pair(existing: &[Enrollment], key: RecordKey) -> Result<()> {
  match find_blocking(existing, key, None, |_| true) {
    None => Ok(()),
    Some(dup) => Err(Error::conflict(
      "student already has an enrollment for this class",
      Some(dup.enrollment_id),
    )),
  }
}

/// May a new open record for `key` be inserted? Any open record blocks it.
pub fn can_open(existing: &[Enrollment], key: RecordKey) -> Result<()> {
  match find_blocking(existing, key, None, |e| e.status.is_open()) {
    None => Ok(()),
    Some(open) => Err(Error::conflict(
      format!("student already has a {} enrollment in this class", open.status),
      Some(open.enrollment_id),
    )),
  }
}
