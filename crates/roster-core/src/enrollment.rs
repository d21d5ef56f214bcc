//! Assignment and enrollment records.
//!
//! Records are never deleted. A transition either adds a new record or sets
//! a terminal marker on an existing one (`exit_date` for instructor
//! assignments, `status = closed` for enrollments).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, period::Period};

/// The (subject, target) pair that the at-most-one-active rule is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
  pub subject: Uuid,
  pub target:  Uuid,
}

impl RecordKey {
  pub fn new(subject: Uuid, target: Uuid) -> Self { Self { subject, target } }
}

// ─── Instructor assignments ──────────────────────────────────────────────────

/// An employee teaching a course class from `assigned_on` until `exit_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructorAssignment {
  pub assignment_id:   Uuid,
  pub instructor_id:   Uuid,
  pub course_class_id: Uuid,
  pub assigned_on:     NaiveDate,
  /// `None` while the assignment is open.
  pub exit_date:       Option<NaiveDate>,
  pub created_at:      DateTime<Utc>,
  pub modified_at:     DateTime<Utc>,
}

impl InstructorAssignment {
  pub fn key(&self) -> RecordKey { RecordKey::new(self.instructor_id, self.course_class_id) }

  pub fn period(&self) -> Period { Period { start: self.assigned_on, end: self.exit_date } }

  pub fn is_active_on(&self, on: NaiveDate) -> bool { self.period().is_active_on(on) }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignInstructor {
  pub instructor_id: Uuid,
  /// Defaults to today.
  pub assigned_on:   Option<NaiveDate>,
}

// ─── Enrollments ─────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EnrollmentStatus {
  #[default]
  Enquired,
  Active,
  Closed,
}

impl EnrollmentStatus {
  /// Open statuses are mutually exclusive per (student, class) and status.
  pub fn is_open(self) -> bool { !matches!(self, Self::Closed) }

  /// Parse a caller-supplied status, case-insensitively.
  pub fn parse(s: &str) -> Result<Self> {
    s.trim()
      .parse()
      .map_err(|_| Error::validation(format!("invalid enrollment status: {s:?}")))
  }
}

/// A student's status in a course class. `course_id` and `term_id` are
/// denormalised from the class at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
  pub enrollment_id:   Uuid,
  pub student_id:      Uuid,
  pub course_class_id: Uuid,
  pub course_id:       Uuid,
  pub term_id:         Uuid,
  pub status:          EnrollmentStatus,
  pub comment:         String,
  pub created_at:      DateTime<Utc>,
  pub modified_at:     DateTime<Utc>,
}

impl Enrollment {
  pub fn key(&self) -> RecordKey { RecordKey::new(self.student_id, self.course_class_id) }
}

/// Body of a class-level enroll call.
#[derive(Debug, Clone)]
pub struct ClassEnrollment {
  pub course_class_id: Uuid,
  pub status:          EnrollmentStatus,
  /// Replaces the stored comment when present.
  pub comment:         Option<String>,
}

impl ClassEnrollment {
  /// Only `active` and `enquired` can be requested through enroll.
  pub fn validate(&self) -> Result<()> {
    if !self.status.is_open() {
      return Err(Error::validation("status must be either active or enquired"));
    }
    Ok(())
  }
}

/// Input to the strict, course-level `create_enrollment`.
#[derive(Debug, Clone)]
pub struct NewEnrollment {
  pub student_id:      Uuid,
  pub course_class_id: Uuid,
  pub status:          EnrollmentStatus,
  pub comment:         String,
}

#[derive(Debug, Clone, Default)]
pub struct EnrollmentPatch {
  pub course_class_id: Option<Uuid>,
  pub status:          Option<EnrollmentStatus>,
  pub comment:         Option<String>,
}

/// How a class-level enroll treats an existing record for the same pair.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ClassEnrollmentMode {
  /// Update the existing record in place (create if none).
  #[default]
  Upsert,
  /// Reject while an open record exists; otherwise insert a new row.
  Strict,
}
