//! Transition contracts for assignments, enrollments and career steps.
//!
//! Each `plan_*` function looks at the records that already exist for a key
//! and decides what the transition should do, or why it must fail. They do
//! not perform I/O. A store fetches the sibling records, calls the planner
//! and applies the outcome, all inside one transaction.
//!
//! | Life-cycle | States | Transitions |
//! |------------|--------|-------------|
//! | Instructor assignment | unassigned → active → inactive | [`plan_assign`], [`plan_unassign`] |
//! | Class enrollment | enquired / active / closed | [`plan_class_enrollment`], [`plan_unenroll`] |
//! | Generic enrollment | enquired / active / closed | [`plan_create`], [`plan_update`], close (unconditional) |

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  arbiter::{can_assign, can_create_pair, can_hold_status, can_open, find_blocking},
  catalog::CareerStep,
  enrollment::{
    ClassEnrollmentMode, Enrollment, EnrollmentPatch, EnrollmentStatus,
    InstructorAssignment, RecordKey,
  },
  error::Entity,
  period::Period,
};

// ─── Instructor assignment ───────────────────────────────────────────────────

/// Where a (instructor, class) pair stands on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentState {
  /// No assignment has ever been recorded for the pair.
  Unassigned,
  Active,
  /// Every recorded assignment has ended.
  Inactive,
}

pub fn assignment_state(
  existing: &[InstructorAssignment],
  key: RecordKey,
  on: NaiveDate,
) -> AssignmentState {
  let mut history = existing.iter().filter(|a| a.key() == key).peekable();
  if history.peek().is_none() {
    return AssignmentState::Unassigned;
  }
  if history.any(|a| a.is_active_on(on)) {
    AssignmentState::Active
  } else {
    AssignmentState::Inactive
  }
}

/// Decide the `assigned_on` date of a new assignment, or fail with a conflict
/// if the pair is already active.
pub fn plan_assign(
  existing: &[InstructorAssignment],
  key: RecordKey,
  assigned_on: Option<NaiveDate>,
  today: NaiveDate,
) -> Result<NaiveDate> {
  can_assign(existing, key, today)?;
  Ok(assigned_on.unwrap_or(today))
}

/// Find the assignment to end today.
///
/// Fails with [`Error::NoActiveRecord`] when nothing is active, so a second
/// unassign in a row is reported rather than silently accepted.
pub fn plan_unassign(
  existing: &[InstructorAssignment],
  key: RecordKey,
  today: NaiveDate,
) -> Result<&InstructorAssignment> {
  let active = find_blocking(existing, key, None, |a| a.is_active_on(today)).ok_or(
    Error::NoActiveRecord {
      entity:  Entity::InstructorAssignment,
      subject: key.subject,
      target:  key.target,
    },
  )?;

  // exit_date must not precede assigned_on.
  Period::new(active.assigned_on, Some(today)).map_err(|_| {
    Error::validation(format!(
      "assignment starts on {}, it cannot end on {today}",
      active.assigned_on
    ))
  })?;

  Ok(active)
}

impl InstructorAssignment {
  /// Set the terminal marker. Callers must have gone through [`plan_unassign`].
  pub fn end_on(&mut self, today: NaiveDate, at: DateTime<Utc>) {
    self.exit_date = Some(today);
    self.modified_at = at;
  }
}

// ─── Class enrollment ────────────────────────────────────────────────────────

/// What a class-level enroll call should write.
#[derive(Debug, PartialEq, Eq)]
pub enum EnrollPlan<'a> {
  Insert,
  /// Overwrite this record's status in place.
  Update(&'a Enrollment),
}

/// Decide how to enroll a student into a class.
///
/// In [`ClassEnrollmentMode::Upsert`] the call never conflicts. It updates,
/// in order of preference: the record already holding `status`, the most
/// recent open record, the most recent closed record (reopening it). Only
/// when the pair has no history is a new record inserted.
///
/// In [`ClassEnrollmentMode::Strict`] any open record is a conflict and a
/// fresh row is always inserted.
pub fn plan_class_enrollment(
  existing: &[Enrollment],
  key: RecordKey,
  status: EnrollmentStatus,
  mode: ClassEnrollmentMode,
) -> Result<EnrollPlan<'_>> {
  if !status.is_open() {
    return Err(Error::validation("status must be either active or enquired"));
  }

  match mode {
    ClassEnrollmentMode::Strict => {
      can_open(existing, key)?;
      Ok(EnrollPlan::Insert)
    }
    ClassEnrollmentMode::Upsert => {
      let history = || existing.iter().filter(move |e| e.key() == key);
      let target = newest(history().filter(|e| e.status == status))
        .or_else(|| newest(history().filter(|e| e.status.is_open())))
        .or_else(|| newest(history()));

      Ok(target.map_or(EnrollPlan::Insert, EnrollPlan::Update))
    }
  }
}

fn newest<'a>(records: impl Iterator<Item = &'a Enrollment>) -> Option<&'a Enrollment> {
  records.max_by_key(|e| e.created_at)
}

/// Find the active enrollment to close.
pub fn plan_unenroll(existing: &[Enrollment], key: RecordKey) -> Result<&Enrollment> {
  find_blocking(existing, key, None, |e| e.status == EnrollmentStatus::Active).ok_or(
    Error::NoActiveRecord {
      entity:  Entity::Enrollment,
      subject: key.subject,
      target:  key.target,
    },
  )
}

// ─── Generic enrollment ──────────────────────────────────────────────────────

/// A strict create succeeds only if the pair has no record in any status.
pub fn plan_create(existing: &[Enrollment], key: RecordKey) -> Result<()> {
  can_create_pair(existing, key)
}

/// Validate an edit: no *other* record may share the resulting
/// (student, class, status) triple.
pub fn plan_update(
  siblings: &[Enrollment],
  record: &Enrollment,
  patch: &EnrollmentPatch,
) -> Result<()> {
  let key = RecordKey::new(
    record.student_id,
    patch.course_class_id.unwrap_or(record.course_class_id),
  );
  let status = patch.status.unwrap_or(record.status);
  can_hold_status(siblings, key, status, Some(record.enrollment_id))
}

impl Enrollment {
  /// Force the record to `closed`. There is no precondition: closing an
  /// enquired or already-closed record is accepted.
  pub fn close(&mut self, comment: Option<String>, at: DateTime<Utc>) {
    self.status = EnrollmentStatus::Closed;
    if let Some(comment) = comment {
      self.comment = comment;
    }
    self.modified_at = at;
  }
}

// ─── Career steps ────────────────────────────────────────────────────────────

/// Validate a career step against the other steps of the same employee.
pub fn check_career_step(step: &CareerStep, siblings: &[CareerStep]) -> Result<()> {
  let period = Period::new(step.start_date, step.end_date)?;
  if step.salary < Decimal::ZERO {
    return Err(Error::validation("salary must not be negative"));
  }

  let clash = siblings.iter().find(|other| {
    other.employee_id == step.employee_id
      && other.career_step_id != step.career_step_id
      && other.period().overlaps(&period)
  });

  match clash {
    None => Ok(()),
    Some(other) => Err(Error::conflict(
      "this career step overlaps with an existing one",
      Some(other.career_step_id),
    )),
  }
}
