//! The enrollment and assignment engine on SQLite.
//!
//! Every write follows the same shape inside one `BEGIN IMMEDIATE`
//! transaction: resolve the subject and target, load the sibling records for
//! the key, let `roster_core::lifecycle` decide, then apply. The partial
//! unique indexes in the schema back the decision; a violation that still
//! reaches them surfaces as a conflict.

use chrono::Utc;
use rusqlite::{Connection, params};
use uuid::Uuid;

use roster_core::{
  enrollment::{
    AssignInstructor, ClassEnrollment, Enrollment, EnrollmentPatch, InstructorAssignment,
    NewEnrollment, RecordKey,
  },
  error::Entity,
  lifecycle::{
    EnrollPlan, plan_assign, plan_class_enrollment, plan_create, plan_unassign, plan_unenroll,
    plan_update,
  },
  store::RosterStore,
};

use crate::{
  Result, SqliteStore,
  encode::{RawAssignment, RawEnrollment, encode_date, encode_dt, encode_status, encode_uuid},
  error::conflict_on_unique,
  store::{
    fetch_all, fetch_course_class, fetch_one, fetch_student, live_course_class, live_employee,
    live_student,
  },
};

// ─── Row access ──────────────────────────────────────────────────────────────

fn assignments_for_pair(conn: &Connection, key: RecordKey) -> Result<Vec<InstructorAssignment>> {
  fetch_all(
    conn,
    &format!(
      "SELECT {} FROM instructor_assignments
        WHERE instructor_id = ?1 AND course_class_id = ?2
        ORDER BY created_at DESC",
      RawAssignment::COLUMNS
    ),
    params![encode_uuid(key.subject), encode_uuid(key.target)],
    RawAssignment::from_row,
    RawAssignment::into_assignment,
  )
}

fn assignments_of_class(conn: &Connection, course_class_id: Uuid) -> Result<Vec<InstructorAssignment>> {
  fetch_all(
    conn,
    &format!(
      "SELECT {} FROM instructor_assignments
        WHERE course_class_id = ?1
        ORDER BY assigned_on DESC, created_at DESC",
      RawAssignment::COLUMNS
    ),
    params![encode_uuid(course_class_id)],
    RawAssignment::from_row,
    RawAssignment::into_assignment,
  )
}

fn enrollments_for_pair(conn: &Connection, key: RecordKey) -> Result<Vec<Enrollment>> {
  fetch_all(
    conn,
    &format!(
      "SELECT {} FROM enrollments
        WHERE student_id = ?1 AND course_class_id = ?2
        ORDER BY created_at DESC",
      RawEnrollment::COLUMNS
    ),
    params![encode_uuid(key.subject), encode_uuid(key.target)],
    RawEnrollment::from_row,
    RawEnrollment::into_enrollment,
  )
}

fn fetch_enrollment(conn: &Connection, id: Uuid) -> Result<Option<Enrollment>> {
  fetch_one(
    conn,
    &format!("SELECT {} FROM enrollments WHERE enrollment_id = ?1", RawEnrollment::COLUMNS),
    params![encode_uuid(id)],
    RawEnrollment::from_row,
    RawEnrollment::into_enrollment,
  )
}

fn require_course_class(conn: &Connection, id: Uuid) -> Result<()> {
  match fetch_course_class(conn, id)? {
    Some(_) => Ok(()),
    None => Err(roster_core::Error::not_found(Entity::CourseClass, id).into()),
  }
}

const ENROLLMENT_TAKEN: &str =
  "an enrollment with this status already exists for this student and class";

fn insert_enrollment(conn: &Connection, e: &Enrollment) -> Result<()> {
  conn
    .execute(
      "INSERT INTO enrollments (
         enrollment_id, student_id, course_class_id, course_id, term_id,
         status, comment, created_at, modified_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
      params![
        encode_uuid(e.enrollment_id),
        encode_uuid(e.student_id),
        encode_uuid(e.course_class_id),
        encode_uuid(e.course_id),
        encode_uuid(e.term_id),
        encode_status(e.status),
        e.comment,
        encode_dt(e.created_at),
        encode_dt(e.modified_at),
      ],
    )
    .map_err(conflict_on_unique(ENROLLMENT_TAKEN))?;
  Ok(())
}

fn save_enrollment(conn: &Connection, e: &Enrollment) -> Result<()> {
  conn
    .execute(
      "UPDATE enrollments
          SET course_class_id = ?2, course_id = ?3, term_id = ?4,
              status = ?5, comment = ?6, modified_at = ?7
        WHERE enrollment_id = ?1",
      params![
        encode_uuid(e.enrollment_id),
        encode_uuid(e.course_class_id),
        encode_uuid(e.course_id),
        encode_uuid(e.term_id),
        encode_status(e.status),
        e.comment,
        encode_dt(e.modified_at),
      ],
    )
    .map_err(conflict_on_unique(ENROLLMENT_TAKEN))?;
  Ok(())
}

// ─── RosterStore impl ────────────────────────────────────────────────────────

impl RosterStore for SqliteStore {
  // ── Instructor assignment ─────────────────────────────────────────────────

  async fn assign_instructor(
    &self,
    course_class_id: Uuid,
    input: AssignInstructor,
  ) -> Result<InstructorAssignment> {
    let today = self.clock.today();
    let now = Utc::now();

    let assignment = self
      .write(move |tx| {
        live_course_class(tx, course_class_id)?;
        live_employee(tx, input.instructor_id)?;

        let key = RecordKey::new(input.instructor_id, course_class_id);
        let existing = assignments_for_pair(tx, key)?;
        let assigned_on = plan_assign(&existing, key, input.assigned_on, today)?;

        let a = InstructorAssignment {
          assignment_id: Uuid::new_v4(),
          instructor_id: key.subject,
          course_class_id: key.target,
          assigned_on,
          exit_date: None,
          created_at: now,
          modified_at: now,
        };
        tx.execute(
          "INSERT INTO instructor_assignments (
             assignment_id, instructor_id, course_class_id, assigned_on,
             exit_date, created_at, modified_at
           ) VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?5)",
          params![
            encode_uuid(a.assignment_id),
            encode_uuid(a.instructor_id),
            encode_uuid(a.course_class_id),
            encode_date(a.assigned_on),
            encode_dt(a.created_at),
          ],
        )
        .map_err(conflict_on_unique(
          "this instructor is already actively assigned to this class",
        ))?;
        Ok(a)
      })
      .await?;

    tracing::info!(
      assignment_id = %assignment.assignment_id,
      instructor_id = %assignment.instructor_id,
      course_class_id = %assignment.course_class_id,
      assigned_on = %assignment.assigned_on,
      "instructor assigned"
    );
    Ok(assignment)
  }

  async fn unassign_instructor(
    &self,
    course_class_id: Uuid,
    instructor_id: Uuid,
  ) -> Result<InstructorAssignment> {
    let today = self.clock.today();
    let now = Utc::now();

    let assignment = self
      .write(move |tx| {
        live_course_class(tx, course_class_id)?;
        live_employee(tx, instructor_id)?;

        let key = RecordKey::new(instructor_id, course_class_id);
        let existing = assignments_for_pair(tx, key)?;
        let mut a = plan_unassign(&existing, key, today)?.clone();
        a.end_on(today, now);

        tx.execute(
          "UPDATE instructor_assignments SET exit_date = ?2, modified_at = ?3
            WHERE assignment_id = ?1",
          params![
            encode_uuid(a.assignment_id),
            encode_date(today),
            encode_dt(now),
          ],
        )?;
        Ok(a)
      })
      .await?;

    tracing::info!(
      assignment_id = %assignment.assignment_id,
      %instructor_id,
      %course_class_id,
      exit_date = %today,
      "instructor unassigned"
    );
    Ok(assignment)
  }

  async fn active_instructors(&self, course_class_id: Uuid) -> Result<Vec<InstructorAssignment>> {
    let today = self.clock.today();
    self
      .read(move |conn| {
        require_course_class(conn, course_class_id)?;
        let mut all = assignments_of_class(conn, course_class_id)?;
        all.retain(|a| a.is_active_on(today));
        Ok(all)
      })
      .await
  }

  async fn class_assignments(&self, course_class_id: Uuid) -> Result<Vec<InstructorAssignment>> {
    self
      .read(move |conn| {
        require_course_class(conn, course_class_id)?;
        assignments_of_class(conn, course_class_id)
      })
      .await
  }

  // ── Class enrollment ──────────────────────────────────────────────────────

  async fn enroll_student_in_class(
    &self,
    student_id: Uuid,
    input: ClassEnrollment,
  ) -> Result<Enrollment> {
    input.validate()?;
    let mode = self.enrollment_mode;
    let now = Utc::now();

    let (enrollment, previous) = self
      .write(move |tx| {
        live_student(tx, student_id)?;
        let class = live_course_class(tx, input.course_class_id)?;

        let key = RecordKey::new(student_id, class.course_class_id);
        let existing = enrollments_for_pair(tx, key)?;

        match plan_class_enrollment(&existing, key, input.status, mode)? {
          EnrollPlan::Update(current) => {
            let mut e = current.clone();
            let previous = e.status;
            e.status = input.status;
            if let Some(comment) = input.comment {
              e.comment = comment;
            }
            e.modified_at = now;
            save_enrollment(tx, &e)?;
            Ok((e, Some(previous)))
          }
          EnrollPlan::Insert => {
            let e = Enrollment {
              enrollment_id: Uuid::new_v4(),
              student_id,
              course_class_id: class.course_class_id,
              course_id: class.course_id,
              term_id: class.term_id,
              status: input.status,
              comment: input.comment.unwrap_or_default(),
              created_at: now,
              modified_at: now,
            };
            insert_enrollment(tx, &e)?;
            Ok((e, None))
          }
        }
      })
      .await?;

    match previous {
      Some(from) => tracing::info!(
        enrollment_id = %enrollment.enrollment_id,
        %student_id,
        %from,
        to = %enrollment.status,
        "enrollment updated"
      ),
      None => tracing::info!(
        enrollment_id = %enrollment.enrollment_id,
        %student_id,
        status = %enrollment.status,
        %mode,
        "enrollment created"
      ),
    }
    Ok(enrollment)
  }

  async fn unenroll_student_from_class(
    &self,
    student_id: Uuid,
    course_class_id: Uuid,
  ) -> Result<Enrollment> {
    let now = Utc::now();

    let enrollment = self
      .write(move |tx| {
        live_student(tx, student_id)?;
        live_course_class(tx, course_class_id)?;

        let key = RecordKey::new(student_id, course_class_id);
        let existing = enrollments_for_pair(tx, key)?;
        let mut e = plan_unenroll(&existing, key)?.clone();
        e.close(None, now);
        save_enrollment(tx, &e)?;
        Ok(e)
      })
      .await?;

    tracing::info!(
      enrollment_id = %enrollment.enrollment_id,
      %student_id,
      %course_class_id,
      "student unenrolled"
    );
    Ok(enrollment)
  }

  async fn class_enrollments(&self, course_class_id: Uuid) -> Result<Vec<Enrollment>> {
    self
      .read(move |conn| {
        require_course_class(conn, course_class_id)?;
        fetch_all(
          conn,
          &format!(
            "SELECT {} FROM enrollments WHERE course_class_id = ?1 ORDER BY created_at DESC",
            RawEnrollment::COLUMNS
          ),
          params![encode_uuid(course_class_id)],
          RawEnrollment::from_row,
          RawEnrollment::into_enrollment,
        )
      })
      .await
  }

  async fn student_enrollments(&self, student_id: Uuid) -> Result<Vec<Enrollment>> {
    self
      .read(move |conn| {
        if fetch_student(conn, student_id)?.is_none() {
          return Err(roster_core::Error::not_found(Entity::Student, student_id).into());
        }
        fetch_all(
          conn,
          &format!(
            "SELECT {} FROM enrollments WHERE student_id = ?1 ORDER BY created_at DESC",
            RawEnrollment::COLUMNS
          ),
          params![encode_uuid(student_id)],
          RawEnrollment::from_row,
          RawEnrollment::into_enrollment,
        )
      })
      .await
  }

  // ── Generic enrollment ────────────────────────────────────────────────────

  async fn create_enrollment(&self, input: NewEnrollment) -> Result<Enrollment> {
    let now = Utc::now();

    let enrollment = self
      .write(move |tx| {
        live_student(tx, input.student_id)?;
        let class = live_course_class(tx, input.course_class_id)?;

        let key = RecordKey::new(input.student_id, class.course_class_id);
        plan_create(&enrollments_for_pair(tx, key)?, key)?;

        let e = Enrollment {
          enrollment_id: Uuid::new_v4(),
          student_id: input.student_id,
          course_class_id: class.course_class_id,
          course_id: class.course_id,
          term_id: class.term_id,
          status: input.status,
          comment: input.comment,
          created_at: now,
          modified_at: now,
        };
        insert_enrollment(tx, &e)?;
        Ok(e)
      })
      .await?;

    tracing::info!(
      enrollment_id = %enrollment.enrollment_id,
      student_id = %enrollment.student_id,
      status = %enrollment.status,
      "enrollment created"
    );
    Ok(enrollment)
  }

  async fn get_enrollment(&self, id: Uuid) -> Result<Option<Enrollment>> {
    self.read(move |conn| fetch_enrollment(conn, id)).await
  }

  async fn update_enrollment(&self, id: Uuid, patch: EnrollmentPatch) -> Result<Enrollment> {
    let now = Utc::now();

    let (enrollment, previous) = self
      .write(move |tx| {
        let current = fetch_enrollment(tx, id)?
          .ok_or(roster_core::Error::not_found(Entity::Enrollment, id))?;

        let mut e = current.clone();
        if let Some(class_id) = patch.course_class_id
          && class_id != current.course_class_id
        {
          let class = live_course_class(tx, class_id)?;
          e.course_class_id = class.course_class_id;
          e.course_id = class.course_id;
          e.term_id = class.term_id;
        }

        let siblings = enrollments_for_pair(tx, e.key())?;
        plan_update(&siblings, &current, &patch)?;

        if let Some(status) = patch.status {
          e.status = status;
        }
        if let Some(comment) = patch.comment {
          e.comment = comment;
        }
        e.modified_at = now;
        save_enrollment(tx, &e)?;
        Ok((e, current.status))
      })
      .await?;

    if previous != enrollment.status {
      tracing::info!(
        enrollment_id = %enrollment.enrollment_id,
        from = %previous,
        to = %enrollment.status,
        "enrollment status changed"
      );
    }
    Ok(enrollment)
  }

  async fn close_enrollment(&self, id: Uuid, comment: Option<String>) -> Result<Enrollment> {
    let now = Utc::now();

    let enrollment = self
      .write(move |tx| {
        let mut e = fetch_enrollment(tx, id)?
          .ok_or(roster_core::Error::not_found(Entity::Enrollment, id))?;
        e.close(comment, now);
        save_enrollment(tx, &e)?;
        Ok(e)
      })
      .await?;

    tracing::info!(enrollment_id = %enrollment.enrollment_id, "enrollment closed");
    Ok(enrollment)
  }
}
