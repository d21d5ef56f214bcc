//! [`SqliteStore`]: the SQLite implementation of [`CatalogStore`].
//!
//! The engine half ([`roster_core::store::RosterStore`]) lives in
//! `engine.rs`; both share the connection helpers defined here.

use std::{path::Path, sync::Arc};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior, params};
use uuid::Uuid;

use roster_core::{
  catalog::{
    CareerStep, CareerStepPatch, Course, CourseClass, CourseClassPatch, CoursePatch, Custodian,
    CustodianPatch, Employee, EmployeePatch, FamilyMember, FamilyMemberPatch, NewCareerStep,
    NewCourse, NewCourseClass, NewCustodian, NewEmployee, NewFamilyMember, NewStudent, NewTerm,
    Student, StudentPatch, Term, TermPatch, normalize_email,
  },
  clock::{Clock, SystemClock},
  enrollment::ClassEnrollmentMode,
  error::Entity,
  lifecycle::check_career_step,
  store::CatalogStore,
};

use crate::{
  Result,
  encode::{
    RawCareerStep, RawCourse, RawCourseClass, RawCustodian, RawEmployee, RawFamilyMember,
    RawStudent, RawTerm, encode_date, encode_decimal, encode_dt, encode_role, encode_uuid,
  },
  error::conflict_on_unique,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Roster store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection and clock are reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:                       tokio_rusqlite::Connection,
  pub(crate) clock:           Arc<dyn Clock>,
  pub(crate) enrollment_mode: ClassEnrollmentMode,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self {
      conn,
      clock: Arc::new(SystemClock),
      enrollment_mode: ClassEnrollmentMode::default(),
    })
  }

  /// Replace the source of "today".
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn with_enrollment_mode(mut self, mode: ClassEnrollmentMode) -> Self {
    self.enrollment_mode = mode;
    self
  }

  pub fn enrollment_mode(&self) -> ClassEnrollmentMode { self.enrollment_mode }

  /// Run `f` inside a `BEGIN IMMEDIATE` transaction.
  ///
  /// The write lock is taken up front, so the checks `f` performs cannot be
  /// invalidated by another writer before it commits. The transaction is
  /// rolled back when `f` fails.
  pub(crate) async fn write<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        match f(&tx) {
          Ok(value) => {
            tx.commit()?;
            Ok(Ok(value))
          }
          Err(e) => Ok(Err(e)),
        }
      })
      .await?
  }

  pub(crate) async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Execute raw SQL against the connection. Test-only escape hatch for
  /// exercising the storage constraints directly.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: String) -> Result<()> {
    self
      .read(move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
      })
      .await
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

const TERM_NAME_TAKEN: &str = "a term with this name already exists";
const COURSE_CODE_TAKEN: &str = "a course with this code already exists";
const CLASS_CODE_TAKEN: &str = "a class with this code already exists for this course and term";
const EMPLOYEE_CODE_TAKEN: &str = "an employee with this code already exists";
const STUDENT_TAKEN: &str =
  "a student with this email, or this name and date of birth, already exists";
const CUSTODIAN_TAKEN: &str = "this student already has a custodian with this name and relation";

type FromRow<R> = fn(&rusqlite::Row<'_>) -> rusqlite::Result<R>;

pub(crate) fn fetch_one<R, T>(
  conn: &Connection,
  sql: &str,
  params: impl rusqlite::Params,
  from_row: FromRow<R>,
  decode: fn(R) -> Result<T>,
) -> Result<Option<T>> {
  conn
    .query_row(sql, params, from_row)
    .optional()?
    .map(decode)
    .transpose()
}

pub(crate) fn fetch_all<R, T>(
  conn: &Connection,
  sql: &str,
  params: impl rusqlite::Params,
  from_row: FromRow<R>,
  decode: fn(R) -> Result<T>,
) -> Result<Vec<T>> {
  let mut stmt = conn.prepare(sql)?;
  let raws = stmt
    .query_map(params, from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(decode).collect()
}

fn retire_row(conn: &Connection, table: &str, id_column: &str, id: Uuid) -> Result<usize> {
  let sql = format!(
    "UPDATE {table} SET is_obsolete = 1, modified_at = ?2 WHERE {id_column} = ?1 AND is_obsolete = 0"
  );
  Ok(conn.execute(&sql, params![encode_uuid(id), encode_dt(Utc::now())])?)
}

// ── Lookups ───────────────────────────────────────────────────────────────

pub(crate) fn fetch_term(conn: &Connection, id: Uuid) -> Result<Option<Term>> {
  fetch_one(
    conn,
    &format!("SELECT {} FROM terms WHERE term_id = ?1", RawTerm::COLUMNS),
    params![encode_uuid(id)],
    RawTerm::from_row,
    RawTerm::into_term,
  )
}

pub(crate) fn fetch_course(conn: &Connection, id: Uuid) -> Result<Option<Course>> {
  fetch_one(
    conn,
    &format!("SELECT {} FROM courses WHERE course_id = ?1", RawCourse::COLUMNS),
    params![encode_uuid(id)],
    RawCourse::from_row,
    RawCourse::into_course,
  )
}

pub(crate) fn fetch_course_class(conn: &Connection, id: Uuid) -> Result<Option<CourseClass>> {
  fetch_one(
    conn,
    &format!(
      "SELECT {} FROM course_classes WHERE course_class_id = ?1",
      RawCourseClass::COLUMNS
    ),
    params![encode_uuid(id)],
    RawCourseClass::from_row,
    RawCourseClass::into_course_class,
  )
}

pub(crate) fn fetch_employee(conn: &Connection, id: Uuid) -> Result<Option<Employee>> {
  fetch_one(
    conn,
    &format!("SELECT {} FROM employees WHERE employee_id = ?1", RawEmployee::COLUMNS),
    params![encode_uuid(id)],
    RawEmployee::from_row,
    RawEmployee::into_employee,
  )
}

pub(crate) fn fetch_student(conn: &Connection, id: Uuid) -> Result<Option<Student>> {
  fetch_one(
    conn,
    &format!("SELECT {} FROM students WHERE student_id = ?1", RawStudent::COLUMNS),
    params![encode_uuid(id)],
    RawStudent::from_row,
    RawStudent::into_student,
  )
}

fn fetch_career_step(conn: &Connection, id: Uuid) -> Result<Option<CareerStep>> {
  fetch_one(
    conn,
    &format!("SELECT {} FROM career_steps WHERE career_step_id = ?1", RawCareerStep::COLUMNS),
    params![encode_uuid(id)],
    RawCareerStep::from_row,
    RawCareerStep::into_career_step,
  )
}

fn fetch_custodian(conn: &Connection, id: Uuid) -> Result<Option<Custodian>> {
  fetch_one(
    conn,
    &format!("SELECT {} FROM custodians WHERE custodian_id = ?1", RawCustodian::COLUMNS),
    params![encode_uuid(id)],
    RawCustodian::from_row,
    RawCustodian::into_custodian,
  )
}

fn fetch_family_member(conn: &Connection, id: Uuid) -> Result<Option<FamilyMember>> {
  fetch_one(
    conn,
    &format!(
      "SELECT {} FROM family_members WHERE family_member_id = ?1",
      RawFamilyMember::COLUMNS
    ),
    params![encode_uuid(id)],
    RawFamilyMember::from_row,
    RawFamilyMember::into_family_member,
  )
}

fn career_steps_of(conn: &Connection, employee_id: Uuid) -> Result<Vec<CareerStep>> {
  fetch_all(
    conn,
    &format!(
      "SELECT {} FROM career_steps WHERE employee_id = ?1 ORDER BY start_date DESC",
      RawCareerStep::COLUMNS
    ),
    params![encode_uuid(employee_id)],
    RawCareerStep::from_row,
    RawCareerStep::into_career_step,
  )
}

// ── Resolvers ─────────────────────────────────────────────────────────────
//
// A subject or target resolves only when it exists and is not obsolete.

pub(crate) fn live_term(conn: &Connection, id: Uuid) -> Result<Term> {
  match fetch_term(conn, id)? {
    Some(t) if !t.is_obsolete => Ok(t),
    _ => Err(roster_core::Error::not_found(Entity::Term, id).into()),
  }
}

pub(crate) fn live_course(conn: &Connection, id: Uuid) -> Result<Course> {
  match fetch_course(conn, id)? {
    Some(c) if !c.is_obsolete => Ok(c),
    _ => Err(roster_core::Error::not_found(Entity::Course, id).into()),
  }
}

pub(crate) fn live_course_class(conn: &Connection, id: Uuid) -> Result<CourseClass> {
  match fetch_course_class(conn, id)? {
    Some(c) if !c.is_obsolete => Ok(c),
    _ => Err(roster_core::Error::not_found(Entity::CourseClass, id).into()),
  }
}

pub(crate) fn live_employee(conn: &Connection, id: Uuid) -> Result<Employee> {
  match fetch_employee(conn, id)? {
    Some(e) if !e.is_obsolete => Ok(e),
    _ => Err(roster_core::Error::not_found(Entity::Employee, id).into()),
  }
}

pub(crate) fn live_student(conn: &Connection, id: Uuid) -> Result<Student> {
  match fetch_student(conn, id)? {
    Some(s) if !s.is_obsolete => Ok(s),
    _ => Err(roster_core::Error::not_found(Entity::Student, id).into()),
  }
}

fn live_custodian(conn: &Connection, id: Uuid) -> Result<Custodian> {
  match fetch_custodian(conn, id)? {
    Some(c) if !c.is_obsolete => Ok(c),
    _ => Err(roster_core::Error::not_found(Entity::Custodian, id).into()),
  }
}

fn live_family_member(conn: &Connection, id: Uuid) -> Result<FamilyMember> {
  match fetch_family_member(conn, id)? {
    Some(m) if !m.is_obsolete => Ok(m),
    _ => Err(roster_core::Error::not_found(Entity::FamilyMember, id).into()),
  }
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = crate::Error;

  // ── Terms ─────────────────────────────────────────────────────────────────

  async fn create_term(&self, input: NewTerm) -> Result<Term> {
    input.validate()?;
    let now = Utc::now();
    let term = Term {
      term_id:     Uuid::new_v4(),
      name:        input.name.trim().to_owned(),
      start_date:  input.start_date,
      end_date:    input.end_date,
      is_obsolete: false,
      created_at:  now,
      modified_at: now,
    };

    let row = term.clone();
    self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO terms (term_id, name, start_date, end_date, created_at, modified_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          params![
            encode_uuid(row.term_id),
            row.name,
            encode_date(row.start_date),
            encode_date(row.end_date),
            encode_dt(row.created_at),
          ],
        )
        .map_err(conflict_on_unique(TERM_NAME_TAKEN))?;
        Ok(())
      })
      .await?;
    Ok(term)
  }

  async fn get_term(&self, id: Uuid) -> Result<Option<Term>> {
    self.read(move |conn| fetch_term(conn, id)).await
  }

  async fn list_terms(&self) -> Result<Vec<Term>> {
    self
      .read(|conn| {
        fetch_all(
          conn,
          &format!(
            "SELECT {} FROM terms WHERE is_obsolete = 0 ORDER BY start_date DESC",
            RawTerm::COLUMNS
          ),
          params![],
          RawTerm::from_row,
          RawTerm::into_term,
        )
      })
      .await
  }

  async fn update_term(&self, id: Uuid, patch: TermPatch) -> Result<Term> {
    let now = Utc::now();
    self
      .write(move |tx| {
        let mut term = live_term(tx, id)?.patched(patch);
        term.validate()?;
        term.modified_at = now;
        tx.execute(
          "UPDATE terms SET name = ?2, start_date = ?3, end_date = ?4, modified_at = ?5
            WHERE term_id = ?1",
          params![
            encode_uuid(term.term_id),
            term.name,
            encode_date(term.start_date),
            encode_date(term.end_date),
            encode_dt(term.modified_at),
          ],
        )
        .map_err(conflict_on_unique(TERM_NAME_TAKEN))?;
        Ok(term)
      })
      .await
  }

  async fn retire_term(&self, id: Uuid) -> Result<Term> {
    self
      .write(move |tx| {
        retire_row(tx, "terms", "term_id", id)?;
        fetch_term(tx, id)?.ok_or_else(|| roster_core::Error::not_found(Entity::Term, id).into())
      })
      .await
  }

  // ── Courses ───────────────────────────────────────────────────────────────

  async fn create_course(&self, input: NewCourse) -> Result<Course> {
    input.validate()?;
    let now = Utc::now();
    let course = Course {
      course_id:   Uuid::new_v4(),
      code:        input.code.trim().to_owned(),
      name:        input.name,
      description: input.description,
      is_obsolete: false,
      created_at:  now,
      modified_at: now,
    };

    let row = course.clone();
    self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO courses (course_id, code, name, description, created_at, modified_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          params![
            encode_uuid(row.course_id),
            row.code,
            row.name,
            row.description,
            encode_dt(row.created_at),
          ],
        )
        .map_err(conflict_on_unique(COURSE_CODE_TAKEN))?;
        Ok(())
      })
      .await?;
    Ok(course)
  }

  async fn get_course(&self, id: Uuid) -> Result<Option<Course>> {
    self.read(move |conn| fetch_course(conn, id)).await
  }

  async fn list_courses(&self) -> Result<Vec<Course>> {
    self
      .read(|conn| {
        fetch_all(
          conn,
          &format!(
            "SELECT {} FROM courses WHERE is_obsolete = 0 ORDER BY code",
            RawCourse::COLUMNS
          ),
          params![],
          RawCourse::from_row,
          RawCourse::into_course,
        )
      })
      .await
  }

  async fn update_course(&self, id: Uuid, patch: CoursePatch) -> Result<Course> {
    let now = Utc::now();
    self
      .write(move |tx| {
        let mut course = live_course(tx, id)?.patched(patch);
        course.validate()?;
        course.modified_at = now;
        tx.execute(
          "UPDATE courses SET code = ?2, name = ?3, description = ?4, modified_at = ?5
            WHERE course_id = ?1",
          params![
            encode_uuid(course.course_id),
            course.code,
            course.name,
            course.description,
            encode_dt(course.modified_at),
          ],
        )
        .map_err(conflict_on_unique(COURSE_CODE_TAKEN))?;
        Ok(course)
      })
      .await
  }

  async fn retire_course(&self, id: Uuid) -> Result<Course> {
    self
      .write(move |tx| {
        retire_row(tx, "courses", "course_id", id)?;
        fetch_course(tx, id)?
          .ok_or_else(|| roster_core::Error::not_found(Entity::Course, id).into())
      })
      .await
  }

  // ── Course classes ────────────────────────────────────────────────────────

  async fn create_course_class(&self, input: NewCourseClass) -> Result<CourseClass> {
    input.validate()?;
    let now = Utc::now();
    let class = CourseClass {
      course_class_id: Uuid::new_v4(),
      course_id:       input.course_id,
      term_id:         input.term_id,
      code:            input.code.trim().to_owned(),
      is_obsolete:     false,
      created_at:      now,
      modified_at:     now,
    };

    let row = class.clone();
    self
      .write(move |tx| {
        live_course(tx, row.course_id)?;
        live_term(tx, row.term_id)?;
        tx.execute(
          "INSERT INTO course_classes
             (course_class_id, course_id, term_id, code, created_at, modified_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          params![
            encode_uuid(row.course_class_id),
            encode_uuid(row.course_id),
            encode_uuid(row.term_id),
            row.code,
            encode_dt(row.created_at),
          ],
        )
        .map_err(conflict_on_unique(CLASS_CODE_TAKEN))?;
        Ok(())
      })
      .await?;
    Ok(class)
  }

  async fn get_course_class(&self, id: Uuid) -> Result<Option<CourseClass>> {
    self.read(move |conn| fetch_course_class(conn, id)).await
  }

  async fn list_course_classes(&self) -> Result<Vec<CourseClass>> {
    self
      .read(|conn| {
        fetch_all(
          conn,
          &format!(
            "SELECT {} FROM course_classes WHERE is_obsolete = 0 ORDER BY code",
            RawCourseClass::COLUMNS
          ),
          params![],
          RawCourseClass::from_row,
          RawCourseClass::into_course_class,
        )
      })
      .await
  }

  async fn update_course_class(&self, id: Uuid, patch: CourseClassPatch) -> Result<CourseClass> {
    let now = Utc::now();
    let (class, moved) = self
      .write(move |tx| {
        let current = live_course_class(tx, id)?;
        let mut class = current.patched(patch);
        class.validate()?;
        class.modified_at = now;
        if class.course_id != current.course_id {
          live_course(tx, class.course_id)?;
        }
        if class.term_id != current.term_id {
          live_term(tx, class.term_id)?;
        }

        tx.execute(
          "UPDATE course_classes SET course_id = ?2, term_id = ?3, code = ?4, modified_at = ?5
            WHERE course_class_id = ?1",
          params![
            encode_uuid(class.course_class_id),
            encode_uuid(class.course_id),
            encode_uuid(class.term_id),
            class.code,
            encode_dt(class.modified_at),
          ],
        )
        .map_err(conflict_on_unique(CLASS_CODE_TAKEN))?;

        let moved = class.course_id != current.course_id || class.term_id != current.term_id;
        if moved {
          tx.execute(
            "UPDATE enrollments SET course_id = ?2, term_id = ?3, modified_at = ?4
              WHERE course_class_id = ?1",
            params![
              encode_uuid(class.course_class_id),
              encode_uuid(class.course_id),
              encode_uuid(class.term_id),
              encode_dt(now),
            ],
          )?;
        }
        Ok((class, moved))
      })
      .await?;

    if moved {
      tracing::info!(
        course_class_id = %class.course_class_id,
        course_id = %class.course_id,
        term_id = %class.term_id,
        "course class moved"
      );
    }
    Ok(class)
  }

  async fn retire_course_class(&self, id: Uuid) -> Result<CourseClass> {
    self
      .write(move |tx| {
        retire_row(tx, "course_classes", "course_class_id", id)?;
        fetch_course_class(tx, id)?
          .ok_or_else(|| roster_core::Error::not_found(Entity::CourseClass, id).into())
      })
      .await
  }

  // ── Employees ─────────────────────────────────────────────────────────────

  async fn create_employee(&self, input: NewEmployee) -> Result<Employee> {
    input.validate()?;
    let now = Utc::now();
    let employee = Employee {
      employee_id: Uuid::new_v4(),
      code:        input.code.trim().to_owned(),
      first_name:  input.first_name,
      family_name: input.family_name,
      role:        input.role,
      is_obsolete: false,
      created_at:  now,
      modified_at: now,
    };

    let row = employee.clone();
    self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO employees
             (employee_id, code, first_name, family_name, role, created_at, modified_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          params![
            encode_uuid(row.employee_id),
            row.code,
            row.first_name,
            row.family_name,
            encode_role(row.role),
            encode_dt(row.created_at),
          ],
        )
        .map_err(conflict_on_unique(EMPLOYEE_CODE_TAKEN))?;
        Ok(())
      })
      .await?;
    Ok(employee)
  }

  async fn get_employee(&self, id: Uuid) -> Result<Option<Employee>> {
    self.read(move |conn| fetch_employee(conn, id)).await
  }

  async fn list_employees(&self) -> Result<Vec<Employee>> {
    self
      .read(|conn| {
        fetch_all(
          conn,
          &format!(
            "SELECT {} FROM employees WHERE is_obsolete = 0 ORDER BY family_name, first_name",
            RawEmployee::COLUMNS
          ),
          params![],
          RawEmployee::from_row,
          RawEmployee::into_employee,
        )
      })
      .await
  }

  async fn update_employee(&self, id: Uuid, patch: EmployeePatch) -> Result<Employee> {
    let now = Utc::now();
    self
      .write(move |tx| {
        let mut employee = live_employee(tx, id)?.patched(patch);
        employee.validate()?;
        employee.modified_at = now;
        tx.execute(
          "UPDATE employees
              SET code = ?2, first_name = ?3, family_name = ?4, role = ?5, modified_at = ?6
            WHERE employee_id = ?1",
          params![
            encode_uuid(employee.employee_id),
            employee.code,
            employee.first_name,
            employee.family_name,
            encode_role(employee.role),
            encode_dt(employee.modified_at),
          ],
        )
        .map_err(conflict_on_unique(EMPLOYEE_CODE_TAKEN))?;
        Ok(employee)
      })
      .await
  }

  async fn retire_employee(&self, id: Uuid) -> Result<Employee> {
    self
      .write(move |tx| {
        retire_row(tx, "employees", "employee_id", id)?;
        fetch_employee(tx, id)?
          .ok_or_else(|| roster_core::Error::not_found(Entity::Employee, id).into())
      })
      .await
  }

  // ── Students ──────────────────────────────────────────────────────────────

  async fn create_student(&self, input: NewStudent) -> Result<Student> {
    input.validate()?;
    let now = Utc::now();
    let student = Student {
      student_id:  Uuid::new_v4(),
      first_name:  input.first_name,
      family_name: input.family_name,
      dob:         input.dob,
      email:       normalize_email(&input.email),
      is_obsolete: false,
      created_at:  now,
      modified_at: now,
    };

    let row = student.clone();
    self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO students
             (student_id, first_name, family_name, dob, email, created_at, modified_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          params![
            encode_uuid(row.student_id),
            row.first_name,
            row.family_name,
            encode_date(row.dob),
            row.email,
            encode_dt(row.created_at),
          ],
        )
        .map_err(conflict_on_unique(STUDENT_TAKEN))?;
        Ok(())
      })
      .await?;
    Ok(student)
  }

  async fn get_student(&self, id: Uuid) -> Result<Option<Student>> {
    self.read(move |conn| fetch_student(conn, id)).await
  }

  async fn list_students(&self) -> Result<Vec<Student>> {
    self
      .read(|conn| {
        fetch_all(
          conn,
          &format!(
            "SELECT {} FROM students WHERE is_obsolete = 0 ORDER BY family_name, first_name",
            RawStudent::COLUMNS
          ),
          params![],
          RawStudent::from_row,
          RawStudent::into_student,
        )
      })
      .await
  }

  async fn update_student(&self, id: Uuid, patch: StudentPatch) -> Result<Student> {
    let now = Utc::now();
    self
      .write(move |tx| {
        let mut student = live_student(tx, id)?.patched(patch);
        student.validate()?;
        student.modified_at = now;
        tx.execute(
          "UPDATE students
              SET first_name = ?2, family_name = ?3, dob = ?4, email = ?5, modified_at = ?6
            WHERE student_id = ?1",
          params![
            encode_uuid(student.student_id),
            student.first_name,
            student.family_name,
            encode_date(student.dob),
            student.email,
            encode_dt(student.modified_at),
          ],
        )
        .map_err(conflict_on_unique(STUDENT_TAKEN))?;
        Ok(student)
      })
      .await
  }

  async fn retire_student(&self, id: Uuid) -> Result<Student> {
    self
      .write(move |tx| {
        retire_row(tx, "students", "student_id", id)?;
        fetch_student(tx, id)?
          .ok_or_else(|| roster_core::Error::not_found(Entity::Student, id).into())
      })
      .await
  }

  // ── Career steps ──────────────────────────────────────────────────────────

  async fn add_career_step(&self, employee_id: Uuid, input: NewCareerStep) -> Result<CareerStep> {
    let now = Utc::now();
    let step = CareerStep {
      career_step_id:  Uuid::new_v4(),
      employee_id,
      start_date:      input.start_date,
      end_date:        input.end_date,
      function:        input.function,
      salary:          input.salary,
      competence_area: input.competence_area,
      created_at:      now,
      modified_at:     now,
    };

    let row = step.clone();
    self
      .write(move |tx| {
        live_employee(tx, employee_id)?;
        check_career_step(&row, &career_steps_of(tx, employee_id)?)?;
        tx.execute(
          "INSERT INTO career_steps (
             career_step_id, employee_id, start_date, end_date, function,
             salary, competence_area, created_at, modified_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
          params![
            encode_uuid(row.career_step_id),
            encode_uuid(row.employee_id),
            encode_date(row.start_date),
            row.end_date.map(encode_date),
            row.function,
            encode_decimal(row.salary),
            row.competence_area,
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(%employee_id, step_id = %step.career_step_id, "career step added");
    Ok(step)
  }

  async fn update_career_step(&self, step_id: Uuid, patch: CareerStepPatch) -> Result<CareerStep> {
    let now = Utc::now();
    self
      .write(move |tx| {
        let current = fetch_career_step(tx, step_id)?
          .ok_or(roster_core::Error::not_found(Entity::CareerStep, step_id))?;
        let mut edited = current.patched(patch);
        edited.modified_at = now;

        check_career_step(&edited, &career_steps_of(tx, edited.employee_id)?)?;
        tx.execute(
          "UPDATE career_steps
              SET start_date = ?2, end_date = ?3, function = ?4, salary = ?5,
                  competence_area = ?6, modified_at = ?7
            WHERE career_step_id = ?1",
          params![
            encode_uuid(edited.career_step_id),
            encode_date(edited.start_date),
            edited.end_date.map(encode_date),
            edited.function,
            encode_decimal(edited.salary),
            edited.competence_area,
            encode_dt(edited.modified_at),
          ],
        )?;
        Ok(edited)
      })
      .await
  }

  async fn list_career_steps(&self, employee_id: Uuid) -> Result<Vec<CareerStep>> {
    self
      .read(move |conn| {
        if fetch_employee(conn, employee_id)?.is_none() {
          return Err(roster_core::Error::not_found(Entity::Employee, employee_id).into());
        }
        career_steps_of(conn, employee_id)
      })
      .await
  }

  // ── Custodians ────────────────────────────────────────────────────────────

  async fn add_custodian(&self, student_id: Uuid, input: NewCustodian) -> Result<Custodian> {
    let now = Utc::now();
    let custodian = Custodian {
      custodian_id: Uuid::new_v4(),
      student_id,
      name: input.name.trim().to_owned(),
      relation: input.relation.trim().to_owned(),
      phone: input.phone,
      email: normalize_email(&input.email),
      is_obsolete: false,
      created_at: now,
      modified_at: now,
    };
    custodian.validate()?;

    let row = custodian.clone();
    self
      .write(move |tx| {
        live_student(tx, student_id)?;
        tx.execute(
          "INSERT INTO custodians (
             custodian_id, student_id, name, relation, phone, email, created_at, modified_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
          params![
            encode_uuid(row.custodian_id),
            encode_uuid(row.student_id),
            row.name,
            row.relation,
            row.phone,
            row.email,
            encode_dt(row.created_at),
          ],
        )
        .map_err(conflict_on_unique(CUSTODIAN_TAKEN))?;
        Ok(())
      })
      .await?;
    Ok(custodian)
  }

  async fn get_custodian(&self, id: Uuid) -> Result<Option<Custodian>> {
    self.read(move |conn| fetch_custodian(conn, id)).await
  }

  async fn update_custodian(&self, id: Uuid, patch: CustodianPatch) -> Result<Custodian> {
    let now = Utc::now();
    self
      .write(move |tx| {
        let mut custodian = live_custodian(tx, id)?.patched(patch);
        custodian.validate()?;
        custodian.modified_at = now;
        tx.execute(
          "UPDATE custodians
              SET name = ?2, relation = ?3, phone = ?4, email = ?5, modified_at = ?6
            WHERE custodian_id = ?1",
          params![
            encode_uuid(custodian.custodian_id),
            custodian.name,
            custodian.relation,
            custodian.phone,
            custodian.email,
            encode_dt(custodian.modified_at),
          ],
        )
        .map_err(conflict_on_unique(CUSTODIAN_TAKEN))?;
        Ok(custodian)
      })
      .await
  }

  async fn retire_custodian(&self, id: Uuid) -> Result<Custodian> {
    self
      .write(move |tx| {
        retire_row(tx, "custodians", "custodian_id", id)?;
        fetch_custodian(tx, id)?
          .ok_or_else(|| roster_core::Error::not_found(Entity::Custodian, id).into())
      })
      .await
  }

  async fn list_custodians(&self, student_id: Uuid) -> Result<Vec<Custodian>> {
    self
      .read(move |conn| {
        if fetch_student(conn, student_id)?.is_none() {
          return Err(roster_core::Error::not_found(Entity::Student, student_id).into());
        }
        fetch_all(
          conn,
          &format!(
            "SELECT {} FROM custodians
              WHERE student_id = ?1 AND is_obsolete = 0
              ORDER BY name",
            RawCustodian::COLUMNS
          ),
          params![encode_uuid(student_id)],
          RawCustodian::from_row,
          RawCustodian::into_custodian,
        )
      })
      .await
  }

  // ── Employee family ───────────────────────────────────────────────────────

  async fn add_family_member(
    &self,
    employee_id: Uuid,
    input: NewFamilyMember,
  ) -> Result<FamilyMember> {
    let now = Utc::now();
    let member = FamilyMember {
      family_member_id: Uuid::new_v4(),
      employee_id,
      name: input.name.trim().to_owned(),
      relation: input.relation.trim().to_owned(),
      is_obsolete: false,
      created_at: now,
      modified_at: now,
    };
    member.validate()?;

    let row = member.clone();
    self
      .write(move |tx| {
        live_employee(tx, employee_id)?;
        tx.execute(
          "INSERT INTO family_members
             (family_member_id, employee_id, name, relation, created_at, modified_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          params![
            encode_uuid(row.family_member_id),
            encode_uuid(row.employee_id),
            row.name,
            row.relation,
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(member)
  }

  async fn update_family_member(
    &self,
    id: Uuid,
    patch: FamilyMemberPatch,
  ) -> Result<FamilyMember> {
    let now = Utc::now();
    self
      .write(move |tx| {
        let mut member = live_family_member(tx, id)?.patched(patch);
        member.validate()?;
        member.modified_at = now;
        tx.execute(
          "UPDATE family_members SET name = ?2, relation = ?3, modified_at = ?4
            WHERE family_member_id = ?1",
          params![
            encode_uuid(member.family_member_id),
            member.name,
            member.relation,
            encode_dt(member.modified_at),
          ],
        )?;
        Ok(member)
      })
      .await
  }

  async fn retire_family_member(&self, id: Uuid) -> Result<FamilyMember> {
    self
      .write(move |tx| {
        retire_row(tx, "family_members", "family_member_id", id)?;
        fetch_family_member(tx, id)?
          .ok_or_else(|| roster_core::Error::not_found(Entity::FamilyMember, id).into())
      })
      .await
  }

  async fn list_family(&self, employee_id: Uuid) -> Result<Vec<FamilyMember>> {
    self
      .read(move |conn| {
        if fetch_employee(conn, employee_id)?.is_none() {
          return Err(roster_core::Error::not_found(Entity::Employee, employee_id).into());
        }
        fetch_all(
          conn,
          &format!(
            "SELECT {} FROM family_members
              WHERE employee_id = ?1 AND is_obsolete = 0
              ORDER BY name",
            RawFamilyMember::COLUMNS
          ),
          params![encode_uuid(employee_id)],
          RawFamilyMember::from_row,
          RawFamilyMember::into_family_member,
        )
      })
      .await
  }
}
