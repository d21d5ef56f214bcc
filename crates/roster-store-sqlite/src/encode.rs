//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and calendar dates as
//! `YYYY-MM-DD`, so lexical order in SQL matches chronological order. UUIDs
//! are stored as hyphenated lowercase strings; decimals as their canonical
//! string form.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use roster_core::{
  catalog::{CareerStep, Course, CourseClass, Custodian, Employee, FamilyMember, Student, Term},
  enrollment::{Enrollment, EnrollmentStatus, InstructorAssignment},
  policy::Role,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref().map(decode_date).transpose()
}

pub fn encode_decimal(d: Decimal) -> String { d.normalize().to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

pub fn encode_role(r: Role) -> String { r.to_string() }

pub fn decode_role(s: &str) -> Result<Role> {
  s.parse().map_err(|_| Error::UnknownValue { column: "role", value: s.to_owned() })
}

pub fn encode_status(s: EnrollmentStatus) -> &'static str {
  match s {
    EnrollmentStatus::Enquired => "enquired",
    EnrollmentStatus::Active => "active",
    EnrollmentStatus::Closed => "closed",
  }
}

pub fn decode_status(s: &str) -> Result<EnrollmentStatus> {
  match s {
    "enquired" => Ok(EnrollmentStatus::Enquired),
    "active" => Ok(EnrollmentStatus::Active),
    "closed" => Ok(EnrollmentStatus::Closed),
    other => Err(Error::UnknownValue { column: "status", value: other.to_owned() }),
  }
}

// ─── Raw rows ────────────────────────────────────────────────────────────────
//
// Each `Raw*` struct mirrors one table row as stored. The `COLUMNS` constant
// lists the SELECT columns in the order `from_row` reads them.

pub struct RawTerm {
  pub term_id:     String,
  pub name:        String,
  pub start_date:  String,
  pub end_date:    String,
  pub is_obsolete: bool,
  pub created_at:  String,
  pub modified_at: String,
}

impl RawTerm {
  pub const COLUMNS: &'static str =
    "term_id, name, start_date, end_date, is_obsolete, created_at, modified_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      term_id:     row.get(0)?,
      name:        row.get(1)?,
      start_date:  row.get(2)?,
      end_date:    row.get(3)?,
      is_obsolete: row.get(4)?,
      created_at:  row.get(5)?,
      modified_at: row.get(6)?,
    })
  }

  pub fn into_term(self) -> Result<Term> {
    Ok(Term {
      term_id:     decode_uuid(&self.term_id)?,
      name:        self.name,
      start_date:  decode_date(&self.start_date)?,
      end_date:    decode_date(&self.end_date)?,
      is_obsolete: self.is_obsolete,
      created_at:  decode_dt(&self.created_at)?,
      modified_at: decode_dt(&self.modified_at)?,
    })
  }
}

pub struct RawCourse {
  pub course_id:   String,
  pub code:        String,
  pub name:        String,
  pub description: String,
  pub is_obsolete: bool,
  pub created_at:  String,
  pub modified_at: String,
}

impl RawCourse {
  pub const COLUMNS: &'static str =
    "course_id, code, name, description, is_obsolete, created_at, modified_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      course_id:   row.get(0)?,
      code:        row.get(1)?,
      name:        row.get(2)?,
      description: row.get(3)?,
      is_obsolete: row.get(4)?,
      created_at:  row.get(5)?,
      modified_at: row.get(6)?,
    })
  }

  pub fn into_course(self) -> Result<Course> {
    Ok(Course {
      course_id:   decode_uuid(&self.course_id)?,
      code:        self.code,
      name:        self.name,
      description: self.description,
      is_obsolete: self.is_obsolete,
      created_at:  decode_dt(&self.created_at)?,
      modified_at: decode_dt(&self.modified_at)?,
    })
  }
}

pub struct RawCourseClass {
  pub course_class_id: String,
  pub course_id:       String,
  pub term_id:         String,
  pub code:            String,
  pub is_obsolete:     bool,
  pub created_at:      String,
  pub modified_at:     String,
}

impl RawCourseClass {
  pub const COLUMNS: &'static str =
    "course_class_id, course_id, term_id, code, is_obsolete, created_at, modified_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      course_class_id: row.get(0)?,
      course_id:       row.get(1)?,
      term_id:         row.get(2)?,
      code:            row.get(3)?,
      is_obsolete:     row.get(4)?,
      created_at:      row.get(5)?,
      modified_at:     row.get(6)?,
    })
  }

  pub fn into_course_class(self) -> Result<CourseClass> {
    Ok(CourseClass {
      course_class_id: decode_uuid(&self.course_class_id)?,
      course_id:       decode_uuid(&self.course_id)?,
      term_id:         decode_uuid(&self.term_id)?,
      code:            self.code,
      is_obsolete:     self.is_obsolete,
      created_at:      decode_dt(&self.created_at)?,
      modified_at:     decode_dt(&self.modified_at)?,
    })
  }
}

pub struct RawEmployee {
  pub employee_id: String,
  pub code:        String,
  pub first_name:  String,
  pub family_name: String,
  pub role:        String,
  pub is_obsolete: bool,
  pub created_at:  String,
  pub modified_at: String,
}

impl RawEmployee {
  pub const COLUMNS: &'static str = "employee_id, code, first_name, family_name, role, \
                                     is_obsolete, created_at, modified_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      employee_id: row.get(0)?,
      code:        row.get(1)?,
      first_name:  row.get(2)?,
      family_name: row.get(3)?,
      role:        row.get(4)?,
      is_obsolete: row.get(5)?,
      created_at:  row.get(6)?,
      modified_at: row.get(7)?,
    })
  }

  pub fn into_employee(self) -> Result<Employee> {
    Ok(Employee {
      employee_id: decode_uuid(&self.employee_id)?,
      code:        self.code,
      first_name:  self.first_name,
      family_name: self.family_name,
      role:        decode_role(&self.role)?,
      is_obsolete: self.is_obsolete,
      created_at:  decode_dt(&self.created_at)?,
      modified_at: decode_dt(&self.modified_at)?,
    })
  }
}

pub struct RawStudent {
  pub student_id:  String,
  pub first_name:  String,
  pub family_name: String,
  pub dob:         String,
  pub email:       String,
  pub is_obsolete: bool,
  pub created_at:  String,
  pub modified_at: String,
}

impl RawStudent {
  pub const COLUMNS: &'static str = "student_id, first_name, family_name, dob, email, \
                                     is_obsolete, created_at, modified_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      student_id:  row.get(0)?,
      first_name:  row.get(1)?,
      family_name: row.get(2)?,
      dob:         row.get(3)?,
      email:       row.get(4)?,
      is_obsolete: row.get(5)?,
      created_at:  row.get(6)?,
      modified_at: row.get(7)?,
    })
  }

  pub fn into_student(self) -> Result<Student> {
    Ok(Student {
      student_id:  decode_uuid(&self.student_id)?,
      first_name:  self.first_name,
      family_name: self.family_name,
      dob:         decode_date(&self.dob)?,
      email:       self.email,
      is_obsolete: self.is_obsolete,
      created_at:  decode_dt(&self.created_at)?,
      modified_at: decode_dt(&self.modified_at)?,
    })
  }
}

pub struct RawCustodian {
  pub custodian_id: String,
  pub student_id:   String,
  pub name:         String,
  pub relation:     String,
  pub phone:        String,
  pub email:        String,
  pub is_obsolete:  bool,
  pub created_at:   String,
  pub modified_at:  String,
}

impl RawCustodian {
  pub const COLUMNS: &'static str = "custodian_id, student_id, name, relation, phone, email, \
                                     is_obsolete, created_at, modified_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      custodian_id: row.get(0)?,
      student_id:   row.get(1)?,
      name:         row.get(2)?,
      relation:     row.get(3)?,
      phone:        row.get(4)?,
      email:        row.get(5)?,
      is_obsolete:  row.get(6)?,
      created_at:   row.get(7)?,
      modified_at:  row.get(8)?,
    })
  }

  pub fn into_custodian(self) -> Result<Custodian> {
    Ok(Custodian {
      custodian_id: decode_uuid(&self.custodian_id)?,
      student_id:   decode_uuid(&self.student_id)?,
      name:         self.name,
      relation:     self.relation,
      phone:        self.phone,
      email:        self.email,
      is_obsolete:  self.is_obsolete,
      created_at:   decode_dt(&self.created_at)?,
      modified_at:  decode_dt(&self.modified_at)?,
    })
  }
}

pub struct RawFamilyMember {
  pub family_member_id: String,
  pub employee_id:      String,
  pub name:             String,
  pub relation:         String,
  pub is_obsolete:      bool,
  pub created_at:       String,
  pub modified_at:      String,
}

impl RawFamilyMember {
  pub const COLUMNS: &'static str =
    "family_member_id, employee_id, name, relation, is_obsolete, created_at, modified_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      family_member_id: row.get(0)?,
      employee_id:      row.get(1)?,
      name:             row.get(2)?,
      relation:         row.get(3)?,
      is_obsolete:      row.get(4)?,
      created_at:       row.get(5)?,
      modified_at:      row.get(6)?,
    })
  }

  pub fn into_family_member(self) -> Result<FamilyMember> {
    Ok(FamilyMember {
      family_member_id: decode_uuid(&self.family_member_id)?,
      employee_id:      decode_uuid(&self.employee_id)?,
      name:             self.name,
      relation:         self.relation,
      is_obsolete:      self.is_obsolete,
      created_at:       decode_dt(&self.created_at)?,
      modified_at:      decode_dt(&self.modified_at)?,
    })
  }
}

pub struct RawCareerStep {
  pub career_step_id:  String,
  pub employee_id:     String,
  pub start_date:      String,
  pub end_date:        Option<String>,
  pub function:        String,
  pub salary:          String,
  pub competence_area: String,
  pub created_at:      String,
  pub modified_at:     String,
}

impl RawCareerStep {
  pub const COLUMNS: &'static str = "career_step_id, employee_id, start_date, end_date, \
                                     function, salary, competence_area, created_at, \
                                     modified_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      career_step_id:  row.get(0)?,
      employee_id:     row.get(1)?,
      start_date:      row.get(2)?,
      end_date:        row.get(3)?,
      function:        row.get(4)?,
      salary:          row.get(5)?,
      competence_area: row.get(6)?,
      created_at:      row.get(7)?,
      modified_at:     row.get(8)?,
    })
  }

  pub fn into_career_step(self) -> Result<CareerStep> {
    Ok(CareerStep {
      career_step_id:  decode_uuid(&self.career_step_id)?,
      employee_id:     decode_uuid(&self.employee_id)?,
      start_date:      decode_date(&self.start_date)?,
      end_date:        decode_opt_date(self.end_date)?,
      function:        self.function,
      salary:          decode_decimal(&self.salary)?,
      competence_area: self.competence_area,
      created_at:      decode_dt(&self.created_at)?,
      modified_at:     decode_dt(&self.modified_at)?,
    })
  }
}

pub struct RawAssignment {
  pub assignment_id:   String,
  pub instructor_id:   String,
  pub course_class_id: String,
  pub assigned_on:     String,
  pub exit_date:       Option<String>,
  pub created_at:      String,
  pub modified_at:     String,
}

impl RawAssignment {
  pub const COLUMNS: &'static str = "assignment_id, instructor_id, course_class_id, \
                                     assigned_on, exit_date, created_at, modified_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      assignment_id:   row.get(0)?,
      instructor_id:   row.get(1)?,
      course_class_id: row.get(2)?,
      assigned_on:     row.get(3)?,
      exit_date:       row.get(4)?,
      created_at:      row.get(5)?,
      modified_at:     row.get(6)?,
    })
  }

  pub fn into_assignment(self) -> Result<InstructorAssignment> {
    Ok(InstructorAssignment {
      assignment_id:   decode_uuid(&self.assignment_id)?,
      instructor_id:   decode_uuid(&self.instructor_id)?,
      course_class_id: decode_uuid(&self.course_class_id)?,
      assigned_on:     decode_date(&self.assigned_on)?,
      exit_date:       decode_opt_date(self.exit_date)?,
      created_at:      decode_dt(&self.created_at)?,
      modified_at:     decode_dt(&self.modified_at)?,
    })
  }
}

pub struct RawEnrollment {
  pub enrollment_id:   String,
  pub student_id:      String,
  pub course_class_id: String,
  pub course_id:       String,
  pub term_id:         String,
  pub status:          String,
  pub comment:         String,
  pub created_at:      String,
  pub modified_at:     String,
}

impl RawEnrollment {
  pub const COLUMNS: &'static str = "enrollment_id, student_id, course_class_id, course_id, \
                                     term_id, status, comment, created_at, modified_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      enrollment_id:   row.get(0)?,
      student_id:      row.get(1)?,
      course_class_id: row.get(2)?,
      course_id:       row.get(3)?,
      term_id:         row.get(4)?,
      status:          row.get(5)?,
      comment:         row.get(6)?,
      created_at:      row.get(7)?,
      modified_at:     row.get(8)?,
    })
  }

  pub fn into_enrollment(self) -> Result<Enrollment> {
    Ok(Enrollment {
      enrollment_id:   decode_uuid(&self.enrollment_id)?,
      student_id:      decode_uuid(&self.student_id)?,
      course_class_id: decode_uuid(&self.course_class_id)?,
      course_id:       decode_uuid(&self.course_id)?,
      term_id:         decode_uuid(&self.term_id)?,
      status:          decode_status(&self.status)?,
      comment:         self.comment,
      created_at:      decode_dt(&self.created_at)?,
      modified_at:     decode_dt(&self.modified_at)?,
    })
  }
}
