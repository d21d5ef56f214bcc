//! Catalog entities: the subjects and targets the engine refers to.
//!
//! The engine does not own these lifecycles. It only requires that a
//! referenced subject or target exists and is not obsolete at write time.
//! Nothing here is ever hard-deleted; retiring sets `is_obsolete`.
//!
//! Each entity has a `*Patch` type for partial updates. `patched` applies
//! one and the result is re-validated as a whole before it is stored.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, period::Period, policy::Role};

// ─── Terms, courses, classes ─────────────────────────────────────────────────

/// An academic term (e.g. "Fall 2025").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Term {
  pub term_id:     Uuid,
  /// Unique across all terms.
  pub name:        String,
  pub start_date:  NaiveDate,
  pub end_date:    NaiveDate,
  pub is_obsolete: bool,
  pub created_at:  DateTime<Utc>,
  pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTerm {
  pub name:       String,
  pub start_date: NaiveDate,
  pub end_date:   NaiveDate,
}

impl NewTerm {
  pub fn validate(&self) -> Result<()> { check_term(&self.name, self.start_date, self.end_date) }
}

impl Term {
  pub fn validate(&self) -> Result<()> { check_term(&self.name, self.start_date, self.end_date) }

  pub fn patched(&self, patch: TermPatch) -> Term {
    Term {
      name: patch.name.map_or_else(|| self.name.clone(), |n| n.trim().to_owned()),
      start_date: patch.start_date.unwrap_or(self.start_date),
      end_date: patch.end_date.unwrap_or(self.end_date),
      ..self.clone()
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TermPatch {
  pub name:       Option<String>,
  pub start_date: Option<NaiveDate>,
  pub end_date:   Option<NaiveDate>,
}

fn check_term(name: &str, start: NaiveDate, end: NaiveDate) -> Result<()> {
  require_text("term name", name)?;
  Period::new(start, Some(end))?;
  Ok(())
}

/// The abstract definition of a course (e.g. MATH101).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
  pub course_id:   Uuid,
  /// Unique across all courses.
  pub code:        String,
  pub name:        String,
  pub description: String,
  pub is_obsolete: bool,
  pub created_at:  DateTime<Utc>,
  pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
  pub code:        String,
  pub name:        String,
  #[serde(default)]
  pub description: String,
}

impl NewCourse {
  pub fn validate(&self) -> Result<()> { check_course(&self.code, &self.name) }
}

impl Course {
  pub fn validate(&self) -> Result<()> { check_course(&self.code, &self.name) }

  pub fn patched(&self, patch: CoursePatch) -> Course {
    Course {
      code: patch.code.map_or_else(|| self.code.clone(), |c| c.trim().to_owned()),
      name: patch.name.unwrap_or_else(|| self.name.clone()),
      description: patch.description.unwrap_or_else(|| self.description.clone()),
      ..self.clone()
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoursePatch {
  pub code:        Option<String>,
  pub name:        Option<String>,
  pub description: Option<String>,
}

fn check_course(code: &str, name: &str) -> Result<()> {
  require_text("course code", code)?;
  require_text("course name", name)
}

/// A concrete offering of a course in a term. Students enroll into these and
/// instructors are assigned to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseClass {
  pub course_class_id: Uuid,
  pub course_id:       Uuid,
  pub term_id:         Uuid,
  /// Unique per (course, term).
  pub code:            String,
  pub is_obsolete:     bool,
  pub created_at:      DateTime<Utc>,
  pub modified_at:     DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourseClass {
  pub course_id: Uuid,
  pub term_id:   Uuid,
  pub code:      String,
}

impl NewCourseClass {
  pub fn validate(&self) -> Result<()> { require_text("class code", &self.code) }
}

impl CourseClass {
  pub fn validate(&self) -> Result<()> { require_text("class code", &self.code) }

  /// Moving a class to another course or term also moves the course and
  /// term recorded on its enrollments.
  pub fn patched(&self, patch: CourseClassPatch) -> CourseClass {
    CourseClass {
      course_id: patch.course_id.unwrap_or(self.course_id),
      term_id: patch.term_id.unwrap_or(self.term_id),
      code: patch.code.map_or_else(|| self.code.clone(), |c| c.trim().to_owned()),
      ..self.clone()
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseClassPatch {
  pub course_id: Option<Uuid>,
  pub term_id:   Option<Uuid>,
  pub code:      Option<String>,
}

// ─── People ──────────────────────────────────────────────────────────────────

/// A staff member. Instructors are the subjects of class assignments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
  pub employee_id: Uuid,
  /// Unique staff code.
  pub code:        String,
  pub first_name:  String,
  pub family_name: String,
  pub role:        Role,
  pub is_obsolete: bool,
  pub created_at:  DateTime<Utc>,
  pub modified_at: DateTime<Utc>,
}

impl Employee {
  pub fn full_name(&self) -> String { format!("{} {}", self.first_name, self.family_name) }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
  pub code:        String,
  pub first_name:  String,
  pub family_name: String,
  pub role:        Role,
}

impl NewEmployee {
  pub fn validate(&self) -> Result<()> {
    check_employee(&self.code, &self.first_name, &self.family_name, self.role)
  }
}

impl Employee {
  pub fn validate(&self) -> Result<()> {
    check_employee(&self.code, &self.first_name, &self.family_name, self.role)
  }

  pub fn patched(&self, patch: EmployeePatch) -> Employee {
    Employee {
      code: patch.code.map_or_else(|| self.code.clone(), |c| c.trim().to_owned()),
      first_name: patch.first_name.unwrap_or_else(|| self.first_name.clone()),
      family_name: patch.family_name.unwrap_or_else(|| self.family_name.clone()),
      role: patch.role.unwrap_or(self.role),
      ..self.clone()
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeePatch {
  pub code:        Option<String>,
  pub first_name:  Option<String>,
  pub family_name: Option<String>,
  pub role:        Option<Role>,
}

fn check_employee(code: &str, first_name: &str, family_name: &str, role: Role) -> Result<()> {
  require_text("employee code", code)?;
  require_text("first name", first_name)?;
  require_text("family name", family_name)?;
  if !role.is_employee_role() {
    return Err(Error::validation(format!("an employee cannot hold the '{role}' role")));
  }
  Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
  pub student_id:  Uuid,
  pub first_name:  String,
  pub family_name: String,
  pub dob:         NaiveDate,
  /// Unique across all students.
  pub email:       String,
  pub is_obsolete: bool,
  pub created_at:  DateTime<Utc>,
  pub modified_at: DateTime<Utc>,
}

impl Student {
  pub fn full_name(&self) -> String { format!("{} {}", self.first_name, self.family_name) }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStudent {
  pub first_name:  String,
  pub family_name: String,
  pub dob:         NaiveDate,
  pub email:       String,
}

impl NewStudent {
  pub fn validate(&self) -> Result<()> {
    check_student(&self.first_name, &self.family_name, &self.email)
  }
}

impl Student {
  pub fn validate(&self) -> Result<()> {
    check_student(&self.first_name, &self.family_name, &self.email)
  }

  pub fn patched(&self, patch: StudentPatch) -> Student {
    Student {
      first_name: patch.first_name.unwrap_or_else(|| self.first_name.clone()),
      family_name: patch.family_name.unwrap_or_else(|| self.family_name.clone()),
      dob: patch.dob.unwrap_or(self.dob),
      email: patch.email.map_or_else(|| self.email.clone(), |e| normalize_email(&e)),
      ..self.clone()
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentPatch {
  pub first_name:  Option<String>,
  pub family_name: Option<String>,
  pub dob:         Option<NaiveDate>,
  pub email:       Option<String>,
}

/// Emails are compared case-insensitively, so they are stored lowercased.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

fn check_student(first_name: &str, family_name: &str, email: &str) -> Result<()> {
  require_text("first name", first_name)?;
  require_text("family name", family_name)?;
  check_email(email)
}

fn check_email(email: &str) -> Result<()> {
  if !email.contains('@') {
    return Err(Error::validation(format!("invalid email address: {email:?}")));
  }
  Ok(())
}

// ─── Relatives ───────────────────────────────────────────────────────────────

/// A parent or guardian of a student. `(student, name, relation)` is unique
/// among live custodians.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Custodian {
  pub custodian_id: Uuid,
  pub student_id:   Uuid,
  pub name:         String,
  /// e.g. "Mother", "Guardian".
  pub relation:     String,
  pub phone:        String,
  /// Empty when unknown.
  pub email:        String,
  pub is_obsolete:  bool,
  pub created_at:   DateTime<Utc>,
  pub modified_at:  DateTime<Utc>,
}

impl Custodian {
  pub fn validate(&self) -> Result<()> {
    require_text("custodian name", &self.name)?;
    require_text("relation", &self.relation)?;
    if !self.email.is_empty() {
      check_email(&self.email)?;
    }
    Ok(())
  }

  pub fn patched(&self, patch: CustodianPatch) -> Custodian {
    Custodian {
      name: patch.name.map_or_else(|| self.name.clone(), |n| n.trim().to_owned()),
      relation: patch.relation.map_or_else(|| self.relation.clone(), |r| r.trim().to_owned()),
      phone: patch.phone.unwrap_or_else(|| self.phone.clone()),
      email: patch.email.map_or_else(|| self.email.clone(), |e| normalize_email(&e)),
      ..self.clone()
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCustodian {
  pub name:     String,
  pub relation: String,
  #[serde(default)]
  pub phone:    String,
  #[serde(default)]
  pub email:    String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustodianPatch {
  pub name:     Option<String>,
  pub relation: Option<String>,
  pub phone:    Option<String>,
  pub email:    Option<String>,
}

/// A member of an employee's family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMember {
  pub family_member_id: Uuid,
  pub employee_id:      Uuid,
  pub name:             String,
  pub relation:         String,
  pub is_obsolete:      bool,
  pub created_at:       DateTime<Utc>,
  pub modified_at:      DateTime<Utc>,
}

impl FamilyMember {
  pub fn validate(&self) -> Result<()> {
    require_text("family member name", &self.name)?;
    require_text("relation", &self.relation)
  }

  pub fn patched(&self, patch: FamilyMemberPatch) -> FamilyMember {
    FamilyMember {
      name: patch.name.map_or_else(|| self.name.clone(), |n| n.trim().to_owned()),
      relation: patch.relation.map_or_else(|| self.relation.clone(), |r| r.trim().to_owned()),
      ..self.clone()
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFamilyMember {
  pub name:     String,
  pub relation: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FamilyMemberPatch {
  pub name:     Option<String>,
  pub relation: Option<String>,
}

// ─── Career steps ────────────────────────────────────────────────────────────

/// One position in an employee's career history. Steps of the same employee
/// must never overlap in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareerStep {
  pub career_step_id:  Uuid,
  pub employee_id:     Uuid,
  pub start_date:      NaiveDate,
  pub end_date:        Option<NaiveDate>,
  /// e.g. "Instructor", "HR".
  pub function:        String,
  pub salary:          Decimal,
  pub competence_area: String,
  pub created_at:      DateTime<Utc>,
  pub modified_at:     DateTime<Utc>,
}

impl CareerStep {
  pub fn period(&self) -> Period { Period { start: self.start_date, end: self.end_date } }

  /// Apply `patch`, returning the edited step. Validation of the result is
  /// the caller's job (see [`crate::lifecycle::check_career_step`]).
  pub fn patched(&self, patch: CareerStepPatch) -> CareerStep {
    CareerStep {
      start_date: patch.start_date.unwrap_or(self.start_date),
      end_date: match patch.end_date {
        Some(end) => end,
        None => self.end_date,
      },
      function: patch.function.unwrap_or_else(|| self.function.clone()),
      salary: patch.salary.unwrap_or(self.salary),
      competence_area: patch
        .competence_area
        .unwrap_or_else(|| self.competence_area.clone()),
      ..self.clone()
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCareerStep {
  pub start_date:      NaiveDate,
  pub end_date:        Option<NaiveDate>,
  pub function:        String,
  pub salary:          Decimal,
  #[serde(default)]
  pub competence_area: String,
}

/// Partial update of a career step. `end_date: Some(None)` clears the end.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CareerStepPatch {
  pub start_date:      Option<NaiveDate>,
  #[serde(default, deserialize_with = "double_option")]
  pub end_date:        Option<Option<NaiveDate>>,
  pub function:        Option<String>,
  pub salary:          Option<Decimal>,
  pub competence_area: Option<String>,
}

// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, D, T>(de: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
  D: serde::Deserializer<'de>,
  T: Deserialize<'de>,
{
  Deserialize::deserialize(de).map(Some)
}

fn require_text(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::validation(format!("{field} must not be empty")));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn term_with_inverted_dates_is_invalid() {
    let t = NewTerm {
      name:       "Fall 2025".into(),
      start_date: "2025-12-01".parse().unwrap(),
      end_date:   "2025-09-01".parse().unwrap(),
    };
    assert!(matches!(t.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn student_role_cannot_back_an_employee() {
    let e = NewEmployee {
      code:        "EMP1".into(),
      first_name:  "Ada".into(),
      family_name: "Lovelace".into(),
      role:        Role::Student,
    };
    assert!(matches!(e.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn term_patch_is_revalidated_as_a_whole() {
    let now = Utc::now();
    let term = Term {
      term_id:     Uuid::new_v4(),
      name:        "Fall 2025".into(),
      start_date:  "2025-09-01".parse().unwrap(),
      end_date:    "2025-12-20".parse().unwrap(),
      is_obsolete: false,
      created_at:  now,
      modified_at: now,
    };

    let renamed = term.patched(TermPatch { name: Some("  Autumn 2025 ".into()), ..Default::default() });
    assert_eq!(renamed.name, "Autumn 2025");
    assert_eq!(renamed.end_date, term.end_date);
    renamed.validate().unwrap();

    let inverted = term.patched(TermPatch {
      start_date: Some("2026-01-01".parse().unwrap()),
      ..Default::default()
    });
    assert!(matches!(inverted.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn custodian_email_is_optional_but_checked() {
    let now = Utc::now();
    let custodian = Custodian {
      custodian_id: Uuid::new_v4(),
      student_id:   Uuid::new_v4(),
      name:         "Marie Curie".into(),
      relation:     "Mother".into(),
      phone:        String::new(),
      email:        String::new(),
      is_obsolete:  false,
      created_at:   now,
      modified_at:  now,
    };
    custodian.validate().unwrap();

    let bad = custodian.patched(CustodianPatch { email: Some("nope".into()), ..Default::default() });
    assert!(matches!(bad.validate(), Err(Error::Validation(_))));

    let good = custodian.patched(CustodianPatch {
      email: Some(" Marie@Example.com ".into()),
      ..Default::default()
    });
    assert_eq!(good.email, "marie@example.com");
    good.validate().unwrap();
  }

  #[test]
  fn career_patch_distinguishes_null_from_absent() {
    let absent: CareerStepPatch = serde_json::from_str(r#"{"function":"HR"}"#).unwrap();
    assert_eq!(absent.end_date, None);

    let cleared: CareerStepPatch = serde_json::from_str(r#"{"end_date":null}"#).unwrap();
    assert_eq!(cleared.end_date, Some(None));

    let set: CareerStepPatch =
      serde_json::from_str(r#"{"end_date":"2021-01-01"}"#).unwrap();
    assert_eq!(set.end_date, Some(Some("2021-01-01".parse().unwrap())));
  }
}
