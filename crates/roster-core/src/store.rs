//! The `CatalogStore` and `RosterStore` traits.
//!
//! The traits are implemented by storage backends (e.g. `roster-store-sqlite`).
//! Higher layers (`roster-api`) depend on this abstraction, not on any
//! concrete backend.
//!
//! Every write method runs as one atomic unit: either every row it touches is
//! written or none is. Implementations must also guarantee that concurrent
//! calls on the same (subject, target) key can never both create an active
//! record, typically with a uniqueness constraint over the active predicate
//! plus an exclusive write transaction around check-then-insert.

use std::future::Future;

use uuid::Uuid;

use crate::{
  StoreError,
  catalog::{
    CareerStep, CareerStepPatch, Course, CourseClass, CourseClassPatch, CoursePatch, Custodian,
    CustodianPatch, Employee, EmployeePatch, FamilyMember, FamilyMemberPatch, NewCareerStep,
    NewCourse, NewCourseClass, NewCustodian, NewEmployee, NewFamilyMember, NewStudent, NewTerm,
    Student, StudentPatch, Term, TermPatch,
  },
  enrollment::{
    AssignInstructor, ClassEnrollment, Enrollment, EnrollmentPatch, InstructorAssignment,
    NewEnrollment,
  },
};

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// Subjects (employees, students) and targets (terms, courses, classes).
///
/// `get_*` methods return retired entities too; `list_*` methods return live
/// entities only. Retiring is idempotent and never deletes a row. `update_*`
/// methods fail with not-found on a retired entity and re-validate the
/// patched entity; a patch that collides with a unique field conflicts.
pub trait CatalogStore: Send + Sync {
  type Error: StoreError;

  // ── Terms ─────────────────────────────────────────────────────────────

  fn create_term(
    &self,
    input: NewTerm,
  ) -> impl Future<Output = Result<Term, Self::Error>> + Send + '_;

  fn get_term(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Term>, Self::Error>> + Send + '_;

  fn list_terms(&self) -> impl Future<Output = Result<Vec<Term>, Self::Error>> + Send + '_;

  fn update_term(
    &self,
    id: Uuid,
    patch: TermPatch,
  ) -> impl Future<Output = Result<Term, Self::Error>> + Send + '_;

  fn retire_term(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Term, Self::Error>> + Send + '_;

  // ── Courses ───────────────────────────────────────────────────────────

  fn create_course(
    &self,
    input: NewCourse,
  ) -> impl Future<Output = Result<Course, Self::Error>> + Send + '_;

  fn get_course(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + '_;

  fn list_courses(&self)
  -> impl Future<Output = Result<Vec<Course>, Self::Error>> + Send + '_;

  fn update_course(
    &self,
    id: Uuid,
    patch: CoursePatch,
  ) -> impl Future<Output = Result<Course, Self::Error>> + Send + '_;

  fn retire_course(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Course, Self::Error>> + Send + '_;

  // ── Course classes ────────────────────────────────────────────────────

  /// Fails with not-found if the course or term is unknown or retired.
  fn create_course_class(
    &self,
    input: NewCourseClass,
  ) -> impl Future<Output = Result<CourseClass, Self::Error>> + Send + '_;

  fn get_course_class(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<CourseClass>, Self::Error>> + Send + '_;

  fn list_course_classes(
    &self,
  ) -> impl Future<Output = Result<Vec<CourseClass>, Self::Error>> + Send + '_;

  /// A new course or term must be live.
  fn update_course_class(
    &self,
    id: Uuid,
    patch: CourseClassPatch,
  ) -> impl Future<Output = Result<CourseClass, Self::Error>> + Send + '_;

  fn retire_course_class(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<CourseClass, Self::Error>> + Send + '_;

  // ── Employees ─────────────────────────────────────────────────────────

  fn create_employee(
    &self,
    input: NewEmployee,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  fn get_employee(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + '_;

  fn list_employees(
    &self,
  ) -> impl Future<Output = Result<Vec<Employee>, Self::Error>> + Send + '_;

  fn update_employee(
    &self,
    id: Uuid,
    patch: EmployeePatch,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  fn retire_employee(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  // ── Students ──────────────────────────────────────────────────────────

  fn create_student(
    &self,
    input: NewStudent,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  fn get_student(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  fn list_students(
    &self,
  ) -> impl Future<Output = Result<Vec<Student>, Self::Error>> + Send + '_;

  fn update_student(
    &self,
    id: Uuid,
    patch: StudentPatch,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  fn retire_student(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  // ── Career steps ──────────────────────────────────────────────────────

  /// Rejects steps that end before they start, carry a negative salary, or
  /// overlap another step of the same employee.
  fn add_career_step(
    &self,
    employee_id: Uuid,
    input: NewCareerStep,
  ) -> impl Future<Output = Result<CareerStep, Self::Error>> + Send + '_;

  /// Re-validates the edited step against its siblings, excluding itself.
  fn update_career_step(
    &self,
    step_id: Uuid,
    patch: CareerStepPatch,
  ) -> impl Future<Output = Result<CareerStep, Self::Error>> + Send + '_;

  /// Newest start first.
  fn list_career_steps(
    &self,
    employee_id: Uuid,
  ) -> impl Future<Output = Result<Vec<CareerStep>, Self::Error>> + Send + '_;

  // ── Custodians ────────────────────────────────────────────────────────

  /// The student must be live. Conflicts when a live custodian of the
  /// student already has the same name and relation.
  fn add_custodian(
    &self,
    student_id: Uuid,
    input: NewCustodian,
  ) -> impl Future<Output = Result<Custodian, Self::Error>> + Send + '_;

  fn get_custodian(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Custodian>, Self::Error>> + Send + '_;

  fn update_custodian(
    &self,
    id: Uuid,
    patch: CustodianPatch,
  ) -> impl Future<Output = Result<Custodian, Self::Error>> + Send + '_;

  fn retire_custodian(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Custodian, Self::Error>> + Send + '_;

  /// Live custodians of the student, by name.
  fn list_custodians(
    &self,
    student_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Custodian>, Self::Error>> + Send + '_;

  // ── Employee family ───────────────────────────────────────────────────

  fn add_family_member(
    &self,
    employee_id: Uuid,
    input: NewFamilyMember,
  ) -> impl Future<Output = Result<FamilyMember, Self::Error>> + Send + '_;

  fn update_family_member(
    &self,
    id: Uuid,
    patch: FamilyMemberPatch,
  ) -> impl Future<Output = Result<FamilyMember, Self::Error>> + Send + '_;

  fn retire_family_member(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<FamilyMember, Self::Error>> + Send + '_;

  /// Live family members of the employee, by name.
  fn list_family(
    &self,
    employee_id: Uuid,
  ) -> impl Future<Output = Result<Vec<FamilyMember>, Self::Error>> + Send + '_;
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The enrollment and assignment consistency engine.
pub trait RosterStore: CatalogStore {
  // ── Instructor assignment ─────────────────────────────────────────────

  /// Start a new assignment. Conflicts if one is already active for the pair.
  fn assign_instructor(
    &self,
    course_class_id: Uuid,
    input: AssignInstructor,
  ) -> impl Future<Output = Result<InstructorAssignment, Self::Error>> + Send + '_;

  /// End the active assignment today. Not-found if none is active.
  fn unassign_instructor(
    &self,
    course_class_id: Uuid,
    instructor_id: Uuid,
  ) -> impl Future<Output = Result<InstructorAssignment, Self::Error>> + Send + '_;

  /// Assignments of a class that are active today.
  fn active_instructors(
    &self,
    course_class_id: Uuid,
  ) -> impl Future<Output = Result<Vec<InstructorAssignment>, Self::Error>> + Send + '_;

  /// Full assignment history of a class, newest first.
  fn class_assignments(
    &self,
    course_class_id: Uuid,
  ) -> impl Future<Output = Result<Vec<InstructorAssignment>, Self::Error>> + Send + '_;

  // ── Class enrollment ──────────────────────────────────────────────────

  /// Enroll per the store's class enrollment mode.
  fn enroll_student_in_class(
    &self,
    student_id: Uuid,
    input: ClassEnrollment,
  ) -> impl Future<Output = Result<Enrollment, Self::Error>> + Send + '_;

  /// Close the student's active enrollment in the class.
  fn unenroll_student_from_class(
    &self,
    student_id: Uuid,
    course_class_id: Uuid,
  ) -> impl Future<Output = Result<Enrollment, Self::Error>> + Send + '_;

  fn class_enrollments(
    &self,
    course_class_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Enrollment>, Self::Error>> + Send + '_;

  /// Newest first.
  fn student_enrollments(
    &self,
    student_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Enrollment>, Self::Error>> + Send + '_;

  // ── Generic enrollment ────────────────────────────────────────────────

  /// Strict create: conflicts if the pair has any record at all.
  fn create_enrollment(
    &self,
    input: NewEnrollment,
  ) -> impl Future<Output = Result<Enrollment, Self::Error>> + Send + '_;

  fn get_enrollment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Enrollment>, Self::Error>> + Send + '_;

  fn update_enrollment(
    &self,
    id: Uuid,
    patch: EnrollmentPatch,
  ) -> impl Future<Output = Result<Enrollment, Self::Error>> + Send + '_;

  /// Force the record to closed, whatever its current status.
  fn close_enrollment(
    &self,
    id: Uuid,
    comment: Option<String>,
  ) -> impl Future<Output = Result<Enrollment, Self::Error>> + Send + '_;
}
