//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use chrono::NaiveDate;
use roster_core::{
  ErrorKind, StoreError,
  catalog::{
    CareerStepPatch, CourseClass, CourseClassPatch, CoursePatch, CustodianPatch, Employee,
    EmployeePatch, FamilyMemberPatch, NewCareerStep, NewCourse, NewCourseClass, NewCustodian,
    NewEmployee, NewFamilyMember, NewStudent, NewTerm, Student, StudentPatch, TermPatch,
  },
  clock::FixedClock,
  enrollment::{
    AssignInstructor, ClassEnrollment, ClassEnrollmentMode, EnrollmentPatch, EnrollmentStatus,
    NewEnrollment,
  },
  policy::Role,
  store::{CatalogStore, RosterStore},
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{SqliteStore, encode::encode_uuid};

fn d(s: &str) -> NaiveDate { s.parse().unwrap() }

struct Fixture {
  store:      SqliteStore,
  clock:      Arc<FixedClock>,
  class:      CourseClass,
  instructor: Employee,
  student:    Student,
}

async fn fixture_with(mode: ClassEnrollmentMode) -> Fixture {
  let clock = Arc::new(FixedClock::new(d("2024-03-15")));
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
    .with_clock(clock.clone())
    .with_enrollment_mode(mode);

  let term = store
    .create_term(NewTerm {
      name:       "Spring 2024".into(),
      start_date: d("2024-02-01"),
      end_date:   d("2024-06-30"),
    })
    .await
    .unwrap();
  let course = store
    .create_course(NewCourse {
      code:        "MATH101".into(),
      name:        "Calculus I".into(),
      description: String::new(),
    })
    .await
    .unwrap();
  let class = store
    .create_course_class(NewCourseClass {
      course_id: course.course_id,
      term_id:   term.term_id,
      code:      "A".into(),
    })
    .await
    .unwrap();
  let instructor = store.create_employee(employee("EMP1")).await.unwrap();
  let student = store.create_student(student("ada@example.com")).await.unwrap();

  Fixture { store, clock, class, instructor, student }
}

async fn fixture() -> Fixture { fixture_with(ClassEnrollmentMode::Upsert).await }

fn employee(code: &str) -> NewEmployee {
  NewEmployee {
    code:        code.into(),
    first_name:  "Grace".into(),
    family_name: format!("Hopper-{code}"),
    role:        Role::Instructor,
  }
}

fn student(email: &str) -> NewStudent {
  NewStudent {
    first_name:  "Ada".into(),
    family_name: "Lovelace".into(),
    dob:         d("2006-12-10"),
    email:       email.into(),
  }
}

fn enroll(class: &CourseClass, status: EnrollmentStatus) -> ClassEnrollment {
  ClassEnrollment { course_class_id: class.course_class_id, status, comment: None }
}

fn assign(instructor: &Employee) -> AssignInstructor {
  AssignInstructor { instructor_id: instructor.employee_id, assigned_on: None }
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_course_code_conflicts() {
  let f = fixture().await;
  let err = f
    .store
    .create_course(NewCourse {
      code:        "MATH101".into(),
      name:        "Another".into(),
      description: String::new(),
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn duplicate_student_identity_conflicts() {
  let f = fixture().await;
  // Same name and date of birth, different email.
  let err = f.store.create_student(student("other@example.com")).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn class_needs_live_course_and_term() {
  let f = fixture().await;
  let err = f
    .store
    .create_course_class(NewCourseClass {
      course_id: Uuid::new_v4(),
      term_id:   f.class.term_id,
      code:      "B".into(),
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  f.store.retire_term(f.class.term_id).await.unwrap();
  let err = f
    .store
    .create_course_class(NewCourseClass {
      course_id: f.class.course_id,
      term_id:   f.class.term_id,
      code:      "B".into(),
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn retire_is_idempotent_and_hides_from_lists() {
  let f = fixture().await;
  let first = f.store.retire_student(f.student.student_id).await.unwrap();
  let again = f.store.retire_student(f.student.student_id).await.unwrap();
  assert!(first.is_obsolete && again.is_obsolete);
  assert_eq!(first.modified_at, again.modified_at);

  assert!(f.store.list_students().await.unwrap().is_empty());
  let fetched = f.store.get_student(f.student.student_id).await.unwrap().unwrap();
  assert!(fetched.is_obsolete);
}

#[tokio::test]
async fn retire_unknown_is_not_found() {
  let f = fixture().await;
  let err = f.store.retire_course(Uuid::new_v4()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn employee_role_survives_roundtrip() {
  let f = fixture().await;
  let fetched = f.store.get_employee(f.instructor.employee_id).await.unwrap().unwrap();
  assert_eq!(fetched.role, Role::Instructor);
  assert_eq!(fetched.code, "EMP1");
}

// ─── Catalog updates ─────────────────────────────────────────────────────────

#[tokio::test]
async fn term_update_is_revalidated_and_kept_unique() {
  let f = fixture().await;
  let term_id = f.class.term_id;
  f.store
    .create_term(NewTerm {
      name:       "Fall 2024".into(),
      start_date: d("2024-09-01"),
      end_date:   d("2024-12-20"),
    })
    .await
    .unwrap();

  let err = f
    .store
    .update_term(term_id, TermPatch { name: Some("Fall 2024".into()), ..Default::default() })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);

  let err = f
    .store
    .update_term(term_id, TermPatch { end_date: Some(d("2024-01-01")), ..Default::default() })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let renamed = f
    .store
    .update_term(term_id, TermPatch { name: Some(" Spring 2024 (A) ".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(renamed.name, "Spring 2024 (A)");
  assert_eq!(renamed.start_date, d("2024-02-01"));

  f.store.retire_term(term_id).await.unwrap();
  let err = f.store.update_term(term_id, TermPatch::default()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn course_code_stays_unique_on_update() {
  let f = fixture().await;
  let other = f
    .store
    .create_course(NewCourse {
      code:        "PHYS101".into(),
      name:        "Physics".into(),
      description: String::new(),
    })
    .await
    .unwrap();
  let err = f
    .store
    .update_course(other.course_id, CoursePatch {
      code: Some("MATH101".into()),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn moving_a_class_moves_its_enrollments() {
  let f = fixture().await;
  let e = f
    .store
    .enroll_student_in_class(f.student.student_id, enroll(&f.class, EnrollmentStatus::Active))
    .await
    .unwrap();
  let physics = f
    .store
    .create_course(NewCourse {
      code:        "PHYS101".into(),
      name:        "Physics".into(),
      description: String::new(),
    })
    .await
    .unwrap();

  let moved = f
    .store
    .update_course_class(f.class.course_class_id, CourseClassPatch {
      course_id: Some(physics.course_id),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(moved.course_id, physics.course_id);

  let fetched = f.store.get_enrollment(e.enrollment_id).await.unwrap().unwrap();
  assert_eq!(fetched.course_id, physics.course_id);
  assert_eq!(fetched.term_id, f.class.term_id);
}

#[tokio::test]
async fn class_update_checks_targets_and_codes() {
  let f = fixture().await;
  f.store
    .create_course_class(NewCourseClass {
      course_id: f.class.course_id,
      term_id:   f.class.term_id,
      code:      "B".into(),
    })
    .await
    .unwrap();

  let err = f
    .store
    .update_course_class(f.class.course_class_id, CourseClassPatch {
      code: Some("B".into()),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);

  let err = f
    .store
    .update_course_class(f.class.course_class_id, CourseClassPatch {
      term_id: Some(Uuid::new_v4()),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn student_update_normalizes_email_and_conflicts() {
  let f = fixture().await;
  let mary = f
    .store
    .create_student(NewStudent { first_name: "Mary".into(), ..student("mary@example.com") })
    .await
    .unwrap();

  let err = f
    .store
    .update_student(mary.student_id, StudentPatch {
      email: Some(" ADA@Example.com ".into()),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);

  let updated = f
    .store
    .update_student(mary.student_id, StudentPatch {
      email: Some("Mary.S@Example.com".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(updated.email, "mary.s@example.com");
  assert_eq!(updated.first_name, "Mary");
}

#[tokio::test]
async fn employee_update_keeps_employee_roles() {
  let f = fixture().await;
  let err = f
    .store
    .update_employee(f.instructor.employee_id, EmployeePatch {
      role: Some(Role::Student),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let other = f.store.create_employee(employee("EMP2")).await.unwrap();
  let err = f
    .store
    .update_employee(other.employee_id, EmployeePatch {
      code: Some("EMP1".into()),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);

  let promoted = f
    .store
    .update_employee(other.employee_id, EmployeePatch {
      role: Some(Role::TenantAdmin),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(promoted.role, Role::TenantAdmin);
}

// ─── Custodians and family ───────────────────────────────────────────────────

fn custodian(name: &str, relation: &str) -> NewCustodian {
  NewCustodian {
    name:     name.into(),
    relation: relation.into(),
    phone:    "+33 1 23 45 67 89".into(),
    email:    String::new(),
  }
}

#[tokio::test]
async fn custodian_is_unique_per_student_name_and_relation() {
  let f = fixture().await;
  let sid = f.student.student_id;
  let mother = f.store.add_custodian(sid, custodian("Marie Curie", "Mother")).await.unwrap();

  let err = f
    .store
    .add_custodian(sid, custodian(" Marie Curie ", "Mother"))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);

  // Same name, different relation.
  let guardian = f.store.add_custodian(sid, custodian("Marie Curie", "Guardian")).await.unwrap();
  let err = f
    .store
    .update_custodian(guardian.custodian_id, CustodianPatch {
      relation: Some("Mother".into()),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);

  f.store.retire_custodian(mother.custodian_id).await.unwrap();
  f.store.add_custodian(sid, custodian("Marie Curie", "Mother")).await.unwrap();
  assert_eq!(f.store.list_custodians(sid).await.unwrap().len(), 2);

  let retired = f.store.get_custodian(mother.custodian_id).await.unwrap().unwrap();
  assert!(retired.is_obsolete);
}

#[tokio::test]
async fn custodian_needs_live_student() {
  let f = fixture().await;
  let err = f
    .store
    .list_custodians(Uuid::new_v4())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let err = f
    .store
    .add_custodian(f.student.student_id, NewCustodian {
      email: "not-an-email".into(),
      ..custodian("Pierre Curie", "Father")
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  f.store.retire_student(f.student.student_id).await.unwrap();
  let err = f
    .store
    .add_custodian(f.student.student_id, custodian("Pierre Curie", "Father"))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn family_members_follow_their_employee() {
  let f = fixture().await;
  let emp = f.instructor.employee_id;
  let member = f
    .store
    .add_family_member(emp, NewFamilyMember { name: "Vincent".into(), relation: "Son".into() })
    .await
    .unwrap();

  let renamed = f
    .store
    .update_family_member(member.family_member_id, FamilyMemberPatch {
      name: Some("Vincent Hopper".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(renamed.relation, "Son");
  assert_eq!(f.store.list_family(emp).await.unwrap(), vec![renamed]);

  let err = f
    .store
    .add_family_member(emp, NewFamilyMember { name: " ".into(), relation: "Son".into() })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  f.store.retire_family_member(member.family_member_id).await.unwrap();
  assert!(f.store.list_family(emp).await.unwrap().is_empty());
  let err = f
    .store
    .update_family_member(member.family_member_id, FamilyMemberPatch::default())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let err = f.store.list_family(Uuid::new_v4()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ─── Career steps ────────────────────────────────────────────────────────────

fn career_step(start: &str, end: Option<&str>) -> NewCareerStep {
  NewCareerStep {
    start_date:      d(start),
    end_date:        end.map(d),
    function:        "Instructor".into(),
    salary:          Decimal::new(3_200_50, 2),
    competence_area: "Mathematics".into(),
  }
}

#[tokio::test]
async fn overlapping_career_step_conflicts() {
  let f = fixture().await;
  let emp = f.instructor.employee_id;
  f.store
    .add_career_step(emp, career_step("2020-01-01", Some("2020-06-01")))
    .await
    .unwrap();

  let err = f
    .store
    .add_career_step(emp, career_step("2020-05-01", None))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);

  let next = f
    .store
    .add_career_step(emp, career_step("2020-06-02", None))
    .await
    .unwrap();
  assert_eq!(next.salary, Decimal::new(3_200_50, 2));

  let steps = f.store.list_career_steps(emp).await.unwrap();
  assert_eq!(steps.len(), 2);
  assert_eq!(steps[0].start_date, d("2020-06-02"));
}

#[tokio::test]
async fn career_step_edit_is_checked_against_siblings() {
  let f = fixture().await;
  let emp = f.instructor.employee_id;
  let first = f
    .store
    .add_career_step(emp, career_step("2020-01-01", Some("2020-06-01")))
    .await
    .unwrap();
  f.store
    .add_career_step(emp, career_step("2020-07-01", None))
    .await
    .unwrap();

  // Extending within the gap only touches itself.
  let edited = f
    .store
    .update_career_step(first.career_step_id, CareerStepPatch {
      end_date: Some(Some(d("2020-06-30"))),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(edited.end_date, Some(d("2020-06-30")));

  // Opening the end runs into the later step.
  let err = f
    .store
    .update_career_step(first.career_step_id, CareerStepPatch {
      end_date: Some(None),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn career_step_rejects_inverted_dates_and_unknown_employee() {
  let f = fixture().await;
  let err = f
    .store
    .add_career_step(
      f.instructor.employee_id,
      career_step("2020-06-01", Some("2020-01-01")),
    )
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let err = f
    .store
    .add_career_step(Uuid::new_v4(), career_step("2020-01-01", None))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ─── Instructor assignment ───────────────────────────────────────────────────

#[tokio::test]
async fn assign_conflict_unassign_reassign() {
  let f = fixture().await;
  let class_id = f.class.course_class_id;

  let first = f.store.assign_instructor(class_id, assign(&f.instructor)).await.unwrap();
  assert_eq!(first.assigned_on, d("2024-03-15"));
  assert_eq!(first.exit_date, None);

  let err = f
    .store
    .assign_instructor(class_id, assign(&f.instructor))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);

  let ended = f
    .store
    .unassign_instructor(class_id, f.instructor.employee_id)
    .await
    .unwrap();
  assert_eq!(ended.assignment_id, first.assignment_id);
  assert_eq!(ended.exit_date, Some(d("2024-03-15")));
  assert!(f.store.active_instructors(class_id).await.unwrap().is_empty());

  // Same-day reassignment is a fresh record.
  let second = f.store.assign_instructor(class_id, assign(&f.instructor)).await.unwrap();
  assert_ne!(second.assignment_id, first.assignment_id);

  let history = f.store.class_assignments(class_id).await.unwrap();
  assert_eq!(history.len(), 2);
  let active = f.store.active_instructors(class_id).await.unwrap();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].assignment_id, second.assignment_id);
}

#[tokio::test]
async fn unassign_twice_is_not_found() {
  let f = fixture().await;
  let class_id = f.class.course_class_id;
  f.store.assign_instructor(class_id, assign(&f.instructor)).await.unwrap();
  f.store
    .unassign_instructor(class_id, f.instructor.employee_id)
    .await
    .unwrap();

  f.clock.advance(3);
  let err = f
    .store
    .unassign_instructor(class_id, f.instructor.employee_id)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  // The first exit date is untouched.
  let history = f.store.class_assignments(class_id).await.unwrap();
  assert_eq!(history[0].exit_date, Some(d("2024-03-15")));
}

#[tokio::test]
async fn unassign_before_start_is_invalid() {
  let f = fixture().await;
  let class_id = f.class.course_class_id;
  f.store
    .assign_instructor(class_id, AssignInstructor {
      instructor_id: f.instructor.employee_id,
      assigned_on:   Some(d("2024-04-01")),
    })
    .await
    .unwrap();

  let err = f
    .store
    .unassign_instructor(class_id, f.instructor.employee_id)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn assign_requires_live_subject_and_target() {
  let f = fixture().await;
  f.store.retire_employee(f.instructor.employee_id).await.unwrap();
  let err = f
    .store
    .assign_instructor(f.class.course_class_id, assign(&f.instructor))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let other = f.store.create_employee(employee("EMP2")).await.unwrap();
  let err = f
    .store
    .assign_instructor(Uuid::new_v4(), assign(&other))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn concurrent_assigns_admit_exactly_one() {
  let f = fixture().await;
  let class_id = f.class.course_class_id;

  let (a, b) = tokio::join!(
    f.store.assign_instructor(class_id, assign(&f.instructor)),
    f.store.assign_instructor(class_id, assign(&f.instructor)),
  );
  let results = [a, b];
  assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
  let err = results.into_iter().find_map(Result::err).unwrap();
  assert_eq!(err.kind(), ErrorKind::Conflict);
  assert_eq!(f.store.active_instructors(class_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn index_violation_surfaces_as_conflict() {
  let f = fixture().await;
  let insert = |id: Uuid| {
    format!(
      "INSERT INTO instructor_assignments
         (assignment_id, instructor_id, course_class_id, assigned_on, created_at, modified_at)
       VALUES ('{}', '{}', '{}', '2024-03-01',
               '2024-03-01T00:00:00+00:00', '2024-03-01T00:00:00+00:00');",
      encode_uuid(id),
      encode_uuid(f.instructor.employee_id),
      encode_uuid(f.class.course_class_id),
    )
  };

  f.store.execute_raw(insert(Uuid::new_v4())).await.unwrap();
  let err = f.store.execute_raw(insert(Uuid::new_v4())).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

// ─── Class enrollment ────────────────────────────────────────────────────────

#[tokio::test]
async fn enquired_then_active_keeps_one_row() {
  let f = fixture().await;
  let student_id = f.student.student_id;

  let first = f
    .store
    .enroll_student_in_class(student_id, enroll(&f.class, EnrollmentStatus::Enquired))
    .await
    .unwrap();
  let second = f
    .store
    .enroll_student_in_class(student_id, enroll(&f.class, EnrollmentStatus::Active))
    .await
    .unwrap();

  assert_eq!(first.enrollment_id, second.enrollment_id);
  assert_eq!(second.status, EnrollmentStatus::Active);
  assert_eq!(second.course_id, f.class.course_id);
  assert_eq!(second.term_id, f.class.term_id);

  let rows = f.store.student_enrollments(student_id).await.unwrap();
  assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn unenroll_closes_and_reenroll_reopens() {
  let f = fixture().await;
  let student_id = f.student.student_id;
  let class_id = f.class.course_class_id;

  f.store
    .enroll_student_in_class(student_id, enroll(&f.class, EnrollmentStatus::Active))
    .await
    .unwrap();
  let closed = f.store.unenroll_student_from_class(student_id, class_id).await.unwrap();
  assert_eq!(closed.status, EnrollmentStatus::Closed);

  let err = f
    .store
    .unenroll_student_from_class(student_id, class_id)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let reopened = f
    .store
    .enroll_student_in_class(student_id, enroll(&f.class, EnrollmentStatus::Active))
    .await
    .unwrap();
  assert_eq!(reopened.enrollment_id, closed.enrollment_id);
  assert_eq!(f.store.class_enrollments(class_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn strict_mode_rejects_open_record() {
  let f = fixture_with(ClassEnrollmentMode::Strict).await;
  let student_id = f.student.student_id;

  f.store
    .enroll_student_in_class(student_id, enroll(&f.class, EnrollmentStatus::Enquired))
    .await
    .unwrap();
  let err = f
    .store
    .enroll_student_in_class(student_id, enroll(&f.class, EnrollmentStatus::Active))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn enroll_rejects_closed_status() {
  let f = fixture().await;
  let err = f
    .store
    .enroll_student_in_class(f.student.student_id, enroll(&f.class, EnrollmentStatus::Closed))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn enroll_into_retired_class_is_not_found() {
  let f = fixture().await;
  f.store.retire_course_class(f.class.course_class_id).await.unwrap();
  let err = f
    .store
    .enroll_student_in_class(f.student.student_id, enroll(&f.class, EnrollmentStatus::Active))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn unenroll_by_retired_student_is_not_found() {
  let f = fixture().await;
  f.store
    .enroll_student_in_class(f.student.student_id, enroll(&f.class, EnrollmentStatus::Active))
    .await
    .unwrap();
  f.store.retire_student(f.student.student_id).await.unwrap();

  let err = f
    .store
    .unenroll_student_from_class(f.student.student_id, f.class.course_class_id)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let rows = f.store.student_enrollments(f.student.student_id).await.unwrap();
  assert_eq!(rows[0].status, EnrollmentStatus::Active);
}

// ─── Generic enrollment ──────────────────────────────────────────────────────

fn new_enrollment(f: &Fixture, status: EnrollmentStatus) -> NewEnrollment {
  NewEnrollment {
    student_id: f.student.student_id,
    course_class_id: f.class.course_class_id,
    status,
    comment: String::new(),
  }
}

#[tokio::test]
async fn second_create_for_pair_conflicts() {
  let f = fixture().await;
  f.store
    .create_enrollment(new_enrollment(&f, EnrollmentStatus::Active))
    .await
    .unwrap();
  let err = f
    .store
    .create_enrollment(new_enrollment(&f, EnrollmentStatus::Active))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);

  let err = f
    .store
    .create_enrollment(new_enrollment(&f, EnrollmentStatus::Enquired))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn update_rejects_duplicate_triple() {
  let f = fixture().await;
  let other_class = f
    .store
    .create_course_class(NewCourseClass {
      course_id: f.class.course_id,
      term_id:   f.class.term_id,
      code:      "B".into(),
    })
    .await
    .unwrap();

  f.store
    .create_enrollment(new_enrollment(&f, EnrollmentStatus::Active))
    .await
    .unwrap();
  let moving = f
    .store
    .create_enrollment(NewEnrollment {
      course_class_id: other_class.course_class_id,
      ..new_enrollment(&f, EnrollmentStatus::Active)
    })
    .await
    .unwrap();

  let err = f
    .store
    .update_enrollment(moving.enrollment_id, EnrollmentPatch {
      course_class_id: Some(f.class.course_class_id),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);

  let moved = f
    .store
    .update_enrollment(moving.enrollment_id, EnrollmentPatch {
      course_class_id: Some(f.class.course_class_id),
      status:          Some(EnrollmentStatus::Enquired),
      comment:         Some("waiting list".into()),
    })
    .await
    .unwrap();
  assert_eq!(moved.course_class_id, f.class.course_class_id);
  assert_eq!(moved.status, EnrollmentStatus::Enquired);
  assert_eq!(moved.comment, "waiting list");
}

#[tokio::test]
async fn close_is_unconditional() {
  let f = fixture().await;
  let e = f
    .store
    .create_enrollment(new_enrollment(&f, EnrollmentStatus::Enquired))
    .await
    .unwrap();

  let closed = f
    .store
    .close_enrollment(e.enrollment_id, Some("withdrew".into()))
    .await
    .unwrap();
  assert_eq!(closed.status, EnrollmentStatus::Closed);

  let again = f.store.close_enrollment(e.enrollment_id, None).await.unwrap();
  assert_eq!(again.status, EnrollmentStatus::Closed);
  assert_eq!(again.comment, "withdrew");

  let fetched = f.store.get_enrollment(e.enrollment_id).await.unwrap().unwrap();
  assert_eq!(fetched, again);
}

#[tokio::test]
async fn close_unknown_is_not_found() {
  let f = fixture().await;
  let err = f.store.close_enrollment(Uuid::new_v4(), None).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  assert!(f.store.get_enrollment(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn update_into_retired_or_unknown_class_is_not_found() {
  let f = fixture().await;
  let e = f
    .store
    .create_enrollment(new_enrollment(&f, EnrollmentStatus::Active))
    .await
    .unwrap();
  let retired = f
    .store
    .create_course_class(NewCourseClass {
      course_id: f.class.course_id,
      term_id:   f.class.term_id,
      code:      "B".into(),
    })
    .await
    .unwrap();
  f.store.retire_course_class(retired.course_class_id).await.unwrap();

  for target in [retired.course_class_id, Uuid::new_v4()] {
    let err = f
      .store
      .update_enrollment(e.enrollment_id, EnrollmentPatch {
        course_class_id: Some(target),
        ..Default::default()
      })
      .await
      .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
  }

  let unchanged = f.store.get_enrollment(e.enrollment_id).await.unwrap().unwrap();
  assert_eq!(unchanged, e);
}
