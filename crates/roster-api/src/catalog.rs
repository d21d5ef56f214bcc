//! Handlers for the catalog: terms, courses, classes, employees, students,
//! and the records hanging off people (career steps, family, custodians).
//!
//! | Method | Path | Action |
//! |--------|------|--------|
//! | `GET`/`POST` | `/terms`, `/courses`, `/classes` | read / write catalog |
//! | `GET`  | `/{collection}/{id}` | read catalog |
//! | `PATCH`/`PUT` | `/terms/{id}`, `/courses/{id}`, `/classes/{id}` | write catalog |
//! | `POST` | `/{collection}/{id}/retire` | write catalog |
//! | `GET`/`POST` | `/employees`, `PATCH`/`PUT`/retire `/employees/{id}` | read / manage staff |
//! | `GET`/`POST` | `/students`, `PATCH`/`PUT`/retire `/students/{id}` | read / manage students |
//! | `GET`/`POST` | `/employees/{id}/career`, `PATCH /career/{id}` | manage staff |
//! | `GET`/`POST` | `/employees/{id}/family`, `PATCH /family/{id}`, retire | manage staff |
//! | `GET`/`POST` | `/students/{id}/custodians`, `GET`/`PATCH /custodians/{id}`, retire | manage students |
//!
//! `PUT` takes the same partial body as `PATCH`; omitted fields keep their
//! stored value.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use roster_core::{
  catalog::{
    CareerStep, CareerStepPatch, Course, CourseClass, CourseClassPatch, CoursePatch, Custodian,
    CustodianPatch, Employee, EmployeePatch, FamilyMember, FamilyMemberPatch, NewCareerStep,
    NewCourse, NewCourseClass, NewCustodian, NewEmployee, NewFamilyMember, NewStudent, NewTerm,
    Student, StudentPatch, Term, TermPatch,
  },
  policy::Action,
  store::CatalogStore,
};
use uuid::Uuid;

use crate::{
  caller::Caller,
  error::ApiError,
  extract::{Json, Path},
};

fn missing(what: &str, id: Uuid) -> ApiError { ApiError::NotFound(format!("{what} {id} not found")) }

// ─── Terms ───────────────────────────────────────────────────────────────────

/// `GET /terms`
pub async fn list_terms<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
) -> Result<Json<Vec<Term>>, ApiError> {
  caller.require(Action::ReadCatalog)?;
  let terms = store.list_terms().await.map_err(ApiError::from_store)?;
  Ok(Json(terms))
}

/// `POST /terms`, returns 201 + the stored term.
pub async fn create_term<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Json(body): Json<NewTerm>,
) -> Result<impl IntoResponse, ApiError> {
  caller.require(Action::WriteCatalog)?;
  let term = store.create_term(body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(term)))
}

/// `GET /terms/{id}`
pub async fn get_term<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Term>, ApiError> {
  caller.require(Action::ReadCatalog)?;
  let term = store
    .get_term(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| missing("term", id))?;
  Ok(Json(term))
}

/// `PATCH /terms/{id}`; a renamed term must keep a unique name.
pub async fn update_term<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(patch): Json<TermPatch>,
) -> Result<Json<Term>, ApiError> {
  caller.require(Action::WriteCatalog)?;
  let term = store.update_term(id, patch).await.map_err(ApiError::from_store)?;
  Ok(Json(term))
}

/// `POST /terms/{id}/retire`
pub async fn retire_term<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Term>, ApiError> {
  caller.require(Action::WriteCatalog)?;
  let term = store.retire_term(id).await.map_err(ApiError::from_store)?;
  Ok(Json(term))
}

// ─── Courses ─────────────────────────────────────────────────────────────────

/// `GET /courses`
pub async fn list_courses<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
) -> Result<Json<Vec<Course>>, ApiError> {
  caller.require(Action::ReadCatalog)?;
  let courses = store.list_courses().await.map_err(ApiError::from_store)?;
  Ok(Json(courses))
}

/// `POST /courses`
pub async fn create_course<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Json(body): Json<NewCourse>,
) -> Result<impl IntoResponse, ApiError> {
  caller.require(Action::WriteCatalog)?;
  let course = store.create_course(body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(course)))
}

/// `GET /courses/{id}`
pub async fn get_course<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Course>, ApiError> {
  caller.require(Action::ReadCatalog)?;
  let course = store
    .get_course(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| missing("course", id))?;
  Ok(Json(course))
}

/// `PATCH /courses/{id}`
pub async fn update_course<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(patch): Json<CoursePatch>,
) -> Result<Json<Course>, ApiError> {
  caller.require(Action::WriteCatalog)?;
  let course = store.update_course(id, patch).await.map_err(ApiError::from_store)?;
  Ok(Json(course))
}

/// `POST /courses/{id}/retire`
pub async fn retire_course<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Course>, ApiError> {
  caller.require(Action::WriteCatalog)?;
  let course = store.retire_course(id).await.map_err(ApiError::from_store)?;
  Ok(Json(course))
}

// ─── Classes ─────────────────────────────────────────────────────────────────

/// `GET /classes`
pub async fn list_classes<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
) -> Result<Json<Vec<CourseClass>>, ApiError> {
  caller.require(Action::ReadCatalog)?;
  let classes = store.list_course_classes().await.map_err(ApiError::from_store)?;
  Ok(Json(classes))
}

/// `POST /classes`
pub async fn create_class<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Json(body): Json<NewCourseClass>,
) -> Result<impl IntoResponse, ApiError> {
  caller.require(Action::WriteCatalog)?;
  let class = store.create_course_class(body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(class)))
}

/// `GET /classes/{id}`
pub async fn get_class<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<CourseClass>, ApiError> {
  caller.require(Action::ReadCatalog)?;
  let class = store
    .get_course_class(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| missing("course class", id))?;
  Ok(Json(class))
}

/// `PATCH /classes/{id}`
pub async fn update_class<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(patch): Json<CourseClassPatch>,
) -> Result<Json<CourseClass>, ApiError> {
  caller.require(Action::WriteCatalog)?;
  let class = store
    .update_course_class(id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(class))
}

/// `POST /classes/{id}/retire`
pub async fn retire_class<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<CourseClass>, ApiError> {
  caller.require(Action::WriteCatalog)?;
  let class = store.retire_course_class(id).await.map_err(ApiError::from_store)?;
  Ok(Json(class))
}

// ─── Employees ───────────────────────────────────────────────────────────────

/// `GET /employees`
pub async fn list_employees<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
) -> Result<Json<Vec<Employee>>, ApiError> {
  caller.require(Action::ReadCatalog)?;
  let employees = store.list_employees().await.map_err(ApiError::from_store)?;
  Ok(Json(employees))
}

/// `POST /employees`
pub async fn create_employee<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Json(body): Json<NewEmployee>,
) -> Result<impl IntoResponse, ApiError> {
  caller.require(Action::ManageStaff)?;
  let employee = store.create_employee(body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(employee)))
}

/// `GET /employees/{id}`
pub async fn get_employee<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Employee>, ApiError> {
  caller.require(Action::ReadCatalog)?;
  let employee = store
    .get_employee(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| missing("employee", id))?;
  Ok(Json(employee))
}

/// `PATCH /employees/{id}`
pub async fn update_employee<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(patch): Json<EmployeePatch>,
) -> Result<Json<Employee>, ApiError> {
  caller.require(Action::ManageStaff)?;
  let employee = store.update_employee(id, patch).await.map_err(ApiError::from_store)?;
  Ok(Json(employee))
}

/// `POST /employees/{id}/retire`
pub async fn retire_employee<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Employee>, ApiError> {
  caller.require(Action::ManageStaff)?;
  let employee = store.retire_employee(id).await.map_err(ApiError::from_store)?;
  Ok(Json(employee))
}

// ── Career steps ─────────────────────────────────────────────────────────────

/// `GET /employees/{id}/career`, newest start first.
pub async fn list_career<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(employee_id): Path<Uuid>,
) -> Result<Json<Vec<CareerStep>>, ApiError> {
  caller.require(Action::ManageStaff)?;
  let steps = store
    .list_career_steps(employee_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(steps))
}

/// `POST /employees/{id}/career`
pub async fn add_career_step<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(employee_id): Path<Uuid>,
  Json(body): Json<NewCareerStep>,
) -> Result<impl IntoResponse, ApiError> {
  caller.require(Action::ManageStaff)?;
  let step = store
    .add_career_step(employee_id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(step)))
}

/// `PATCH /career/{id}`; `"end_date": null` reopens the step.
pub async fn update_career_step<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(step_id): Path<Uuid>,
  Json(patch): Json<CareerStepPatch>,
) -> Result<Json<CareerStep>, ApiError> {
  caller.require(Action::ManageStaff)?;
  let step = store
    .update_career_step(step_id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(step))
}

// ── Family ───────────────────────────────────────────────────────────────────

/// `GET /employees/{id}/family`
pub async fn list_family<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(employee_id): Path<Uuid>,
) -> Result<Json<Vec<FamilyMember>>, ApiError> {
  caller.require(Action::ManageStaff)?;
  let family = store.list_family(employee_id).await.map_err(ApiError::from_store)?;
  Ok(Json(family))
}

/// `POST /employees/{id}/family`
pub async fn add_family_member<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(employee_id): Path<Uuid>,
  Json(body): Json<NewFamilyMember>,
) -> Result<impl IntoResponse, ApiError> {
  caller.require(Action::ManageStaff)?;
  let member = store
    .add_family_member(employee_id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(member)))
}

/// `PATCH /family/{id}`
pub async fn update_family_member<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(patch): Json<FamilyMemberPatch>,
) -> Result<Json<FamilyMember>, ApiError> {
  caller.require(Action::ManageStaff)?;
  let member = store
    .update_family_member(id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(member))
}

/// `POST /family/{id}/retire`
pub async fn retire_family_member<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<FamilyMember>, ApiError> {
  caller.require(Action::ManageStaff)?;
  let member = store.retire_family_member(id).await.map_err(ApiError::from_store)?;
  Ok(Json(member))
}

// ─── Students ────────────────────────────────────────────────────────────────

/// `GET /students`
pub async fn list_students<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
) -> Result<Json<Vec<Student>>, ApiError> {
  caller.require(Action::ReadCatalog)?;
  let students = store.list_students().await.map_err(ApiError::from_store)?;
  Ok(Json(students))
}

/// `POST /students`
pub async fn create_student<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Json(body): Json<NewStudent>,
) -> Result<impl IntoResponse, ApiError> {
  caller.require(Action::ManageStudents)?;
  let student = store.create_student(body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(student)))
}

/// `GET /students/{id}`
pub async fn get_student<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Student>, ApiError> {
  caller.require(Action::ReadCatalog)?;
  let student = store
    .get_student(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| missing("student", id))?;
  Ok(Json(student))
}

/// `PATCH /students/{id}`
pub async fn update_student<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(patch): Json<StudentPatch>,
) -> Result<Json<Student>, ApiError> {
  caller.require(Action::ManageStudents)?;
  let student = store.update_student(id, patch).await.map_err(ApiError::from_store)?;
  Ok(Json(student))
}

/// `POST /students/{id}/retire`
pub async fn retire_student<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Student>, ApiError> {
  caller.require(Action::ManageStudents)?;
  let student = store.retire_student(id).await.map_err(ApiError::from_store)?;
  Ok(Json(student))
}

// ── Custodians ──────────────────────────────────────────────────────────────

/// `GET /students/{id}/custodians`
pub async fn list_custodians<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(student_id): Path<Uuid>,
) -> Result<Json<Vec<Custodian>>, ApiError> {
  caller.require(Action::ManageStudents)?;
  let custodians = store
    .list_custodians(student_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(custodians))
}

/// `POST /students/{id}/custodians`
pub async fn add_custodian<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(student_id): Path<Uuid>,
  Json(body): Json<NewCustodian>,
) -> Result<impl IntoResponse, ApiError> {
  caller.require(Action::ManageStudents)?;
  let custodian = store
    .add_custodian(student_id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(custodian)))
}

/// `GET /custodians/{id}`
pub async fn get_custodian<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Custodian>, ApiError> {
  caller.require(Action::ManageStudents)?;
  let custodian = store
    .get_custodian(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| missing("custodian", id))?;
  Ok(Json(custodian))
}

/// `PATCH /custodians/{id}`
pub async fn update_custodian<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(patch): Json<CustodianPatch>,
) -> Result<Json<Custodian>, ApiError> {
  caller.require(Action::ManageStudents)?;
  let custodian = store
    .update_custodian(id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(custodian))
}

/// `POST /custodians/{id}/retire`
pub async fn retire_custodian<S: CatalogStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Custodian>, ApiError> {
  caller.require(Action::ManageStudents)?;
  let custodian = store.retire_custodian(id).await.map_err(ApiError::from_store)?;
  Ok(Json(custodian))
}
