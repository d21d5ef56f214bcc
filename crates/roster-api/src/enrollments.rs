//! Handlers for student enrollment, both the class-level enroll/unenroll
//! calls and the generic `/enrollments` resource.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/students/{id}/enroll` | Body: [`EnrollBody`]; upsert or strict per server mode; 201 |
//! | `POST` | `/students/{id}/unenroll` | Body: `{"course_class_id"}`; closes the active record |
//! | `GET`  | `/students/{id}/enrollments` | Newest first |
//! | `GET`  | `/classes/{id}/enrolled-students` | Every record of the class |
//! | `GET`  | `/enrollments?student_id=` | Same as the per-student listing |
//! | `POST` | `/enrollments` | Strict create, status defaults to `enquired`; 201 |
//! | `GET`  | `/enrollments/{id}` | |
//! | `PATCH` | `/enrollments/{id}` | Re-validated against the other records |
//! | `POST` | `/enrollments/{id}/close` | Optional body: `{"comment"?}`; always succeeds |
//! | `DELETE` | `/enrollments/{id}` | Always 400: records are closed, never deleted |

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use roster_core::{
  enrollment::{
    ClassEnrollment, Enrollment, EnrollmentPatch, EnrollmentStatus, NewEnrollment,
  },
  policy::Action,
  store::RosterStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  caller::Caller,
  error::ApiError,
  extract::{Json, Path, Query},
};

/// Status strings are accepted in any case; unknown values are a 400.
fn parse_status(raw: Option<&str>) -> Result<Option<EnrollmentStatus>, ApiError> {
  raw.map(EnrollmentStatus::parse).transpose().map_err(ApiError::from_store)
}

// ─── Class-level ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EnrollBody {
  pub course_class_id: Uuid,
  /// `active` or `enquired`; defaults to `active`.
  pub status:          Option<String>,
  pub comment:         Option<String>,
}

/// `POST /students/{id}/enroll`, returns 201 whether the record was created
/// or reused.
pub async fn enroll<S: RosterStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(student_id): Path<Uuid>,
  Json(body): Json<EnrollBody>,
) -> Result<impl IntoResponse, ApiError> {
  caller.require(Action::ManageEnrollments)?;
  let status = parse_status(body.status.as_deref())?.unwrap_or(EnrollmentStatus::Active);
  let enrollment = store
    .enroll_student_in_class(student_id, ClassEnrollment {
      course_class_id: body.course_class_id,
      status,
      comment: body.comment,
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(enrollment)))
}

#[derive(Debug, Deserialize)]
pub struct UnenrollBody {
  pub course_class_id: Uuid,
}

/// `POST /students/{id}/unenroll`
pub async fn unenroll<S: RosterStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(student_id): Path<Uuid>,
  Json(body): Json<UnenrollBody>,
) -> Result<Json<Enrollment>, ApiError> {
  caller.require(Action::ManageEnrollments)?;
  let enrollment = store
    .unenroll_student_from_class(student_id, body.course_class_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(enrollment))
}

/// `GET /students/{id}/enrollments`
pub async fn of_student<S: RosterStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(student_id): Path<Uuid>,
) -> Result<Json<Vec<Enrollment>>, ApiError> {
  caller.require(Action::ReadCatalog)?;
  let enrollments = store
    .student_enrollments(student_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(enrollments))
}

/// `GET /classes/{id}/enrolled-students`
pub async fn of_class<S: RosterStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(class_id): Path<Uuid>,
) -> Result<Json<Vec<Enrollment>>, ApiError> {
  caller.require(Action::ReadCatalog)?;
  let enrollments = store
    .class_enrollments(class_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(enrollments))
}

// ─── Generic resource ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Required: the student whose enrollments to return.
  pub student_id: Uuid,
}

/// `GET /enrollments?student_id=<id>`
pub async fn list<S: RosterStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Enrollment>>, ApiError> {
  caller.require(Action::ReadCatalog)?;
  let enrollments = store
    .student_enrollments(params.student_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(enrollments))
}

#[derive(Debug, Deserialize)]
pub struct NewEnrollmentBody {
  pub student_id:      Uuid,
  pub course_class_id: Uuid,
  pub status:          Option<String>,
  #[serde(default)]
  pub comment:         String,
}

/// `POST /enrollments`
pub async fn create<S: RosterStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Json(body): Json<NewEnrollmentBody>,
) -> Result<impl IntoResponse, ApiError> {
  caller.require(Action::ManageEnrollments)?;
  let status = parse_status(body.status.as_deref())?.unwrap_or_default();
  let enrollment = store
    .create_enrollment(NewEnrollment {
      student_id: body.student_id,
      course_class_id: body.course_class_id,
      status,
      comment: body.comment,
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(enrollment)))
}

/// `GET /enrollments/{id}`
pub async fn get_one<S: RosterStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Enrollment>, ApiError> {
  caller.require(Action::ReadCatalog)?;
  let enrollment = store
    .get_enrollment(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("enrollment {id} not found")))?;
  Ok(Json(enrollment))
}

#[derive(Debug, Deserialize)]
pub struct PatchBody {
  pub course_class_id: Option<Uuid>,
  pub status:          Option<String>,
  pub comment:         Option<String>,
}

/// `PATCH /enrollments/{id}`
pub async fn update<S: RosterStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  Json(body): Json<PatchBody>,
) -> Result<Json<Enrollment>, ApiError> {
  caller.require(Action::ManageEnrollments)?;
  let patch = EnrollmentPatch {
    course_class_id: body.course_class_id,
    status:          parse_status(body.status.as_deref())?,
    comment:         body.comment,
  };
  let enrollment = store
    .update_enrollment(id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(enrollment))
}

#[derive(Debug, Deserialize)]
pub struct CloseBody {
  pub comment: Option<String>,
}

/// `POST /enrollments/{id}/close`
pub async fn close<S: RosterStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  body: Option<Json<CloseBody>>,
) -> Result<Json<Enrollment>, ApiError> {
  caller.require(Action::ManageEnrollments)?;
  let comment = body.and_then(|Json(b)| b.comment);
  let enrollment = store
    .close_enrollment(id, comment)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(enrollment))
}

/// `DELETE /enrollments/{id}`
pub async fn delete(caller: Caller, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
  caller.require(Action::ManageEnrollments)?;
  Err(ApiError::BadRequest(format!(
    "enrollment {id} cannot be deleted; close it instead"
  )))
}
