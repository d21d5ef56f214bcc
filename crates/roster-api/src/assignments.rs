//! Handlers for instructor assignment.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/classes/{id}/assign-instructor` | Body: `{"instructor_id", "assigned_on"?}`; 201 |
//! | `POST` | `/classes/{id}/unassign-instructor` | Body: `{"instructor_id"}` |
//! | `GET`  | `/classes/{id}/instructors` | Active today; `?include_inactive=true` for history |

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use roster_core::{
  enrollment::{AssignInstructor, InstructorAssignment},
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

/// `POST /classes/{id}/assign-instructor`
pub async fn assign<S: RosterStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(class_id): Path<Uuid>,
  Json(body): Json<AssignInstructor>,
) -> Result<impl IntoResponse, ApiError> {
  caller.require(Action::AssignInstructors)?;
  let assignment = store
    .assign_instructor(class_id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(assignment)))
}

#[derive(Debug, Deserialize)]
pub struct UnassignBody {
  pub instructor_id: Uuid,
}

/// `POST /classes/{id}/unassign-instructor`
pub async fn unassign<S: RosterStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(class_id): Path<Uuid>,
  Json(body): Json<UnassignBody>,
) -> Result<Json<InstructorAssignment>, ApiError> {
  caller.require(Action::AssignInstructors)?;
  let assignment = store
    .unassign_instructor(class_id, body.instructor_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(assignment))
}

#[derive(Debug, Deserialize)]
pub struct InstructorParams {
  #[serde(default)]
  pub include_inactive: bool,
}

/// `GET /classes/{id}/instructors[?include_inactive=true]`
pub async fn list<S: RosterStore>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(class_id): Path<Uuid>,
  Query(params): Query<InstructorParams>,
) -> Result<Json<Vec<InstructorAssignment>>, ApiError> {
  caller.require(Action::ReadCatalog)?;
  let assignments = if params.include_inactive {
    store.class_assignments(class_id).await
  } else {
    store.active_instructors(class_id).await
  }
  .map_err(ApiError::from_store)?;
  Ok(Json(assignments))
}
