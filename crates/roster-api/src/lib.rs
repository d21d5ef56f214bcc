//! JSON REST API for Roster.
//!
//! Exposes an axum [`Router`] backed by any [`roster_core::store::RosterStore`].
//! Identity and TLS are the caller's responsibility; the caller's role is
//! expected in the `x-roster-role` header and checked against
//! [`roster_core::policy::authorize`] by every handler.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", roster_api::api_router(store.clone()))
//! ```

pub mod assignments;
pub mod caller;
pub mod catalog;
pub mod enrollments;
pub mod error;
pub mod extract;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post},
};
use roster_core::store::RosterStore;

pub use caller::Caller;
pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RosterStore + 'static,
{
  Router::new()
    // Catalog
    .route("/terms", get(catalog::list_terms::<S>).post(catalog::create_term::<S>))
    .route(
      "/terms/{id}",
      get(catalog::get_term::<S>)
        .patch(catalog::update_term::<S>)
        .put(catalog::update_term::<S>),
    )
    .route("/terms/{id}/retire", post(catalog::retire_term::<S>))
    .route("/courses", get(catalog::list_courses::<S>).post(catalog::create_course::<S>))
    .route(
      "/courses/{id}",
      get(catalog::get_course::<S>)
        .patch(catalog::update_course::<S>)
        .put(catalog::update_course::<S>),
    )
    .route("/courses/{id}/retire", post(catalog::retire_course::<S>))
    .route("/classes", get(catalog::list_classes::<S>).post(catalog::create_class::<S>))
    .route(
      "/classes/{id}",
      get(catalog::get_class::<S>)
        .patch(catalog::update_class::<S>)
        .put(catalog::update_class::<S>),
    )
    .route("/classes/{id}/retire", post(catalog::retire_class::<S>))
    .route("/employees", get(catalog::list_employees::<S>).post(catalog::create_employee::<S>))
    .route(
      "/employees/{id}",
      get(catalog::get_employee::<S>)
        .patch(catalog::update_employee::<S>)
        .put(catalog::update_employee::<S>),
    )
    .route("/employees/{id}/retire", post(catalog::retire_employee::<S>))
    .route(
      "/employees/{id}/career",
      get(catalog::list_career::<S>).post(catalog::add_career_step::<S>),
    )
    .route("/career/{id}", patch(catalog::update_career_step::<S>))
    .route(
      "/employees/{id}/family",
      get(catalog::list_family::<S>).post(catalog::add_family_member::<S>),
    )
    .route("/family/{id}", patch(catalog::update_family_member::<S>))
    .route("/family/{id}/retire", post(catalog::retire_family_member::<S>))
    .route("/students", get(catalog::list_students::<S>).post(catalog::create_student::<S>))
    .route(
      "/students/{id}",
      get(catalog::get_student::<S>)
        .patch(catalog::update_student::<S>)
        .put(catalog::update_student::<S>),
    )
    .route("/students/{id}/retire", post(catalog::retire_student::<S>))
    .route(
      "/students/{id}/custodians",
      get(catalog::list_custodians::<S>).post(catalog::add_custodian::<S>),
    )
    .route(
      "/custodians/{id}",
      get(catalog::get_custodian::<S>).patch(catalog::update_custodian::<S>),
    )
    .route("/custodians/{id}/retire", post(catalog::retire_custodian::<S>))
    // Instructor assignment
    .route("/classes/{id}/assign-instructor", post(assignments::assign::<S>))
    .route("/classes/{id}/unassign-instructor", post(assignments::unassign::<S>))
    .route("/classes/{id}/instructors", get(assignments::list::<S>))
    // Class enrollment
    .route("/classes/{id}/enrolled-students", get(enrollments::of_class::<S>))
    .route("/students/{id}/enroll", post(enrollments::enroll::<S>))
    .route("/students/{id}/unenroll", post(enrollments::unenroll::<S>))
    .route("/students/{id}/enrollments", get(enrollments::of_student::<S>))
    // Generic enrollment
    .route("/enrollments", get(enrollments::list::<S>).post(enrollments::create::<S>))
    .route(
      "/enrollments/{id}",
      get(enrollments::get_one::<S>)
        .patch(enrollments::update::<S>)
        .delete(enrollments::delete),
    )
    .route("/enrollments/{id}/close", post(enrollments::close::<S>))
    .with_state(store)
}
