//! Error types for `roster-core`.
//!
//! Every variant here is a recoverable, caller-facing domain error. Storage
//! faults live in the backend crates and are classified through
//! [`StoreError`].

use strum::Display;
use thiserror::Error;
use uuid::Uuid;

/// The kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Entity {
  Term,
  Course,
  CourseClass,
  Employee,
  Student,
  Custodian,
  FamilyMember,
  CareerStep,
  InstructorAssignment,
  Enrollment,
}

#[derive(Debug, Error)]
pub enum Error {
  /// The referenced entity does not exist or has been retired.
  #[error("{entity} not found: {id}")]
  NotFound { entity: Entity, id: Uuid },

  /// A transition needs a currently-active record and there is none.
  #[error("no active {entity} for {subject} in {target}")]
  NoActiveRecord {
    entity:  Entity,
    subject: Uuid,
    target:  Uuid,
  },

  /// An active or duplicate record already occupies the key.
  #[error("conflict: {message}")]
  Conflict {
    message:  String,
    /// The record that blocks the write, when the engine knows it.
    existing: Option<Uuid>,
  },

  #[error("validation failed: {0}")]
  Validation(String),
}

impl Error {
  pub fn not_found(entity: Entity, id: Uuid) -> Self { Self::NotFound { entity, id } }

  pub fn conflict(message: impl Into<String>, existing: Option<Uuid>) -> Self {
    Self::Conflict { message: message.into(), existing }
  }

  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// Coarse classification used by outer layers to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  Conflict,
  Validation,
  /// A storage or infrastructure fault; not the caller's doing.
  Internal,
}

/// Implemented by every store error type so the API layer can classify
/// failures without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::NotFound { .. } | Error::NoActiveRecord { .. } => ErrorKind::NotFound,
      Error::Conflict { .. } => ErrorKind::Conflict,
      Error::Validation(_) => ErrorKind::Validation,
    }
  }
}
