//! Caller-role extractor.
//!
//! Identity is established upstream; by the time a request reaches us the
//! caller's role travels in the `x-roster-role` header. A missing or
//! unrecognised role is rejected with 401 before any handler runs.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use roster_core::policy::{Action, Role, authorize};

use crate::error::ApiError;

pub const ROLE_HEADER: &str = "x-roster-role";

/// The role of the authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
  pub role: Role,
}

impl Caller {
  /// Fail with 403 unless the caller's role allows `action`.
  pub fn require(&self, action: Action) -> Result<(), ApiError> {
    if authorize(self.role, action) {
      Ok(())
    } else {
      tracing::debug!(role = %self.role, %action, "request denied");
      Err(ApiError::Forbidden(action))
    }
  }
}

/// Read the caller role from request headers.
pub fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, ApiError> {
  let role = headers
    .get(ROLE_HEADER)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.trim().parse::<Role>().ok())
    .ok_or(ApiError::Unauthorized)?;
  Ok(Caller { role })
}

impl<S> FromRequestParts<S> for Caller
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    caller_from_headers(&parts.headers)
  }
}
