//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure leaves the service as `{"error": "<message>"}`; business
//! rejections add a machine-readable `reason`.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use perk_core::{DomainError, redemption::Rejection};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("Unauthorized")]
  Unauthorized,

  #[error("{0}")]
  InvalidInput(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Rejected(Rejection),

  #[error("{0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error: domain failures keep their meaning, anything
  /// else becomes a 500.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + DomainError + Send + Sync + 'static,
  {
    match e.domain() {
      Some(domain) => domain.clone().into(),
      None => Self::Store(Box::new(e)),
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Unauthorized => StatusCode::UNAUTHORIZED,
      Self::InvalidInput(_) | Self::Rejected(_) => StatusCode::BAD_REQUEST,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<perk_core::Error> for ApiError {
  fn from(e: perk_core::Error) -> Self {
    use perk_core::Error as E;
    match e {
      E::InvalidInput(m) => Self::InvalidInput(m),
      E::UserNotFound(_) => Self::NotFound("User profile not found".into()),
      E::RewardNotFound(_) => Self::NotFound("Reward not found".into()),
      E::CampaignNotFound(_) => Self::NotFound("Campaign not found".into()),
      E::Rejected(r) => Self::Rejected(r),
      e @ (E::AlreadyRegistered(_) | E::Conflict(_)) => {
        Self::Conflict(e.to_string())
      }
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { Self::InvalidInput(r.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { Self::InvalidInput(r.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = match &self {
      ApiError::Rejected(r) => {
        tracing::warn!(reason = r.reason(), "request rejected");
        json!({ "error": r.to_string(), "reason": r.reason() })
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        json!({ "error": e.to_string() })
      }
      other => json!({ "error": other.to_string() }),
    };
    (status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  #[test]
  fn domain_errors_map_to_client_statuses() {
    let cases = [
      (perk_core::Error::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
      (perk_core::Error::RewardNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
      (
        perk_core::Error::Rejected(Rejection::OutOfStock),
        StatusCode::BAD_REQUEST,
      ),
      (perk_core::Error::AlreadyRegistered(Uuid::nil()), StatusCode::CONFLICT),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::store(err).status(), status);
    }
  }

  #[test]
  fn backend_faults_are_internal() {
    let err = perk_store_sqlite::Error::Decode("bad row".into());
    assert_eq!(
      ApiError::store(err).status(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }
}
