//! Error types for `perk-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::redemption::Rejection;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// Malformed or out-of-range input; the message is shown to the caller.
  #[error("{0}")]
  InvalidInput(String),

  #[error("user profile not found: {0}")]
  UserNotFound(Uuid),

  #[error("reward not found: {0}")]
  RewardNotFound(Uuid),

  #[error("campaign not found: {0}")]
  CampaignNotFound(Uuid),

  #[error("user {0} is already registered")]
  AlreadyRegistered(Uuid),

  /// A business rule refused the operation. Nothing was written.
  #[error("{0}")]
  Rejected(Rejection),

  /// A conditional write found the row changed since it was read.
  #[error("conflict: {0}")]
  Conflict(String),
}

impl From<Rejection> for Error {
  fn from(r: Rejection) -> Self { Self::Rejected(r) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by backend error types so that callers holding an opaque
/// store error can tell a domain failure apart from an infrastructure fault.
pub trait DomainError {
  /// The domain error this value carries, if any.
  fn domain(&self) -> Option<&Error>;
}

impl DomainError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}
