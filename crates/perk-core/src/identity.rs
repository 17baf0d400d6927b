//! The authenticated caller.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The identity established by the identity provider for one request.
///
/// The core trusts it and never re-derives it. Every store operation takes a
/// `Caller` explicitly and scopes its reads and writes to `user_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
  pub user_id: Uuid,
}

impl Caller {
  pub fn new(user_id: Uuid) -> Self { Self { user_id } }
}
