//! User records as seen by the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, level::LoyaltyLevel};

/// An identity-bound account. `points` is the denormalised running balance;
/// it is only ever changed together with a ledger append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:               Uuid,
  pub email:            String,
  pub full_name:        Option<String>,
  pub points:           i64,
  pub loyalty_level_id: Option<Uuid>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

/// A user joined with their current level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
  #[serde(flatten)]
  pub user:  User,
  #[serde(rename = "loyalty_levels")]
  pub level: Option<LoyaltyLevel>,
}

/// Input to [`crate::store::LoyaltyStore::register`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
  #[serde(default)]
  pub full_name: Option<String>,
  pub email:     String,
}

impl NewUser {
  pub fn validate(&self) -> Result<()> {
    if self.email.trim().is_empty() {
      return Err(Error::InvalidInput("email is required".into()));
    }
    Ok(())
  }
}
