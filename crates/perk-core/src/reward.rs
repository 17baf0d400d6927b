//! Reward catalog items and the redemption records that claim them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A catalog item that can be bought with points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
  pub id:           Uuid,
  pub name:         String,
  pub description:  Option<String>,
  pub points_cost:  i64,
  pub image_url:    Option<String>,
  pub is_available: bool,
  /// Remaining units; `None` means unlimited.
  pub stock:        Option<i64>,
  pub created_at:   DateTime<Utc>,
}

/// Input to the catalog writer for rewards.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReward {
  pub name:         String,
  #[serde(default)]
  pub description:  Option<String>,
  pub points_cost:  i64,
  #[serde(default)]
  pub image_url:    Option<String>,
  #[serde(default = "default_available")]
  pub is_available: bool,
  #[serde(default)]
  pub stock:        Option<i64>,
}

fn default_available() -> bool { true }

impl NewReward {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::InvalidInput("reward name is required".into()));
    }
    if self.points_cost <= 0 {
      return Err(Error::InvalidInput("points_cost must be positive".into()));
    }
    if self.stock.is_some_and(|s| s < 0) {
      return Err(Error::InvalidInput("stock must not be negative".into()));
    }
    Ok(())
  }
}

/// Fulfilment state of a redemption. Only `Pending` is ever written by this
/// crate; later transitions belong to whoever fulfils rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedemptionStatus {
  #[default]
  Pending,
  Fulfilled,
  Cancelled,
}

impl RedemptionStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Fulfilled => "fulfilled",
      Self::Cancelled => "cancelled",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "pending" => Some(Self::Pending),
      "fulfilled" => Some(Self::Fulfilled),
      "cancelled" => Some(Self::Cancelled),
      _ => None,
    }
  }
}

/// One redemption of a reward by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserReward {
  pub id:          Uuid,
  pub user_id:     Uuid,
  pub reward_id:   Uuid,
  pub status:      RedemptionStatus,
  pub redeemed_at: DateTime<Utc>,
}

/// The reward fields shown next to a redemption in the caller's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSummary {
  pub name:        String,
  pub description: Option<String>,
  pub points_cost: i64,
  pub image_url:   Option<String>,
}

/// A redemption joined with its reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemedReward {
  #[serde(flatten)]
  pub user_reward: UserReward,
  #[serde(rename = "rewards")]
  pub reward:      RewardSummary,
}
