//! Campaigns: time-windowed announcements.
//!
//! Campaigns are display data. `bonus_points` is not applied by the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
  pub id:           Uuid,
  pub name:         String,
  pub description:  Option<String>,
  pub bonus_points: i64,
  pub start_date:   DateTime<Utc>,
  pub end_date:     DateTime<Utc>,
  pub is_active:    bool,
  pub created_at:   DateTime<Utc>,
}

impl Campaign {
  /// Whether the campaign is switched on and its window contains `now`.
  pub fn is_running_at(&self, now: DateTime<Utc>) -> bool {
    self.is_active && self.start_date <= now && now <= self.end_date
  }
}

/// Input to the catalog writer for campaigns.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCampaign {
  pub name:         String,
  #[serde(default)]
  pub description:  Option<String>,
  #[serde(default)]
  pub bonus_points: i64,
  pub start_date:   DateTime<Utc>,
  pub end_date:     DateTime<Utc>,
  #[serde(default = "default_active")]
  pub is_active:    bool,
}

fn default_active() -> bool { true }

impl NewCampaign {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::InvalidInput("campaign name is required".into()));
    }
    if self.end_date < self.start_date {
      return Err(Error::InvalidInput(
        "campaign end_date precedes start_date".into(),
      ));
    }
    Ok(())
  }
}
