//! Catalog seeding from a JSON document.
//!
//! ```json
//! {
//!   "levels":    [{"name": "Diamond", "min_points": 50000, "bonus_multiplier": 3.0}],
//!   "rewards":   [{"name": "Coffee", "points_cost": 100, "stock": 50}],
//!   "campaigns": [{"name": "Spring", "bonus_points": 200,
//!                  "start_date": "2026-03-01T00:00:00Z",
//!                  "end_date": "2026-05-31T23:59:59Z"}]
//! }
//! ```
//!
//! Levels whose name already exists are skipped, so the default tiers can be
//! listed without conflict. Rewards and campaigns are always inserted.

use std::collections::HashSet;

use perk_core::{
  campaign::NewCampaign, level::NewLevel, reward::NewReward,
  store::LoyaltyStore as _,
};
use perk_store_sqlite::SqliteStore;
use serde::Deserialize;

/// A catalog document.
#[derive(Debug, Default, Deserialize)]
pub struct Catalog {
  #[serde(default)]
  pub levels:    Vec<NewLevel>,
  #[serde(default)]
  pub rewards:   Vec<NewReward>,
  #[serde(default)]
  pub campaigns: Vec<NewCampaign>,
}

/// How many catalog entries were written.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
  pub levels:    usize,
  pub rewards:   usize,
  pub campaigns: usize,
}

/// Write `catalog` into `store`.
pub async fn seed(
  store: &SqliteStore,
  catalog: Catalog,
) -> perk_store_sqlite::Result<SeedReport> {
  let mut report = SeedReport::default();

  let mut known: HashSet<String> = store
    .list_levels()
    .await?
    .into_iter()
    .map(|l| l.name)
    .collect();
  for level in catalog.levels {
    if !known.insert(level.name.clone()) {
      tracing::debug!(name = %level.name, "level exists, skipping");
      continue;
    }
    store.add_level(level).await?;
    report.levels += 1;
  }

  for reward in catalog.rewards {
    store.add_reward(reward).await?;
    report.rewards += 1;
  }

  for campaign in catalog.campaigns {
    store.add_campaign(campaign).await?;
    report.campaigns += 1;
  }

  tracing::info!(
    levels = report.levels,
    rewards = report.rewards,
    campaigns = report.campaigns,
    "catalog seeded"
  );
  Ok(report)
}
