//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that text order is chronological. Multipliers are
//! stored as decimal strings. UUIDs are stored as hyphenated lowercase strings.

use std::str::FromStr as _;

use chrono::{DateTime, SecondsFormat, Utc};
use perk_core::{
  campaign::Campaign,
  ledger::{Transaction, TransactionType},
  level::LoyaltyLevel,
  reward::{RedeemedReward, RedemptionStatus, Reward, RewardSummary, UserReward},
  user::User,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

pub fn encode_decimal(d: Decimal) -> String { d.normalize().to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

pub fn decode_kind(s: &str) -> Result<TransactionType> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown transaction kind: {s:?}")))
}

pub fn decode_status(s: &str) -> Result<RedemptionStatus> {
  RedemptionStatus::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown redemption status: {s:?}")))
}

// ─── Column lists ────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, email, full_name, points, \
                                loyalty_level_id, created_at, updated_at";

pub const LEVEL_COLUMNS: &str =
  "level_id, name, min_points, bonus_multiplier, description";

pub const TRANSACTION_COLUMNS: &str =
  "transaction_id, user_id, kind, amount, description, created_at";

pub const REWARD_COLUMNS: &str = "reward_id, name, description, points_cost, \
                                  image_url, is_available, stock, created_at";

pub const USER_REWARD_COLUMNS: &str =
  "user_reward_id, user_id, reward_id, status, redeemed_at";

/// Prefix every column in `columns` with a table alias, for joins.
pub fn qualified(columns: &str, alias: &str) -> String {
  columns
    .split(',')
    .map(|c| format!("{alias}.{}", c.trim()))
    .collect::<Vec<_>>()
    .join(", ")
}

pub const CAMPAIGN_COLUMNS: &str = "campaign_id, name, description, \
                                    bonus_points, start_date, end_date, \
                                    is_active, created_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:          String,
  pub email:            String,
  pub full_name:        Option<String>,
  pub points:           i64,
  pub loyalty_level_id: Option<String>,
  pub created_at:       String,
  pub updated_at:       String,
}

impl RawUser {
  /// Map a row selected with [`USER_COLUMNS`].
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:          row.get(0)?,
      email:            row.get(1)?,
      full_name:        row.get(2)?,
      points:           row.get(3)?,
      loyalty_level_id: row.get(4)?,
      created_at:       row.get(5)?,
      updated_at:       row.get(6)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:               decode_uuid(&self.user_id)?,
      email:            self.email,
      full_name:        self.full_name,
      points:           self.points,
      loyalty_level_id: self
        .loyalty_level_id
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `loyalty_levels` row.
pub struct RawLevel {
  pub level_id:         String,
  pub name:             String,
  pub min_points:       i64,
  pub bonus_multiplier: String,
  pub description:      Option<String>,
}

impl RawLevel {
  /// Map a row selected with [`LEVEL_COLUMNS`].
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      level_id:         row.get(0)?,
      name:             row.get(1)?,
      min_points:       row.get(2)?,
      bonus_multiplier: row.get(3)?,
      description:      row.get(4)?,
    })
  }

  pub fn into_level(self) -> Result<LoyaltyLevel> {
    Ok(LoyaltyLevel {
      id:               decode_uuid(&self.level_id)?,
      name:             self.name,
      min_points:       self.min_points,
      bonus_multiplier: decode_decimal(&self.bonus_multiplier)?,
      description:      self.description,
    })
  }
}

/// Raw values read directly from a `transactions` row.
pub struct RawTransaction {
  pub transaction_id: String,
  pub user_id:        String,
  pub kind:           String,
  pub amount:         i64,
  pub description:    String,
  pub created_at:     String,
}

impl RawTransaction {
  /// Map a row selected with [`TRANSACTION_COLUMNS`].
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      transaction_id: row.get(0)?,
      user_id:        row.get(1)?,
      kind:           row.get(2)?,
      amount:         row.get(3)?,
      description:    row.get(4)?,
      created_at:     row.get(5)?,
    })
  }

  pub fn into_transaction(self) -> Result<Transaction> {
    Ok(Transaction {
      id:          decode_uuid(&self.transaction_id)?,
      user_id:     decode_uuid(&self.user_id)?,
      kind:        decode_kind(&self.kind)?,
      amount:      self.amount,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `rewards` row.
pub struct RawReward {
  pub reward_id:    String,
  pub name:         String,
  pub description:  Option<String>,
  pub points_cost:  i64,
  pub image_url:    Option<String>,
  pub is_available: bool,
  pub stock:        Option<i64>,
  pub created_at:   String,
}

impl RawReward {
  /// Map a row selected with [`REWARD_COLUMNS`].
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      reward_id:    row.get(0)?,
      name:         row.get(1)?,
      description:  row.get(2)?,
      points_cost:  row.get(3)?,
      image_url:    row.get(4)?,
      is_available: row.get(5)?,
      stock:        row.get(6)?,
      created_at:   row.get(7)?,
    })
  }

  pub fn into_reward(self) -> Result<Reward> {
    Ok(Reward {
      id:           decode_uuid(&self.reward_id)?,
      name:         self.name,
      description:  self.description,
      points_cost:  self.points_cost,
      image_url:    self.image_url,
      is_available: self.is_available,
      stock:        self.stock,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `user_rewards` row.
pub struct RawUserReward {
  pub user_reward_id: String,
  pub user_id:        String,
  pub reward_id:      String,
  pub status:         String,
  pub redeemed_at:    String,
}

impl RawUserReward {
  /// Map a row selected with [`USER_REWARD_COLUMNS`].
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_reward_id: row.get(0)?,
      user_id:        row.get(1)?,
      reward_id:      row.get(2)?,
      status:         row.get(3)?,
      redeemed_at:    row.get(4)?,
    })
  }

  pub fn into_user_reward(self) -> Result<UserReward> {
    Ok(UserReward {
      id:          decode_uuid(&self.user_reward_id)?,
      user_id:     decode_uuid(&self.user_id)?,
      reward_id:   decode_uuid(&self.reward_id)?,
      status:      decode_status(&self.status)?,
      redeemed_at: decode_dt(&self.redeemed_at)?,
    })
  }
}

/// A `user_rewards` row joined with the fields of its reward.
pub struct RawRedeemedReward {
  // user_rewards columns
  pub user_reward:        RawUserReward,
  // rewards join
  pub reward_name:        String,
  pub reward_description: Option<String>,
  pub reward_points_cost: i64,
  pub reward_image_url:   Option<String>,
}

impl RawRedeemedReward {
  pub fn into_redeemed(self) -> Result<RedeemedReward> {
    Ok(RedeemedReward {
      user_reward: self.user_reward.into_user_reward()?,
      reward:      RewardSummary {
        name:        self.reward_name,
        description: self.reward_description,
        points_cost: self.reward_points_cost,
        image_url:   self.reward_image_url,
      },
    })
  }
}

/// Raw values read directly from a `campaigns` row.
pub struct RawCampaign {
  pub campaign_id:  String,
  pub name:         String,
  pub description:  Option<String>,
  pub bonus_points: i64,
  pub start_date:   String,
  pub end_date:     String,
  pub is_active:    bool,
  pub created_at:   String,
}

impl RawCampaign {
  /// Map a row selected with [`CAMPAIGN_COLUMNS`].
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      campaign_id:  row.get(0)?,
      name:         row.get(1)?,
      description:  row.get(2)?,
      bonus_points: row.get(3)?,
      start_date:   row.get(4)?,
      end_date:     row.get(5)?,
      is_active:    row.get(6)?,
      created_at:   row.get(7)?,
    })
  }

  pub fn into_campaign(self) -> Result<Campaign> {
    Ok(Campaign {
      id:           decode_uuid(&self.campaign_id)?,
      name:         self.name,
      description:  self.description,
      bonus_points: self.bonus_points,
      start_date:   decode_dt(&self.start_date)?,
      end_date:     decode_dt(&self.end_date)?,
      is_active:    self.is_active,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}
