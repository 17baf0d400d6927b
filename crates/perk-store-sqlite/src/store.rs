//! [`SqliteStore`], the SQLite implementation of [`LoyaltyStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use perk_core::{
  Caller,
  campaign::{Campaign, NewCampaign},
  ledger::{EarnRequest, LedgerEntry, Transaction, TransactionQuery},
  level::{LoyaltyLevel, NewLevel},
  redemption::Redemption,
  reward::{NewReward, RedeemedReward, Reward},
  store::{LoyaltyStore, Page},
  user::{NewUser, User, UserProfile},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    CAMPAIGN_COLUMNS, LEVEL_COLUMNS, REWARD_COLUMNS, RawCampaign, RawLevel,
    RawRedeemedReward, RawReward, RawTransaction, RawUserReward,
    TRANSACTION_COLUMNS, USER_REWARD_COLUMNS, encode_decimal, encode_dt,
    encode_uuid, qualified,
  },
  ledger,
  schema::SCHEMA,
  users,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Perk loyalty store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All clones
/// share one connection thread, which serialises every ledger write.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Catalog writers ───────────────────────────────────────────────────────

  /// Insert a loyalty level. Level names are unique.
  pub async fn add_level(&self, input: NewLevel) -> Result<LoyaltyLevel> {
    input.validate()?;
    let level = LoyaltyLevel {
      id:               Uuid::new_v4(),
      name:             input.name,
      min_points:       input.min_points,
      bonus_multiplier: input.bonus_multiplier,
      description:      input.description,
    };

    let id_str     = encode_uuid(level.id);
    let name       = level.name.clone();
    let min_points = level.min_points;
    let multiplier = encode_decimal(level.bonus_multiplier);
    let desc       = level.description.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO loyalty_levels
             (level_id, name, min_points, bonus_multiplier, description)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, min_points, multiplier, desc],
        )?;
        Ok(())
      })
      .await?;

    Ok(level)
  }

  /// Insert a reward into the catalog.
  pub async fn add_reward(&self, input: NewReward) -> Result<Reward> {
    input.validate()?;
    let reward = Reward {
      id:           Uuid::new_v4(),
      name:         input.name,
      description:  input.description,
      points_cost:  input.points_cost,
      image_url:    input.image_url,
      is_available: input.is_available,
      stock:        input.stock,
      created_at:   Utc::now(),
    };

    let id_str    = encode_uuid(reward.id);
    let name      = reward.name.clone();
    let desc      = reward.description.clone();
    let cost      = reward.points_cost;
    let image_url = reward.image_url.clone();
    let available = reward.is_available;
    let stock     = reward.stock;
    let at_str    = encode_dt(reward.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO rewards (
             reward_id, name, description, points_cost,
             image_url, is_available, stock, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str, name, desc, cost, image_url, available, stock, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(reward)
  }

  /// Insert a campaign.
  pub async fn add_campaign(&self, input: NewCampaign) -> Result<Campaign> {
    input.validate()?;
    let campaign = Campaign {
      id:           Uuid::new_v4(),
      name:         input.name,
      description:  input.description,
      bonus_points: input.bonus_points,
      start_date:   input.start_date,
      end_date:     input.end_date,
      is_active:    input.is_active,
      created_at:   Utc::now(),
    };

    let id_str    = encode_uuid(campaign.id);
    let name      = campaign.name.clone();
    let desc      = campaign.description.clone();
    let bonus     = campaign.bonus_points;
    let start_str = encode_dt(campaign.start_date);
    let end_str   = encode_dt(campaign.end_date);
    let active    = campaign.is_active;
    let at_str    = encode_dt(campaign.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO campaigns (
             campaign_id, name, description, bonus_points,
             start_date, end_date, is_active, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str, name, desc, bonus, start_str, end_str, active, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(campaign)
  }

  /// Sum of the caller's transaction amounts, which must equal their balance.
  pub async fn ledger_sum(&self, caller: Caller) -> Result<i64> {
    let id_str = encode_uuid(caller.user_id);
    let sum = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE user_id = ?1",
          rusqlite::params![id_str],
          |r| r.get::<_, i64>(0),
        )?)
      })
      .await?;
    Ok(sum)
  }
}

// ─── LoyaltyStore impl ───────────────────────────────────────────────────────

impl LoyaltyStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn get_profile(&self, caller: Caller) -> Result<Option<UserProfile>> {
    let profile = self
      .conn
      .call(move |conn| Ok(users::read_profile(conn, caller)))
      .await??;
    Ok(profile)
  }

  async fn register(&self, caller: Caller, input: NewUser) -> Result<User> {
    input.validate()?;
    let now = Utc::now();

    let user = self
      .conn
      .call(move |conn| Ok(users::register(conn, caller, &input, now)))
      .await??;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(user)
  }

  async fn update_profile(
    &self,
    caller: Caller,
    full_name: Option<String>,
  ) -> Result<User> {
    let now = Utc::now();
    let user = self
      .conn
      .call(move |conn| {
        Ok(users::update_full_name(conn, caller, full_name.as_deref(), now))
      })
      .await??;
    Ok(user)
  }

  // ── Ledger ────────────────────────────────────────────────────────────────

  async fn list_transactions(
    &self,
    caller: Caller,
    query: TransactionQuery,
  ) -> Result<Page<Transaction>> {
    let id_str   = encode_uuid(caller.user_id);
    let kind_str = query.kind.map(|k| k.as_str());
    let limit    = i64::from(query.page_size());
    let offset   = i64::from(query.offset);

    let (raws, count): (Vec<RawTransaction>, i64) = self
      .conn
      .call(move |conn| {
        // `?2 IS NULL` disables the type filter when none was given.
        let count: i64 = conn.query_row(
          "SELECT COUNT(*) FROM transactions
           WHERE user_id = ?1 AND (?2 IS NULL OR kind = ?2)",
          rusqlite::params![id_str, kind_str],
          |r| r.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {TRANSACTION_COLUMNS} FROM transactions
           WHERE user_id = ?1 AND (?2 IS NULL OR kind = ?2)
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?3 OFFSET ?4"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![id_str, kind_str, limit, offset],
            RawTransaction::read,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, count))
      })
      .await?;

    let data = raws
      .into_iter()
      .map(RawTransaction::into_transaction)
      .collect::<Result<_>>()?;

    Ok(Page { data, count: count.try_into().unwrap_or_default() })
  }

  async fn earn(
    &self,
    caller: Caller,
    request: EarnRequest,
  ) -> Result<LedgerEntry> {
    let entry = self
      .conn
      .call(move |conn| Ok(ledger::earn(conn, caller, &request)))
      .await??;
    Ok(entry)
  }

  async fn spend(
    &self,
    caller: Caller,
    amount: i64,
    description: String,
  ) -> Result<LedgerEntry> {
    let entry = self
      .conn
      .call(move |conn| Ok(ledger::spend(conn, caller, amount, description)))
      .await??;
    Ok(entry)
  }

  // ── Rewards ───────────────────────────────────────────────────────────────

  async fn list_rewards(&self) -> Result<Vec<Reward>> {
    let raws: Vec<RawReward> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REWARD_COLUMNS} FROM rewards
           WHERE is_available = 1
           ORDER BY points_cost ASC, rowid ASC"
        ))?;
        let rows = stmt
          .query_map([], RawReward::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReward::into_reward).collect()
  }

  async fn get_reward(&self, id: Uuid) -> Result<Option<Reward>> {
    let reward = self
      .conn
      .call(move |conn| Ok(ledger::read_reward(conn, id)))
      .await??;
    Ok(reward)
  }

  async fn redeem(&self, caller: Caller, reward_id: Uuid) -> Result<Redemption> {
    let redemption = self
      .conn
      .call(move |conn| Ok(ledger::redeem(conn, caller, reward_id)))
      .await??;
    Ok(redemption)
  }

  async fn list_my_rewards(&self, caller: Caller) -> Result<Vec<RedeemedReward>> {
    let id_str = encode_uuid(caller.user_id);

    let raws: Vec<RawRedeemedReward> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT
             {},
             r.name, r.description, r.points_cost, r.image_url
           FROM user_rewards ur
           JOIN rewards r ON r.reward_id = ur.reward_id
           WHERE ur.user_id = ?1
           ORDER BY ur.redeemed_at DESC, ur.rowid DESC",
          qualified(USER_REWARD_COLUMNS, "ur"),
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawRedeemedReward {
              user_reward:        RawUserReward::read(row)?,
              reward_name:        row.get(5)?,
              reward_description: row.get(6)?,
              reward_points_cost: row.get(7)?,
              reward_image_url:   row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRedeemedReward::into_redeemed).collect()
  }

  // ── Reference data ────────────────────────────────────────────────────────

  async fn list_active_campaigns(
    &self,
    now: DateTime<Utc>,
  ) -> Result<Vec<Campaign>> {
    let now_str = encode_dt(now);

    let raws: Vec<RawCampaign> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CAMPAIGN_COLUMNS} FROM campaigns
           WHERE is_active = 1 AND start_date <= ?1 AND end_date >= ?1
           ORDER BY start_date DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![now_str], RawCampaign::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut campaigns: Vec<Campaign> = raws
      .into_iter()
      .map(RawCampaign::into_campaign)
      .collect::<Result<_>>()?;
    campaigns.retain(|c| c.is_running_at(now));
    Ok(campaigns)
  }

  async fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCampaign> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {CAMPAIGN_COLUMNS} FROM campaigns
                 WHERE campaign_id = ?1 AND is_active = 1"
              ),
              rusqlite::params![id_str],
              RawCampaign::read,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCampaign::into_campaign).transpose()
  }

  async fn list_levels(&self) -> Result<Vec<LoyaltyLevel>> {
    let raws: Vec<RawLevel> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LEVEL_COLUMNS} FROM loyalty_levels ORDER BY min_points ASC"
        ))?;
        let rows = stmt
          .query_map([], RawLevel::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLevel::into_level).collect()
  }
}
