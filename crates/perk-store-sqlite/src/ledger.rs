//! The atomic ledger units.
//!
//! Each public function here runs on the store's connection thread and wraps
//! its reads and writes in one `BEGIN IMMEDIATE` transaction, which takes the
//! database write lock up front. A rejection or error returns before
//! `commit`, and dropping the transaction rolls every write back.
//!
//! Balance and stock writes are additionally conditional on the value that
//! was read, so a writer that raced past the lock would be refused rather
//! than overdraw.

use chrono::{DateTime, Utc};
use perk_core::{
  Caller, Error as CoreError,
  ledger::{self, EarnRequest, LedgerEntry, Posting},
  level,
  redemption::{self, Redemption, Rejection},
  reward::{RedemptionStatus, Reward, UserReward},
  user::User,
};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use tracing::info;
use uuid::Uuid;

use crate::{
  Result,
  encode::{RawReward, REWARD_COLUMNS, encode_dt, encode_uuid},
  users::{self, read_user},
};

// ─── Units ───────────────────────────────────────────────────────────────────

/// Credit the caller with points for a purchase.
pub fn earn(
  conn: &mut Connection,
  caller: Caller,
  request: &EarnRequest,
) -> Result<LedgerEntry> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let user = read_user(&tx, caller.user_id)?
    .ok_or(CoreError::UserNotFound(caller.user_id))?;
  let level = users::level_of(&tx, &user)?;
  let multiplier = level::bonus_multiplier(level.as_ref());

  let posting =
    ledger::plan_earn(caller, request, user.points, multiplier, Utc::now())?;
  let user = apply_posting(&tx, user.points, &posting)?;
  tx.commit()?;

  info!(
    user_id = %caller.user_id,
    amount = posting.transaction.amount,
    balance = user.points,
    "points earned"
  );
  Ok(LedgerEntry { transaction: posting.transaction, user })
}

/// Debit the caller. Rejects rather than drive the balance negative.
pub fn spend(
  conn: &mut Connection,
  caller: Caller,
  amount: i64,
  description: String,
) -> Result<LedgerEntry> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let balance = read_user(&tx, caller.user_id)?
    .ok_or(CoreError::UserNotFound(caller.user_id))?
    .points;
  let (posting, user) = debit(&tx, caller, balance, amount, description)?;
  tx.commit()?;

  info!(
    user_id = %caller.user_id,
    amount = posting.transaction.amount,
    balance = user.points,
    "points spent"
  );
  Ok(LedgerEntry { transaction: posting.transaction, user })
}

/// Run the redemption protocol for one reward.
pub fn redeem(
  conn: &mut Connection,
  caller: Caller,
  reward_id: Uuid,
) -> Result<Redemption> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let reward =
    read_reward(&tx, reward_id)?.ok_or(CoreError::RewardNotFound(reward_id))?;
  redemption::check_reward(&reward)?;

  let balance = read_user(&tx, caller.user_id)?.map(|u| u.points);
  redemption::check_balance(balance, reward.points_cost)?;
  let balance = balance.unwrap_or_default();

  let now = Utc::now();
  let user_reward = insert_user_reward(&tx, caller, reward.id, now)?;
  let (posting, user) = debit(
    &tx,
    caller,
    balance,
    reward.points_cost,
    redemption::redemption_description(&reward),
  )?;
  if reward.stock.is_some() {
    decrement_stock(&tx, &reward)?;
  }
  tx.commit()?;

  info!(
    user_id = %caller.user_id,
    reward_id = %reward.id,
    cost = reward.points_cost,
    balance = user.points,
    "reward redeemed"
  );
  Ok(Redemption { user_reward, transaction: posting.transaction, user })
}

// ─── Steps ───────────────────────────────────────────────────────────────────

fn debit(
  conn: &Connection,
  caller: Caller,
  balance: i64,
  amount: i64,
  description: String,
) -> Result<(Posting, User)> {
  let posting =
    ledger::plan_spend(caller, amount, description, balance, Utc::now())?;
  let user = apply_posting(conn, balance, &posting)?;
  Ok((posting, user))
}

/// Append the posting's transaction and move the balance from
/// `balance_before` to `posting.balance_after`.
fn apply_posting(
  conn: &Connection,
  balance_before: i64,
  posting: &Posting,
) -> Result<User> {
  let t = &posting.transaction;
  conn.execute(
    "INSERT INTO transactions (
       transaction_id, user_id, kind, amount, description, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      encode_uuid(t.id),
      encode_uuid(t.user_id),
      t.kind.as_str(),
      t.amount,
      t.description,
      encode_dt(t.created_at),
    ],
  )?;

  let changed = conn.execute(
    "UPDATE users SET points = ?1, updated_at = ?2
     WHERE user_id = ?3 AND points = ?4",
    rusqlite::params![
      posting.balance_after,
      encode_dt(t.created_at),
      encode_uuid(t.user_id),
      balance_before,
    ],
  )?;
  if changed != 1 {
    return Err(
      CoreError::Conflict(format!(
        "balance of user {} changed during the write",
        t.user_id
      ))
      .into(),
    );
  }

  read_user(conn, t.user_id)?
    .ok_or_else(|| CoreError::UserNotFound(t.user_id).into())
}

fn insert_user_reward(
  conn: &Connection,
  caller: Caller,
  reward_id: Uuid,
  at: DateTime<Utc>,
) -> Result<UserReward> {
  let user_reward = UserReward {
    id: Uuid::new_v4(),
    user_id: caller.user_id,
    reward_id,
    status: RedemptionStatus::Pending,
    redeemed_at: at,
  };
  conn.execute(
    "INSERT INTO user_rewards (
       user_reward_id, user_id, reward_id, status, redeemed_at
     ) VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      encode_uuid(user_reward.id),
      encode_uuid(user_reward.user_id),
      encode_uuid(user_reward.reward_id),
      user_reward.status.as_str(),
      encode_dt(user_reward.redeemed_at),
    ],
  )?;
  Ok(user_reward)
}

/// Decrement-if-positive; zero rows changed means the last unit is gone.
fn decrement_stock(conn: &Connection, reward: &Reward) -> Result<()> {
  let changed = conn.execute(
    "UPDATE rewards SET stock = stock - 1
     WHERE reward_id = ?1 AND stock > 0",
    rusqlite::params![encode_uuid(reward.id)],
  )?;
  if changed != 1 {
    return Err(Rejection::OutOfStock.into());
  }
  Ok(())
}

// ─── Reads ───────────────────────────────────────────────────────────────────

pub fn read_reward(conn: &Connection, id: Uuid) -> Result<Option<Reward>> {
  conn
    .query_row(
      &format!("SELECT {REWARD_COLUMNS} FROM rewards WHERE reward_id = ?1"),
      rusqlite::params![encode_uuid(id)],
      RawReward::read,
    )
    .optional()?
    .map(RawReward::into_reward)
    .transpose()
}
