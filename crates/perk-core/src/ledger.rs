//! The ledger: immutable transactions and the planning half of the ledger
//! writer.
//!
//! A backend never computes a balance change itself. It reads the current
//! balance, asks [`plan_earn`] or [`plan_spend`] for a [`Posting`], and then
//! appends `posting.transaction` and stores `posting.balance_after` as one
//! unit. Keeping the arithmetic here means every backend agrees on flooring,
//! overflow, and the insufficient-funds rule.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, prelude::ToPrimitive as _};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Caller, Error, Result,
  redemption,
  user::User,
};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;
/// Upper bound on a single page.
pub const MAX_PAGE_SIZE: u32 = 1000;

// ─── Transaction ─────────────────────────────────────────────────────────────

/// What kind of balance-affecting event a transaction records.
///
/// `Expired` is reserved; nothing in this crate produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
  Earned,
  Spent,
  Expired,
}

impl TransactionType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Earned => "earned",
      Self::Spent => "spent",
      Self::Expired => "expired",
    }
  }
}

impl fmt::Display for TransactionType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for TransactionType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "earned" => Ok(Self::Earned),
      "spent" => Ok(Self::Spent),
      "expired" => Ok(Self::Expired),
      other => Err(Error::InvalidInput(format!(
        "unknown transaction type: {other:?}"
      ))),
    }
  }
}

/// An immutable fact about a user's balance. Never updated or deleted.
///
/// `amount` is positive for earned points and negative for spent ones, so the
/// sum over a user's transactions is their balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
  pub id:          Uuid,
  pub user_id:     Uuid,
  #[serde(rename = "type")]
  pub kind:        TransactionType,
  pub amount:      i64,
  pub description: String,
  pub created_at:  DateTime<Utc>,
}

/// A transaction together with the balance its owner has once it is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
  pub transaction:   Transaction,
  pub balance_after: i64,
}

/// The outcome of a ledger write: the appended transaction and the user row
/// as it reads afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
  pub transaction: Transaction,
  pub user:        User,
}

// ─── Earn ────────────────────────────────────────────────────────────────────

/// A validated request to earn points from a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarnRequest {
  raw_amount:  i64,
  description: Option<String>,
}

impl EarnRequest {
  /// Fails with `InvalidInput` unless `raw_amount` is positive.
  pub fn new(raw_amount: i64, description: Option<String>) -> Result<Self> {
    if raw_amount <= 0 {
      return Err(invalid_amount());
    }
    Ok(Self {
      raw_amount,
      description: description.filter(|d| !d.is_empty()),
    })
  }

  pub fn raw_amount(&self) -> i64 { self.raw_amount }

  /// The caller's description, or one naming the purchase amount.
  pub fn description(&self) -> String {
    self
      .description
      .clone()
      .unwrap_or_else(|| format!("Purchase of {}", self.raw_amount))
  }
}

/// `floor(raw_amount * multiplier)`. Points are never fractional.
pub fn earned_points(raw_amount: i64, multiplier: Decimal) -> Result<i64> {
  Decimal::from(raw_amount)
    .checked_mul(multiplier)
    .map(|p| p.floor())
    .and_then(|p| p.to_i64())
    .ok_or_else(invalid_amount)
}

/// Plan an `earned` transaction for `caller`, whose balance is currently
/// `balance`.
pub fn plan_earn(
  caller: Caller,
  request: &EarnRequest,
  balance: i64,
  multiplier: Decimal,
  at: DateTime<Utc>,
) -> Result<Posting> {
  let earned = earned_points(request.raw_amount, multiplier)?;
  let balance_after = balance.checked_add(earned).ok_or_else(invalid_amount)?;

  Ok(Posting {
    transaction: Transaction {
      id: Uuid::new_v4(),
      user_id: caller.user_id,
      kind: TransactionType::Earned,
      amount: earned,
      description: request.description(),
      created_at: at,
    },
    balance_after,
  })
}

// ─── Spend ───────────────────────────────────────────────────────────────────

/// Plan a `spent` transaction debiting `amount` from `balance`.
///
/// Rejects with [`redemption::Rejection::InsufficientPoints`] rather than produce a
/// negative balance.
pub fn plan_spend(
  caller: Caller,
  amount: i64,
  description: impl Into<String>,
  balance: i64,
  at: DateTime<Utc>,
) -> Result<Posting> {
  if amount <= 0 {
    return Err(Error::InvalidInput("spend amount must be positive".into()));
  }
  redemption::check_balance(Some(balance), amount)?;

  Ok(Posting {
    transaction: Transaction {
      id: Uuid::new_v4(),
      user_id: caller.user_id,
      kind: TransactionType::Spent,
      amount: -amount,
      description: description.into(),
      created_at: at,
    },
    balance_after: balance - amount,
  })
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::LoyaltyStore::list_transactions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionQuery {
  pub limit:  u32,
  pub offset: u32,
  /// Restrict to one transaction type. The count covers the filtered set.
  pub kind:   Option<TransactionType>,
}

impl Default for TransactionQuery {
  fn default() -> Self {
    Self { limit: DEFAULT_PAGE_SIZE, offset: 0, kind: None }
  }
}

impl TransactionQuery {
  /// `limit`, capped at [`MAX_PAGE_SIZE`].
  pub fn page_size(&self) -> u32 { self.limit.min(MAX_PAGE_SIZE) }
}

fn invalid_amount() -> Error { Error::InvalidInput("Invalid amount".into()) }
