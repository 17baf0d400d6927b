//! The checks of the redemption protocol.
//!
//! A redemption attempt runs, in order:
//!
//! 1. look the reward up (absent: `RewardNotFound`);
//! 2. [`check_reward`]: unavailable, then out of stock;
//! 3. [`check_balance`]: insufficient points;
//! 4. record a pending [`UserReward`], debit the ledger, decrement stock.
//!
//! The reward checks come first because they are the cheapest to answer.
//! Backends must run step 4 as one atomic unit; a rejection at any step leaves
//! no writes behind.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  ledger::Transaction,
  reward::{Reward, UserReward},
  user::User,
};

/// Why a redemption was refused. The caller may retry after acting on it.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
  #[error("Reward is not available")]
  Unavailable,
  #[error("Reward is out of stock")]
  OutOfStock,
  #[error("Insufficient points")]
  InsufficientPoints,
}

impl Rejection {
  /// Stable machine-readable reason.
  pub fn reason(self) -> &'static str {
    match self {
      Self::Unavailable => "unavailable",
      Self::OutOfStock => "out_of_stock",
      Self::InsufficientPoints => "insufficient_points",
    }
  }
}

/// Availability first, then stock.
pub fn check_reward(reward: &Reward) -> Result<(), Rejection> {
  if !reward.is_available {
    return Err(Rejection::Unavailable);
  }
  if reward.stock.is_some_and(|s| s <= 0) {
    return Err(Rejection::OutOfStock);
  }
  Ok(())
}

/// `points` is `None` when the caller has no profile row, which is treated as
/// having nothing to spend.
pub fn check_balance(points: Option<i64>, cost: i64) -> Result<(), Rejection> {
  match points {
    Some(p) if p >= cost => Ok(()),
    _ => Err(Rejection::InsufficientPoints),
  }
}

/// Description of the debit written for a redemption.
pub fn redemption_description(reward: &Reward) -> String {
  format!("Redeemed: {}", reward.name)
}

/// A completed redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
  #[serde(rename = "userReward")]
  pub user_reward: UserReward,
  pub transaction: Transaction,
  pub user:        User,
}
