//! The `LoyaltyStore` trait and supporting result types.
//!
//! The trait is implemented by storage backends (e.g. `perk-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Caller, DomainError,
  campaign::Campaign,
  ledger::{EarnRequest, LedgerEntry, Transaction, TransactionQuery},
  level::LoyaltyLevel,
  redemption::Redemption,
  reward::{RedeemedReward, Reward},
  user::{NewUser, User, UserProfile},
};

/// One page of results plus the size of the whole (filtered) result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
  pub data:  Vec<T>,
  pub count: u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Perk loyalty store backend.
///
/// Every method that touches user-owned rows takes the [`Caller`] and never
/// reads or writes rows belonging to another identity.
///
/// `earn`, `spend` and `redeem` are ledger writes. Each must apply all of its
/// writes or none of them, and must refuse (rather than overdraw) when the
/// balance or stock it checked has changed underneath it.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait LoyaltyStore: Send + Sync {
  type Error: std::error::Error + DomainError + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// The caller's user row joined with their level. `None` before
  /// registration.
  fn get_profile(
    &self,
    caller: Caller,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + '_;

  /// Create the caller's user row at the default level with zero points.
  fn register(
    &self,
    caller: Caller,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Change the caller's display name.
  fn update_profile(
    &self,
    caller: Caller,
    full_name: Option<String>,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  // ── Ledger ────────────────────────────────────────────────────────────

  /// A page of the caller's transactions, newest first.
  fn list_transactions(
    &self,
    caller: Caller,
    query: TransactionQuery,
  ) -> impl Future<Output = Result<Page<Transaction>, Self::Error>> + Send + '_;

  /// Credit `floor(amount * level multiplier)` points to the caller.
  fn earn(
    &self,
    caller: Caller,
    request: EarnRequest,
  ) -> impl Future<Output = Result<LedgerEntry, Self::Error>> + Send + '_;

  /// Debit `amount` points from the caller. Rejects with
  /// `insufficient_points` instead of driving the balance negative.
  fn spend(
    &self,
    caller: Caller,
    amount: i64,
    description: String,
  ) -> impl Future<Output = Result<LedgerEntry, Self::Error>> + Send + '_;

  // ── Rewards ───────────────────────────────────────────────────────────

  /// Available rewards, cheapest first.
  fn list_rewards(
    &self,
  ) -> impl Future<Output = Result<Vec<Reward>, Self::Error>> + Send + '_;

  fn get_reward(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Reward>, Self::Error>> + Send + '_;

  /// Run the redemption protocol for `reward_id` on behalf of the caller.
  fn redeem(
    &self,
    caller: Caller,
    reward_id: Uuid,
  ) -> impl Future<Output = Result<Redemption, Self::Error>> + Send + '_;

  /// The caller's redemptions, newest first.
  fn list_my_rewards(
    &self,
    caller: Caller,
  ) -> impl Future<Output = Result<Vec<RedeemedReward>, Self::Error>> + Send + '_;

  // ── Reference data ────────────────────────────────────────────────────

  /// Active campaigns whose window contains `now`, latest start first.
  fn list_active_campaigns(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Campaign>, Self::Error>> + Send + '_;

  /// A single active campaign.
  fn get_campaign(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Campaign>, Self::Error>> + Send + '_;

  /// All levels, lowest threshold first.
  fn list_levels(
    &self,
  ) -> impl Future<Output = Result<Vec<LoyaltyLevel>, Self::Error>> + Send + '_;
}
