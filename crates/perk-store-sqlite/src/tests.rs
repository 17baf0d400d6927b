//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use perk_core::{
  Caller, Error as CoreError,
  campaign::NewCampaign,
  ledger::{EarnRequest, TransactionQuery, TransactionType},
  level::NewLevel,
  redemption::Rejection,
  reward::{NewReward, RedemptionStatus},
  store::LoyaltyStore,
  user::NewUser,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_user(email: &str) -> NewUser {
  NewUser { full_name: Some("Alice Liddell".into()), email: email.into() }
}

async fn registered(s: &SqliteStore) -> Caller {
  let caller = Caller::new(Uuid::new_v4());
  s.register(caller, new_user("alice@example.com")).await.unwrap();
  caller
}

async fn earn(s: &SqliteStore, caller: Caller, amount: i64) -> i64 {
  s.earn(caller, EarnRequest::new(amount, None).unwrap())
    .await
    .unwrap()
    .user
    .points
}

fn reward(cost: i64, stock: Option<i64>) -> NewReward {
  NewReward {
    name:         "Coffee".into(),
    description:  Some("A free coffee".into()),
    points_cost:  cost,
    image_url:    None,
    is_available: true,
    stock,
  }
}

fn rejection(err: Error) -> Option<Rejection> {
  match err {
    Error::Core(CoreError::Rejected(r)) => Some(r),
    _ => None,
  }
}

async fn assert_ledger_consistent(s: &SqliteStore, caller: Caller) {
  let profile = s.get_profile(caller).await.unwrap().unwrap();
  assert_eq!(s.ledger_sum(caller).await.unwrap(), profile.user.points);
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_starts_at_bronze_with_zero_points() {
  let s = store().await;
  let caller = registered(&s).await;

  let profile = s.get_profile(caller).await.unwrap().unwrap();
  assert_eq!(profile.user.points, 0);
  assert_eq!(profile.user.email, "alice@example.com");
  let level = profile.level.expect("default level");
  assert_eq!(level.name, "Bronze");
  assert_eq!(level.bonus_multiplier, Decimal::ONE);
}

#[tokio::test]
async fn profile_before_registration_is_none() {
  let s = store().await;
  let result = s.get_profile(Caller::new(Uuid::new_v4())).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn registering_twice_conflicts() {
  let s = store().await;
  let caller = registered(&s).await;
  let err = s.register(caller, new_user("again@example.com")).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::AlreadyRegistered(id)) if id == caller.user_id));
}

#[tokio::test]
async fn update_profile_changes_name_only() {
  let s = store().await;
  let caller = registered(&s).await;
  earn(&s, caller, 20).await;

  let user = s
    .update_profile(caller, Some("Alice Kingsleigh".into()))
    .await
    .unwrap();
  assert_eq!(user.full_name.as_deref(), Some("Alice Kingsleigh"));
  assert_eq!(user.points, 20);
}

#[tokio::test]
async fn update_profile_of_unknown_user_is_not_found() {
  let s = store().await;
  let err = s
    .update_profile(Caller::new(Uuid::new_v4()), None)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::UserNotFound(_))));
}

// ─── Earn ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn earn_at_bronze_credits_raw_amount() {
  let s = store().await;
  let caller = registered(&s).await;

  let entry = s
    .earn(caller, EarnRequest::new(120, None).unwrap())
    .await
    .unwrap();
  assert_eq!(entry.transaction.kind, TransactionType::Earned);
  assert_eq!(entry.transaction.amount, 120);
  assert_eq!(entry.transaction.description, "Purchase of 120");
  assert_eq!(entry.user.points, 120);
  assert_ledger_consistent(&s, caller).await;
}

#[tokio::test]
async fn earn_applies_and_floors_level_multiplier() {
  let s = store().await;
  let caller = registered(&s).await;
  s.add_level(NewLevel {
    name:             "Gold+".into(),
    min_points:       0,
    bonus_multiplier: Decimal::new(15, 1),
    description:      None,
  })
  .await
  .unwrap();

  // Move the user onto the new level directly; promotion is not a store
  // operation.
  let level = s
    .list_levels()
    .await
    .unwrap()
    .into_iter()
    .find(|l| l.name == "Gold+")
    .unwrap();
  let user_id = caller.user_id.hyphenated().to_string();
  let level_id = level.id.hyphenated().to_string();
  s.conn
    .call(move |conn| {
      conn.execute(
        "UPDATE users SET loyalty_level_id = ?1 WHERE user_id = ?2",
        rusqlite::params![level_id, user_id],
      )?;
      Ok(())
    })
    .await
    .unwrap();

  assert_eq!(earn(&s, caller, 10).await, 15);
  assert_eq!(earn(&s, caller, 7).await, 25);
  assert_ledger_consistent(&s, caller).await;
}

#[tokio::test]
async fn earn_without_profile_is_not_found() {
  let s = store().await;
  let err = s
    .earn(Caller::new(Uuid::new_v4()), EarnRequest::new(10, None).unwrap())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::UserNotFound(_))));
}

// ─── Spend ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn spend_debits_and_records_negative_amount() {
  let s = store().await;
  let caller = registered(&s).await;
  earn(&s, caller, 50).await;

  let entry = s.spend(caller, 20, "Gift".into()).await.unwrap();
  assert_eq!(entry.transaction.kind, TransactionType::Spent);
  assert_eq!(entry.transaction.amount, -20);
  assert_eq!(entry.user.points, 30);
  assert_ledger_consistent(&s, caller).await;
}

#[tokio::test]
async fn overspend_is_rejected_without_writes() {
  let s = store().await;
  let caller = registered(&s).await;
  earn(&s, caller, 5).await;

  let err = s.spend(caller, 10, "Gift".into()).await.unwrap_err();
  assert_eq!(rejection(err), Some(Rejection::InsufficientPoints));

  let page = s
    .list_transactions(caller, TransactionQuery::default())
    .await
    .unwrap();
  assert_eq!(page.count, 1);
  assert_ledger_consistent(&s, caller).await;
}

#[tokio::test]
async fn concurrent_spends_never_overdraw() {
  let s = store().await;
  let caller = registered(&s).await;
  earn(&s, caller, 100).await;

  let mut handles = Vec::new();
  for _ in 0..5 {
    let s = s.clone();
    handles.push(tokio::spawn(async move {
      s.spend(caller, 30, "Race".into()).await
    }));
  }

  let mut succeeded = 0;
  for h in handles {
    match h.await.unwrap() {
      Ok(_) => succeeded += 1,
      Err(e) => assert_eq!(rejection(e), Some(Rejection::InsufficientPoints)),
    }
  }

  assert_eq!(succeeded, 3);
  let profile = s.get_profile(caller).await.unwrap().unwrap();
  assert_eq!(profile.user.points, 10);
  assert_ledger_consistent(&s, caller).await;
}

#[tokio::test]
async fn writers_on_separate_connections_never_overdraw() {
  let dir = tempfile::TempDir::new().unwrap();
  let path = dir.path().join("perk.db");
  let a = SqliteStore::open(&path).await.unwrap();
  let b = SqliteStore::open(&path).await.unwrap();

  let caller = registered(&a).await;
  earn(&a, caller, 100).await;
  let reward = a
    .add_reward(NewReward {
      name:         "Mug".into(),
      description:  None,
      points_cost:  10,
      image_url:    None,
      is_available: true,
      stock:        Some(1),
    })
    .await
    .unwrap();

  let mut spends = Vec::new();
  for i in 0..6 {
    let s = if i % 2 == 0 { a.clone() } else { b.clone() };
    spends.push(tokio::spawn(async move {
      s.spend(caller, 30, "Race".into()).await
    }));
  }
  let mut succeeded = 0;
  for h in spends {
    match h.await.unwrap() {
      Ok(_) => succeeded += 1,
      Err(e) => assert_eq!(rejection(e), Some(Rejection::InsufficientPoints)),
    }
  }
  assert_eq!(succeeded, 3);

  let first = a.redeem(caller, reward.id).await;
  let second = b.redeem(caller, reward.id).await;
  assert!(first.is_ok());
  assert_eq!(rejection(second.unwrap_err()), Some(Rejection::OutOfStock));

  let profile = b.get_profile(caller).await.unwrap().unwrap();
  assert_eq!(profile.user.points, 0);
  assert_eq!(b.get_reward(reward.id).await.unwrap().unwrap().stock, Some(0));
  assert_ledger_consistent(&a, caller).await;
  assert_ledger_consistent(&b, caller).await;
}

// ─── Transactions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn transactions_paginate_with_total_count() {
  let s = store().await;
  let caller = registered(&s).await;
  for amount in 1..=15 {
    earn(&s, caller, amount).await;
  }

  let first = s
    .list_transactions(caller, TransactionQuery { limit: 10, offset: 0, kind: None })
    .await
    .unwrap();
  assert_eq!(first.data.len(), 10);
  assert_eq!(first.count, 15);
  // Newest first.
  assert_eq!(first.data[0].amount, 15);

  let rest = s
    .list_transactions(caller, TransactionQuery { limit: 10, offset: 10, kind: None })
    .await
    .unwrap();
  assert_eq!(rest.data.len(), 5);
  assert_eq!(rest.count, 15);
  assert_eq!(rest.data[4].amount, 1);
}

#[tokio::test]
async fn transaction_listing_is_repeatable() {
  let s = store().await;
  let caller = registered(&s).await;
  for amount in [5, 5, 5, 8] {
    earn(&s, caller, amount).await;
  }

  let q = TransactionQuery { limit: 3, offset: 1, kind: None };
  let a = s.list_transactions(caller, q).await.unwrap();
  let b = s.list_transactions(caller, q).await.unwrap();
  assert_eq!(a, b);
}

#[tokio::test]
async fn type_filter_applies_to_count() {
  let s = store().await;
  let caller = registered(&s).await;
  earn(&s, caller, 40).await;
  earn(&s, caller, 40).await;
  s.spend(caller, 15, "Gift".into()).await.unwrap();

  let spent = s
    .list_transactions(caller, TransactionQuery {
      kind: Some(TransactionType::Spent),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(spent.count, 1);
  assert_eq!(spent.data.len(), 1);
  assert_eq!(spent.data[0].amount, -15);
}

#[tokio::test]
async fn transactions_are_scoped_to_the_caller() {
  let s = store().await;
  let alice = registered(&s).await;
  let bob = registered(&s).await;
  earn(&s, alice, 10).await;

  let page = s
    .list_transactions(bob, TransactionQuery::default())
    .await
    .unwrap();
  assert_eq!(page.count, 0);
  assert!(page.data.is_empty());
}

// ─── Redemption ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn redeem_writes_reward_debit_and_stock() {
  let s = store().await;
  let caller = registered(&s).await;
  earn(&s, caller, 100).await;
  let r = s.add_reward(reward(40, Some(3))).await.unwrap();

  let redemption = s.redeem(caller, r.id).await.unwrap();
  assert_eq!(redemption.user_reward.status, RedemptionStatus::Pending);
  assert_eq!(redemption.user_reward.reward_id, r.id);
  assert_eq!(redemption.transaction.amount, -40);
  assert_eq!(redemption.transaction.description, "Redeemed: Coffee");
  assert_eq!(redemption.user.points, 60);

  let after = s.get_reward(r.id).await.unwrap().unwrap();
  assert_eq!(after.stock, Some(2));
  assert_ledger_consistent(&s, caller).await;
}

#[tokio::test]
async fn unlimited_stock_stays_unlimited() {
  let s = store().await;
  let caller = registered(&s).await;
  earn(&s, caller, 100).await;
  let r = s.add_reward(reward(10, None)).await.unwrap();

  s.redeem(caller, r.id).await.unwrap();
  assert_eq!(s.get_reward(r.id).await.unwrap().unwrap().stock, None);
}

#[tokio::test]
async fn last_unit_can_only_be_redeemed_once() {
  let s = store().await;
  let caller = registered(&s).await;
  earn(&s, caller, 100).await;
  let r = s.add_reward(reward(10, Some(1))).await.unwrap();

  s.redeem(caller, r.id).await.unwrap();
  assert_eq!(s.get_reward(r.id).await.unwrap().unwrap().stock, Some(0));

  let err = s.redeem(caller, r.id).await.unwrap_err();
  assert_eq!(rejection(err), Some(Rejection::OutOfStock));
  assert_eq!(s.get_profile(caller).await.unwrap().unwrap().user.points, 90);
}

#[tokio::test]
async fn unavailable_is_reported_before_insufficient_points() {
  let s = store().await;
  let caller = registered(&s).await;
  let r = s
    .add_reward(NewReward { is_available: false, ..reward(500, None) })
    .await
    .unwrap();

  let err = s.redeem(caller, r.id).await.unwrap_err();
  assert_eq!(rejection(err), Some(Rejection::Unavailable));
}

#[tokio::test]
async fn insufficient_points_leaves_no_trace() {
  let s = store().await;
  let caller = registered(&s).await;
  earn(&s, caller, 5).await;
  let r = s.add_reward(reward(10, Some(4))).await.unwrap();

  let err = s.redeem(caller, r.id).await.unwrap_err();
  assert_eq!(rejection(err), Some(Rejection::InsufficientPoints));

  assert_eq!(s.get_profile(caller).await.unwrap().unwrap().user.points, 5);
  assert!(s.list_my_rewards(caller).await.unwrap().is_empty());
  assert_eq!(
    s.list_transactions(caller, TransactionQuery::default())
      .await
      .unwrap()
      .count,
    1
  );
  assert_eq!(s.get_reward(r.id).await.unwrap().unwrap().stock, Some(4));
}

#[tokio::test]
async fn redeem_without_profile_is_insufficient_points() {
  let s = store().await;
  let r = s.add_reward(reward(10, None)).await.unwrap();
  let err = s.redeem(Caller::new(Uuid::new_v4()), r.id).await.unwrap_err();
  assert_eq!(rejection(err), Some(Rejection::InsufficientPoints));
}

#[tokio::test]
async fn redeem_unknown_reward_is_not_found() {
  let s = store().await;
  let caller = registered(&s).await;
  let missing = Uuid::new_v4();
  let err = s.redeem(caller, missing).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::RewardNotFound(id)) if id == missing));
}

#[tokio::test]
async fn concurrent_redemptions_do_not_oversell() {
  let s = store().await;
  let caller = registered(&s).await;
  earn(&s, caller, 1000).await;
  let r = s.add_reward(reward(10, Some(2))).await.unwrap();

  let mut handles = Vec::new();
  for _ in 0..6 {
    let s = s.clone();
    handles.push(tokio::spawn(async move { s.redeem(caller, r.id).await }));
  }
  let mut succeeded = 0;
  for h in handles {
    if h.await.unwrap().is_ok() {
      succeeded += 1;
    }
  }

  assert_eq!(succeeded, 2);
  assert_eq!(s.get_reward(r.id).await.unwrap().unwrap().stock, Some(0));
  assert_eq!(s.list_my_rewards(caller).await.unwrap().len(), 2);
  assert_ledger_consistent(&s, caller).await;
}

#[tokio::test]
async fn my_rewards_join_reward_fields_newest_first() {
  let s = store().await;
  let caller = registered(&s).await;
  earn(&s, caller, 100).await;
  let coffee = s.add_reward(reward(10, None)).await.unwrap();
  let mug = s
    .add_reward(NewReward { name: "Mug".into(), ..reward(20, None) })
    .await
    .unwrap();

  s.redeem(caller, coffee.id).await.unwrap();
  s.redeem(caller, mug.id).await.unwrap();

  let mine = s.list_my_rewards(caller).await.unwrap();
  assert_eq!(mine.len(), 2);
  assert_eq!(mine[0].reward.name, "Mug");
  assert_eq!(mine[0].reward.points_cost, 20);
  assert_eq!(mine[1].reward.name, "Coffee");
  assert_eq!(mine[1].reward.description.as_deref(), Some("A free coffee"));
}

#[tokio::test]
async fn reward_listing_hides_unavailable_and_sorts_by_cost() {
  let s = store().await;
  s.add_reward(reward(30, None)).await.unwrap();
  s.add_reward(reward(10, None)).await.unwrap();
  s.add_reward(NewReward { is_available: false, ..reward(5, None) })
    .await
    .unwrap();

  let costs: Vec<i64> = s
    .list_rewards()
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.points_cost)
    .collect();
  assert_eq!(costs, vec![10, 30]);
}

// ─── Reference data ──────────────────────────────────────────────────────────

#[tokio::test]
async fn default_levels_are_seeded_in_threshold_order() {
  let s = store().await;
  let names: Vec<String> =
    s.list_levels().await.unwrap().into_iter().map(|l| l.name).collect();
  assert_eq!(names, vec!["Bronze", "Silver", "Gold", "Platinum"]);
}

#[tokio::test]
async fn only_running_campaigns_are_listed() {
  let s = store().await;
  let now = Utc::now();
  let campaign = |name: &str, start, end, is_active| NewCampaign {
    name: name.into(),
    description: None,
    bonus_points: 100,
    start_date: start,
    end_date: end,
    is_active,
  };

  let running = s
    .add_campaign(campaign("Spring", now - Duration::days(1), now + Duration::days(1), true))
    .await
    .unwrap();
  s.add_campaign(campaign("Past", now - Duration::days(9), now - Duration::days(2), true))
    .await
    .unwrap();
  s.add_campaign(campaign("Future", now + Duration::days(2), now + Duration::days(9), true))
    .await
    .unwrap();
  let off = s
    .add_campaign(campaign("Off", now - Duration::days(1), now + Duration::days(1), false))
    .await
    .unwrap();

  let listed = s.list_active_campaigns(now).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].id, running.id);

  assert!(s.get_campaign(running.id).await.unwrap().is_some());
  assert!(s.get_campaign(off.id).await.unwrap().is_none());
}
