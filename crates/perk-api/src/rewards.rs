//! Handlers for `/rewards-api` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/rewards-api` | Available rewards, cheapest first |
//! | `POST` | `/rewards-api/redeem` | Body: `{"reward_id":"<uuid>"}` |
//! | `GET`  | `/rewards-api/my-rewards` | Newest first, joined with reward fields |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use perk_core::{
  reward::{RedeemedReward, Reward},
  store::LoyaltyStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, Data, auth::Authenticated, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /rewards-api`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
) -> Result<Json<Data<Vec<Reward>>>, ApiError>
where
  S: LoyaltyStore + Clone + Send + Sync + 'static,
{
  let rewards = state.store.list_rewards().await.map_err(ApiError::store)?;
  Ok(Json(Data::new(rewards)))
}

// ─── Redeem ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RedeemBody {
  #[serde(default)]
  pub reward_id: Option<String>,
}

impl RedeemBody {
  fn reward_id(&self) -> Result<Uuid, ApiError> {
    let raw = self
      .reward_id
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .ok_or_else(|| ApiError::InvalidInput("Reward ID is required".into()))?;
    Uuid::parse_str(raw)
      .map_err(|_| ApiError::InvalidInput("Invalid reward ID".into()))
  }
}

/// `POST /rewards-api/redeem`
pub async fn redeem<S>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  body: Result<Json<RedeemBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LoyaltyStore + Clone + Send + Sync + 'static,
{
  let Json(body) = body?;
  let reward_id = body.reward_id()?;

  let redemption = state
    .store
    .redeem(caller, reward_id)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(redemption)))
}

// ─── Mine ─────────────────────────────────────────────────────────────────────

/// `GET /rewards-api/my-rewards`
pub async fn mine<S>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Data<Vec<RedeemedReward>>>, ApiError>
where
  S: LoyaltyStore + Clone + Send + Sync + 'static,
{
  let rewards = state
    .store
    .list_my_rewards(caller)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(Data::new(rewards)))
}
