//! Handlers for `/users-api` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users-api` | `{data: null}` before registration |
//! | `PUT`  | `/users-api` | Body: `{"full_name":"Ada"}`; absent key is a no-op; 404 before registration |
//! | `POST` | `/users-api/register` | 201; 409 if already registered |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use perk_core::{
  store::LoyaltyStore,
  user::{NewUser, User, UserProfile},
};
use serde::{Deserialize, Deserializer};

use crate::{AppState, Data, auth::Authenticated, error::ApiError};

// ─── Get ──────────────────────────────────────────────────────────────────────

/// `GET /users-api`
pub async fn get_profile<S>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Data<Option<UserProfile>>>, ApiError>
where
  S: LoyaltyStore + Clone + Send + Sync + 'static,
{
  let profile = state
    .store
    .get_profile(caller)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(Data::new(profile)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  /// `None` when the key is absent, `Some(None)` for an explicit `null`.
  #[serde(default, deserialize_with = "present")]
  pub full_name: Option<Option<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  T::deserialize(deserializer).map(Some)
}

/// `PUT /users-api`
///
/// A body without `full_name` changes nothing and answers with the stored
/// row.
pub async fn update_profile<S>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  body: Result<Json<UpdateBody>, JsonRejection>,
) -> Result<Json<Data<User>>, ApiError>
where
  S: LoyaltyStore + Clone + Send + Sync + 'static,
{
  let Json(body) = body?;
  let user = match body.full_name {
    Some(full_name) => state
      .store
      .update_profile(caller, full_name)
      .await
      .map_err(ApiError::store)?,
    None => state
      .store
      .get_profile(caller)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::NotFound("User profile not found".into()))?
      .user,
  };
  Ok(Json(Data::new(user)))
}

// ─── Register ─────────────────────────────────────────────────────────────────

/// `POST /users-api/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  body: Result<Json<NewUser>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LoyaltyStore + Clone + Send + Sync + 'static,
{
  let Json(input) = body?;
  let user = state
    .store
    .register(caller, input)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(user_id = %user.id, "registered profile");
  Ok((StatusCode::CREATED, Json(Data::new(user))))
}
