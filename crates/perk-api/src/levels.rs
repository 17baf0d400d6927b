//! Handler for `GET /loyalty-levels-api`.

use axum::{Json, extract::State};
use perk_core::{level::LoyaltyLevel, store::LoyaltyStore};

use crate::{AppState, Data, auth::Authenticated, error::ApiError};

/// `GET /loyalty-levels-api`: every level, lowest threshold first.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
) -> Result<Json<Data<Vec<LoyaltyLevel>>>, ApiError>
where
  S: LoyaltyStore + Clone + Send + Sync + 'static,
{
  let levels = state.store.list_levels().await.map_err(ApiError::store)?;
  Ok(Json(Data::new(levels)))
}
