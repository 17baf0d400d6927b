//! Handlers for `/campaigns-api` endpoints.
//!
//! Campaigns are informational; nothing here affects point accrual.

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::Utc;
use perk_core::{campaign::Campaign, store::LoyaltyStore};
use uuid::Uuid;

use crate::{AppState, Data, auth::Authenticated, error::ApiError};

/// `GET /campaigns-api`: active campaigns whose window contains now.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
) -> Result<Json<Data<Vec<Campaign>>>, ApiError>
where
  S: LoyaltyStore + Clone + Send + Sync + 'static,
{
  let campaigns = state
    .store
    .list_active_campaigns(Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(Data::new(campaigns)))
}

/// `GET /campaigns-api/{id}`
///
/// An id that does not parse cannot name a campaign, so it is a 404 rather
/// than a 400.
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
  Path(id): Path<String>,
) -> Result<Json<Data<Campaign>>, ApiError>
where
  S: LoyaltyStore + Clone + Send + Sync + 'static,
{
  let not_found = || ApiError::NotFound("Campaign not found".into());
  let id = Uuid::parse_str(&id).map_err(|_| not_found())?;
  let campaign = state
    .store
    .get_campaign(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(not_found)?;
  Ok(Json(Data::new(campaign)))
}
