//! Handlers for `/transactions-api` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/transactions-api` | `?limit=50&offset=0&type=earned\|spent\|expired` |
//! | `POST` | `/transactions-api/earn` | Body: `{"amount":10,"description":"..."}` |

use axum::{
  Json,
  extract::{
    Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use perk_core::{
  ledger::{
    DEFAULT_PAGE_SIZE, EarnRequest, Transaction, TransactionQuery,
    TransactionType,
  },
  store::{LoyaltyStore, Page},
};
use serde::Deserialize;

use crate::{AppState, auth::Authenticated, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// Query string for the listing. Every field is optional and lenient: an
/// empty or unparseable value falls back to its default.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub limit:  Option<String>,
  pub offset: Option<String>,
  #[serde(rename = "type")]
  pub kind:   Option<String>,
}

impl ListParams {
  fn into_query(self) -> TransactionQuery {
    TransactionQuery {
      limit:  number_or(self.limit, DEFAULT_PAGE_SIZE),
      offset: number_or(self.offset, 0),
      kind:   self.kind.and_then(|k| k.parse::<TransactionType>().ok()),
    }
  }
}

fn number_or(raw: Option<String>, default: u32) -> u32 {
  raw
    .and_then(|v| v.trim().parse::<u32>().ok())
    .unwrap_or(default)
}

/// `GET /transactions-api`: the caller's ledger, newest first, with the
/// total size of the (filtered) ledger in `count`.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Page<Transaction>>, ApiError>
where
  S: LoyaltyStore + Clone + Send + Sync + 'static,
{
  let Query(params) = params?;
  let page = state
    .store
    .list_transactions(caller, params.into_query())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(page))
}

// ─── Earn ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EarnBody {
  /// Kept loose so that floats, strings and a missing field all produce the
  /// same `Invalid amount` answer.
  #[serde(default)]
  pub amount:      Option<serde_json::Value>,
  #[serde(default)]
  pub description: Option<String>,
}

/// `POST /transactions-api/earn`
pub async fn earn<S>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  body: Result<Json<EarnBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LoyaltyStore + Clone + Send + Sync + 'static,
{
  let Json(body) = body?;
  let amount = body
    .amount
    .as_ref()
    .and_then(serde_json::Value::as_i64)
    .ok_or_else(|| ApiError::InvalidInput("Invalid amount".into()))?;
  let request = EarnRequest::new(amount, body.description)?;

  let entry = state
    .store
    .earn(caller, request)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(entry)))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn params(limit: &str, offset: &str, kind: &str) -> ListParams {
    ListParams {
      limit:  Some(limit.into()),
      offset: Some(offset.into()),
      kind:   Some(kind.into()),
    }
  }

  #[test]
  fn missing_params_use_defaults() {
    assert_eq!(ListParams::default().into_query(), TransactionQuery::default());
  }

  #[test]
  fn empty_or_invalid_params_fall_back_to_defaults() {
    assert_eq!(params("", "", "").into_query(), TransactionQuery::default());
    assert_eq!(
      params("many", "-1", "bogus").into_query(),
      TransactionQuery::default()
    );
  }

  #[test]
  fn valid_params_are_applied() {
    let q = params("10", "20", "spent").into_query();
    assert_eq!(q.limit, 10);
    assert_eq!(q.offset, 20);
    assert_eq!(q.kind, Some(TransactionType::Spent));
  }
}
