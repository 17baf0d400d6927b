//! HTTP surface for Perk.
//!
//! Exposes an axum [`Router`] backed by any [`LoyaltyStore`]. Every route
//! requires a bearer token; the caller it names is threaded through each
//! store call.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users-api` | `{data: profile \| null}` |
//! | `PUT`  | `/users-api` | Body: `{"full_name": ...}` |
//! | `POST` | `/users-api/register` | Body: `{"email": ..., "full_name": ...}` |
//! | `GET`  | `/transactions-api` | `?limit&offset&type` |
//! | `POST` | `/transactions-api/earn` | Body: `{"amount": 10, "description": ...}` |
//! | `GET`  | `/rewards-api` | Available rewards, cheapest first |
//! | `POST` | `/rewards-api/redeem` | Body: `{"reward_id": ...}` |
//! | `GET`  | `/rewards-api/my-rewards` | |
//! | `GET`  | `/campaigns-api` | Running campaigns |
//! | `GET`  | `/campaigns-api/{id}` | |
//! | `GET`  | `/loyalty-levels-api` | |

pub mod auth;
pub mod campaigns;
pub mod error;
pub mod levels;
pub mod rewards;
pub mod seed;
pub mod transactions;
pub mod users;


use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  http::{HeaderName, Method, header},
  routing::{get, post},
};
use perk_core::store::LoyaltyStore;
use serde::{Deserialize, Serialize};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

pub use error::ApiError;

use auth::{AuthConfig, Authenticated};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `PERK_*`
/// environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:           String,
  pub port:           u16,
  pub store_path:     PathBuf,
  pub jwt_secret:     String,
  #[serde(default)]
  pub jwt_audience:   Option<String>,
  pub token_ttl_secs: i64,
}

impl ServerConfig {
  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      jwt_secret:     self.jwt_secret.clone(),
      audience:       self.jwt_audience.clone(),
      token_ttl_secs: self.token_ttl_secs,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: LoyaltyStore> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

/// The `{"data": ...}` envelope most endpoints answer with.
#[derive(Debug, Serialize)]
pub struct Data<T> {
  pub data: T,
}

impl<T> Data<T> {
  pub fn new(data: T) -> Self { Self { data } }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: LoyaltyStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Users
    .route(
      "/users-api",
      get(users::get_profile::<S>).put(users::update_profile::<S>),
    )
    .route("/users-api/register", post(users::register::<S>))
    // Ledger
    .route("/transactions-api", get(transactions::list::<S>))
    .route("/transactions-api/earn", post(transactions::earn::<S>))
    // Rewards
    .route("/rewards-api", get(rewards::list::<S>))
    .route("/rewards-api/redeem", post(rewards::redeem::<S>))
    .route("/rewards-api/my-rewards", get(rewards::mine::<S>))
    // Reference data
    .route("/campaigns-api", get(campaigns::list::<S>))
    .route("/campaigns-api/{id}", get(campaigns::get_one::<S>))
    .route("/loyalty-levels-api", get(levels::list::<S>))
    .fallback(not_found)
    .layer(TraceLayer::new_for_http())
    .layer(cors())
    .with_state(state)
}

/// Unknown paths still require a caller, then answer 404.
async fn not_found(Authenticated(_): Authenticated) -> ApiError {
  ApiError::NotFound("Not found".into())
}

/// Browser clients call the API directly, so every response (including
/// preflight and errors) carries permissive CORS headers.
fn cors() -> CorsLayer {
  CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([
      Method::GET,
      Method::POST,
      Method::PUT,
      Method::DELETE,
      Method::OPTIONS,
    ])
    .allow_headers([
      header::AUTHORIZATION,
      header::CONTENT_TYPE,
      HeaderName::from_static("x-client-info"),
      HeaderName::from_static("apikey"),
    ])
}
