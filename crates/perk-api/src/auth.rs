//! Bearer-token caller extraction.
//!
//! The identity provider signs HS256 JWTs with a shared secret; the `sub`
//! claim is the caller's user id. The token is checked once per request and
//! the resulting [`Caller`] is handed to every store call.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use perk_core::{Caller, store::LoyaltyStore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// How bearer tokens are verified for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  /// HS256 secret shared with the identity provider.
  pub jwt_secret:     String,
  /// Required `aud` claim, if any.
  pub audience:       Option<String>,
  /// Lifetime of tokens minted by [`AuthConfig::issue`].
  pub token_ttl_secs: i64,
}

/// Claims read from (and written to) a caller token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
  pub sub: Uuid,
  pub exp: i64,
  #[serde(default)]
  pub iat: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub aud: Option<String>,
}

impl AuthConfig {
  /// Validate `token` and return the caller it names.
  pub fn verify(&self, token: &str) -> Result<Caller, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    match &self.audience {
      Some(aud) => validation.set_audience(&[aud]),
      None => validation.validate_aud = false,
    }

    let data = decode::<Claims>(
      token,
      &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
      &validation,
    )
    .map_err(|e| {
      tracing::debug!(error = %e, "rejected bearer token");
      ApiError::Unauthorized
    })?;

    Ok(Caller::new(data.claims.sub))
  }

  /// Mint a token for `user_id`. Used for local development and tests; in
  /// production the identity provider issues tokens.
  pub fn issue(&self, user_id: Uuid) -> jsonwebtoken::errors::Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
      sub: user_id,
      exp: now + self.token_ttl_secs,
      iat: now,
      aud: self.audience.clone(),
    };
    encode(
      &Header::new(Algorithm::HS256),
      &claims,
      &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
    )
  }
}

/// Pull the caller out of an `Authorization: Bearer …` header.
pub fn verify_bearer(
  headers: &HeaderMap,
  config: &AuthConfig,
) -> Result<Caller, ApiError> {
  let token = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or(ApiError::Unauthorized)?;

  config.verify(token)
}

/// Present in a handler's arguments: the request carried a valid token.
pub struct Authenticated(pub Caller);

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: LoyaltyStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_bearer(&parts.headers, &state.auth).map(Authenticated)
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn config(audience: Option<&str>) -> AuthConfig {
    AuthConfig {
      jwt_secret:     "test-secret".into(),
      audience:       audience.map(str::to_owned),
      token_ttl_secs: 3600,
    }
  }

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  #[test]
  fn issued_token_round_trips() {
    let cfg = config(None);
    let id = Uuid::new_v4();
    let token = cfg.issue(id).unwrap();
    let caller = verify_bearer(&headers(&format!("Bearer {token}")), &cfg).unwrap();
    assert_eq!(caller.user_id, id);
  }

  #[test]
  fn audience_is_enforced_when_configured() {
    let issuer = config(Some("authenticated"));
    let token = issuer.issue(Uuid::new_v4()).unwrap();

    assert!(issuer.verify(&token).is_ok());
    assert!(matches!(
      config(Some("service_role")).verify(&token),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn wrong_secret_is_unauthorized() {
    let token = config(None).issue(Uuid::new_v4()).unwrap();
    let other = AuthConfig { jwt_secret: "other".into(), ..config(None) };
    assert!(matches!(other.verify(&token), Err(ApiError::Unauthorized)));
  }

  #[test]
  fn expired_token_is_unauthorized() {
    let cfg = AuthConfig { token_ttl_secs: -3600, ..config(None) };
    let token = cfg.issue(Uuid::new_v4()).unwrap();
    assert!(matches!(cfg.verify(&token), Err(ApiError::Unauthorized)));
  }

  #[test]
  fn missing_or_malformed_header_is_unauthorized() {
    let cfg = config(None);
    assert!(matches!(
      verify_bearer(&HeaderMap::new(), &cfg),
      Err(ApiError::Unauthorized)
    ));
    assert!(matches!(
      verify_bearer(&headers("Basic dXNlcjpwYXNz"), &cfg),
      Err(ApiError::Unauthorized)
    ));
    assert!(matches!(
      verify_bearer(&headers("Bearer not.a.jwt"), &cfg),
      Err(ApiError::Unauthorized)
    ));
  }
}
