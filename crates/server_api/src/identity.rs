use chrono::{Duration, Utc};
use curation::AdminPrincipal;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub secret: String,
    pub issuer: String,
    pub ttl_seconds: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    sub: String,
    exp: i64,
    iat: i64,
    role: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    Missing,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("'{0}' is not an admin")]
    NotAdmin(String),
}

pub fn mint_token(
    cfg: &IdentityConfig,
    subject: &str,
    role: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::seconds(cfg.ttl_seconds);
    let claims = Claims {
        iss: cfg.issuer.clone(),
        sub: subject.to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
        role: role.to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.secret.as_bytes()),
    )
}

pub fn mint_admin_token(
    cfg: &IdentityConfig,
    subject: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    mint_token(cfg, subject, ADMIN_ROLE)
}

/// Accepts a raw `Authorization` header value or a bare token.
pub fn verify_admin(cfg: &IdentityConfig, authorization: Option<&str>) -> Result<AdminPrincipal, AuthError> {
    let token = authorization
        .map(str::trim)
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::Missing)?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[cfg.issuer.as_str()]);
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.secret.as_bytes()),
        &validation,
    )
    .map_err(|err| AuthError::Invalid(err.to_string()))?;

    if data.claims.role != ADMIN_ROLE {
        return Err(AuthError::NotAdmin(data.claims.sub));
    }
    Ok(AdminPrincipal::new(data.claims.sub))
}

#[cfg(test)]
#[path = "tests/identity_tests.rs"]
mod tests;
