//! Authentication: password hashing, the access-token lifecycle and the
//! request extractor.
//!
//! Access tokens are HMAC-signed JWTs whose subject is the user's email.
//! A token moves `issued → revoked` (explicit logout) or `issued → expired`
//! (time-based); neither state is recoverable. Revocation lives in a
//! process-wide [`RevocationList`] so logout takes effect before the token's
//! cryptographic expiry.

use std::collections::HashMap;
use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use gravmap_core::User;
use gravmap_store::Store;

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// Entropy in a one-time (reset/verification) token.
const ONE_TIME_TOKEN_BYTES: usize = 32;

/// JWT claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's email.
    pub sub: String,
    /// Expiration time (unix seconds).
    pub exp: i64,
    /// Issued at (unix seconds).
    pub iat: i64,
}

/// Hash a password with argon2id and a fresh random salt.
///
/// # Errors
///
/// Returns `ApiError::Internal` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

/// Check a password against a stored argon2id hash.
#[must_use]
pub fn verify_password(password: &str, hashed: &str) -> bool {
    PasswordHash::new(hashed).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Issue a signed access token for `email`. Returns the token and its
/// expiry timestamp.
///
/// # Errors
///
/// Returns `ApiError::Internal` if signing fails.
pub fn issue_access_token(email: &str, config: &ServiceConfig) -> Result<(String, i64), ApiError> {
    let now = Utc::now();
    let exp = (now + Duration::minutes(config.access_token_ttl_minutes)).timestamp();
    let claims = Claims {
        sub: email.to_string(),
        exp,
        iat: now.timestamp(),
    };

    encode(
        &Header::new(config.jwt_algorithm),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map(|token| (token, exp))
    .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
}

/// Verify an access token's signature and expiry and return its claims.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` on any verification failure.
pub fn decode_access_token(token: &str, config: &ServiceConfig) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::new(config.jwt_algorithm),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "access token verification failed");
        ApiError::Unauthorized("invalid credentials".into())
    })
}

/// Mint an opaque one-time token: 32 random bytes, URL-safe base64.
#[must_use]
pub fn mint_one_time_token() -> String {
    let mut bytes = [0u8; ONE_TIME_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Process-wide set of explicitly revoked access tokens.
///
/// Entries are pruned once past their token's natural expiry, which bounds
/// memory over the process lifetime. The set is empty after a restart; an
/// unexpired token revoked before the restart becomes valid again, which
/// matches the in-memory contract.
#[derive(Default)]
pub struct RevocationList {
    inner: RwLock<HashMap<String, i64>>,
}

impl RevocationList {
    /// Create an empty revocation list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke a token until its expiry timestamp.
    pub async fn revoke(&self, token: &str, expires_at: i64) {
        let mut inner = self.inner.write().await;
        let now = Utc::now().timestamp();
        inner.retain(|_, exp| *exp > now);
        inner.insert(token.to_string(), expires_at);
    }

    /// Whether a token has been revoked.
    pub async fn is_revoked(&self, token: &str) -> bool {
        self.inner.read().await.contains_key(token)
    }
}

/// An authenticated user extracted from a Bearer access token.
///
/// Carries the raw token and its expiry so the logout handler can place it
/// on the revocation list.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The resolved user record.
    pub user: User,
    /// The raw token the request presented.
    pub token: String,
    /// The token's expiry timestamp (unix seconds).
    pub expires_at: i64,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Extract the Bearer token from the Authorization header.
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing credentials".into()))?;
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("missing credentials".into()))?;

        // Revocation is checked before signature verification: a revoked
        // token stays unusable even while cryptographically valid.
        if state.revoked.is_revoked(token).await {
            return Err(ApiError::Unauthorized("token has been revoked".into()));
        }

        let claims = decode_access_token(token, &state.config)?;

        let user = state
            .store
            .get_user_by_email(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("invalid credentials".into()))?;

        Ok(AuthUser {
            user,
            token: token.to_string(),
            expires_at: claims.exp,
        })
    }
}
