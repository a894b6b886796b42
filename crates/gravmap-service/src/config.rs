//! Service configuration.

use jsonwebtoken::Algorithm;

/// Default access-token lifetime in minutes.
const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 30;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The token signing secret was not provided.
    #[error("JWT_SECRET must be set; the signing secret is never hardcoded")]
    MissingJwtSecret,

    /// The configured signing algorithm is unknown or not an HMAC variant.
    #[error("unsupported JWT algorithm: {0} (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8000").
    pub listen_addr: String,

    /// PostgreSQL connection URL. When absent the service falls back to the
    /// in-memory store.
    pub database_url: Option<String>,

    /// HMAC signing secret for access tokens. Required.
    pub jwt_secret: String,

    /// Signing algorithm (default HS256; HMAC family only).
    pub jwt_algorithm: Algorithm,

    /// Access-token lifetime in minutes (default: 30).
    pub access_token_ttl_minutes: i64,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingJwtSecret` if `JWT_SECRET` is unset, or
    /// `ConfigError::UnsupportedAlgorithm` if `JWT_ALGORITHM` is not an
    /// HMAC variant.
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingJwtSecret)?;

        let algorithm_name =
            std::env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".to_string());
        let jwt_algorithm = parse_hmac_algorithm(&algorithm_name)?;

        Ok(Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into()),
            database_url: std::env::var("DATABASE_URL").ok(),
            jwt_secret,
            jwt_algorithm,
            access_token_ttl_minutes: std::env::var("ACCESS_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_MINUTES),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10 * 1024 * 1024), // 10MB, CSV uploads included
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }
}

fn parse_hmac_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    match name
        .parse::<Algorithm>()
        .map_err(|_| ConfigError::UnsupportedAlgorithm(name.to_string()))?
    {
        alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) => Ok(alg),
        _ => Err(ConfigError::UnsupportedAlgorithm(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_variants_are_accepted() {
        assert!(matches!(parse_hmac_algorithm("HS256"), Ok(Algorithm::HS256)));
        assert!(matches!(parse_hmac_algorithm("HS512"), Ok(Algorithm::HS512)));
    }

    #[test]
    fn asymmetric_algorithms_are_rejected() {
        assert!(matches!(
            parse_hmac_algorithm("RS256"),
            Err(ConfigError::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            parse_hmac_algorithm("bogus"),
            Err(ConfigError::UnsupportedAlgorithm(_))
        ));
    }
}
