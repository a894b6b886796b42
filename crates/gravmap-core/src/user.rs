//! User accounts and one-time tokens.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Password-reset tokens are valid for one hour.
pub const PASSWORD_RESET_TTL_HOURS: i64 = 1;

/// Email-verification tokens are valid for 24 hours.
pub const EMAIL_VERIFICATION_TTL_HOURS: i64 = 24;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned id.
    pub id: i64,

    /// Unique login email.
    pub email: String,

    /// Argon2id password hash. Never serialised into API responses.
    pub hashed_password: String,

    /// First name.
    pub first_name: String,

    /// Last name.
    pub last_name: String,

    /// Whether the email address has been verified.
    pub is_verified: bool,

    /// When the user was created.
    pub created_at: DateTime<Utc>,

    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for user creation; the password is already hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique login email.
    pub email: String,
    /// Argon2id password hash.
    pub hashed_password: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
}

/// Public user shape returned by the API. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Store-assigned id.
    pub id: i64,
    /// Login email.
    pub email: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Whether the email address has been verified.
    pub is_verified: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_verified: user.is_verified,
        }
    }
}

/// The two kinds of single-use tokens the auth lifecycle issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Token authorising a password reset. One hour TTL.
    PasswordReset,
    /// Token authorising email verification. 24 hour TTL.
    EmailVerification,
}

impl TokenKind {
    /// Validity window for tokens of this kind.
    #[must_use]
    pub fn ttl(self) -> Duration {
        match self {
            Self::PasswordReset => Duration::hours(PASSWORD_RESET_TTL_HOURS),
            Self::EmailVerification => Duration::hours(EMAIL_VERIFICATION_TTL_HOURS),
        }
    }
}

/// A single-use, time-boxed token bound to an email address.
///
/// At most one token per email per kind is active: creating a new one
/// deletes priors, and a successful verification consumes the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneTimeToken {
    /// The email the token was issued for.
    pub email: String,
    /// Opaque, unguessable token value (URL-safe base64 of 32 random bytes).
    pub token: String,
    /// Issue time.
    pub created_at: DateTime<Utc>,
    /// Expiry time; the token is unusable afterwards.
    pub expires_at: DateTime<Utc>,
}

impl OneTimeToken {
    /// Build a token of the given kind issued now.
    #[must_use]
    pub fn issue(kind: TokenKind, email: &str, token: String) -> Self {
        let now = Utc::now();
        Self {
            email: email.to_string(),
            token,
            created_at: now,
            expires_at: now + kind.ttl(),
        }
    }

    /// Whether the token has passed its expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_never_carries_the_hash() {
        let user = User {
            id: 1,
            email: "ada@example.com".into(),
            hashed_password: "$argon2id$...".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            is_verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let profile = UserProfile::from(&user);
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("ada@example.com"));
    }

    #[test]
    fn reset_tokens_expire_after_an_hour() {
        let token = OneTimeToken::issue(TokenKind::PasswordReset, "a@b.c", "t".into());
        assert!(!token.is_expired(Utc::now()));
        assert!(token.is_expired(Utc::now() + Duration::hours(2)));
    }

    #[test]
    fn verification_tokens_outlive_reset_tokens() {
        let reset = OneTimeToken::issue(TokenKind::PasswordReset, "a@b.c", "t".into());
        let verify = OneTimeToken::issue(TokenKind::EmailVerification, "a@b.c", "t".into());
        assert!(verify.expires_at > reset.expires_at);
    }
}
