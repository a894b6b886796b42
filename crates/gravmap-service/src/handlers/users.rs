//! User account handlers: signup, login/logout, password reset, email
//! verification and profile management.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use gravmap_core::{NewUser, OneTimeToken, TokenKind, UserProfile};
use gravmap_store::Store;

use crate::auth::{
    hash_password, issue_access_token, mint_one_time_token, verify_password, AuthUser,
};
use crate::error::ApiError;
use crate::state::AppState;

/// Signup request.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Login email, unique across users.
    pub email: String,
    /// Plain-text password; hashed before storage.
    pub password: String,
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// Access-token response.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// The signed access token.
    pub access_token: String,
    /// Always "bearer".
    pub token_type: &'static str,
}

/// Simple message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

/// Response carrying an issued one-time token.
///
/// Email delivery is simulated; the token is surfaced in the response so
/// callers can complete the flow.
#[derive(Debug, Serialize)]
pub struct IssuedTokenResponse {
    /// Human-readable outcome.
    pub message: String,
    /// The issued token.
    pub token: String,
}

/// Password-reset request body.
#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    /// Email to issue a reset token for.
    pub email: String,
}

/// Password-reset completion body.
#[derive(Debug, Deserialize)]
pub struct PasswordReset {
    /// The reset token from the request phase.
    pub token: String,
    /// Replacement plain-text password.
    pub new_password: String,
}

/// Email-verification request body.
#[derive(Debug, Deserialize)]
pub struct EmailVerificationRequest {
    /// Email to issue a verification token for.
    pub email: String,
}

/// Email-verification completion body.
#[derive(Debug, Deserialize)]
pub struct EmailVerification {
    /// The verification token from the request phase.
    pub token: String,
}

/// Profile update body; only supplied fields are merged.
#[derive(Debug, Deserialize)]
pub struct UserUpdate {
    /// Replacement first name, if supplied.
    pub first_name: Option<String>,
    /// Replacement last name, if supplied.
    pub last_name: Option<String>,
    /// Replacement password, if supplied; routed through the hashing path.
    pub new_password: Option<String>,
}

/// Register a new user.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    if state.store.get_user_by_email(&body.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hashed_password = hash_password(&body.password)?;
    let user = state
        .store
        .create_user(NewUser {
            email: body.email,
            hashed_password,
            first_name: body.first_name,
            last_name: body.last_name,
        })
        .await?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok(Json(UserProfile::from(&user)))
}

/// Authenticate and issue an access token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state.store.get_user_by_email(&body.email).await?;
    let authenticated = user
        .as_ref()
        .is_some_and(|u| verify_password(&body.password, &u.hashed_password));
    if !authenticated {
        return Err(ApiError::Unauthorized("incorrect email or password".into()));
    }

    let (access_token, _) = issue_access_token(&body.email, &state.config)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

/// Revoke the presented access token.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    state.revoked.revoke(&auth.token, auth.expires_at).await;

    tracing::info!(user_id = %auth.user.id, "access token revoked");

    Ok(Json(MessageResponse {
        message: "Access token revoked".into(),
    }))
}

/// Issue a password-reset token, invalidating any prior one for the email.
pub async fn password_reset_request(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PasswordResetRequest>,
) -> Result<Json<IssuedTokenResponse>, ApiError> {
    let user = state
        .store
        .get_user_by_email(&body.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let token = OneTimeToken::issue(TokenKind::PasswordReset, &user.email, mint_one_time_token());
    state.store.put_token(TokenKind::PasswordReset, &token).await?;

    tracing::info!(email = %user.email, "password reset token issued (simulated email delivery)");

    Ok(Json(IssuedTokenResponse {
        message: "Password reset token generated and (simulated) sent to email".into(),
        token: token.token,
    }))
}

/// Complete a password reset, consuming the token.
pub async fn password_reset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PasswordReset>,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = state
        .store
        .take_token(TokenKind::PasswordReset, &body.token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid or expired token".into()))?;

    let hashed_password = hash_password(&body.new_password)?;
    state
        .store
        .update_password(&token.email, &hashed_password)
        .await?;

    tracing::info!(email = %token.email, "password updated via reset token");

    Ok(Json(MessageResponse {
        message: "Password updated successfully".into(),
    }))
}

/// Issue an email-verification token, invalidating any prior one.
pub async fn request_email_verification(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EmailVerificationRequest>,
) -> Result<Json<IssuedTokenResponse>, ApiError> {
    let user = state
        .store
        .get_user_by_email(&body.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    if user.is_verified {
        return Err(ApiError::BadRequest("Email already verified".into()));
    }

    let token = OneTimeToken::issue(
        TokenKind::EmailVerification,
        &user.email,
        mint_one_time_token(),
    );
    state
        .store
        .put_token(TokenKind::EmailVerification, &token)
        .await?;

    tracing::info!(email = %user.email, "verification token issued (simulated email delivery)");

    Ok(Json(IssuedTokenResponse {
        message: "Verification token generated and (simulated) sent to email".into(),
        token: token.token,
    }))
}

/// Verify an email address, consuming the token.
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EmailVerification>,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = state
        .store
        .take_token(TokenKind::EmailVerification, &body.token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid or expired verification token".into()))?;

    state.store.mark_verified(&token.email).await?;

    tracing::info!(email = %token.email, "email verified");

    Ok(Json(MessageResponse {
        message: "Email successfully verified".into(),
    }))
}

/// Profile of the authenticated user.
pub async fn me(auth: AuthUser) -> Json<UserProfile> {
    Json(UserProfile::from(&auth.user))
}

/// Merge supplied fields into the authenticated user's profile.
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<UserUpdate>,
) -> Result<Json<UserProfile>, ApiError> {
    let email = &auth.user.email;

    // A password change goes through the same hashing path as signup.
    if let Some(new_password) = body.new_password.filter(|p| !p.is_empty()) {
        let hashed_password = hash_password(&new_password)?;
        state.store.update_password(email, &hashed_password).await?;
    }

    if body.first_name.is_some() || body.last_name.is_some() {
        state
            .store
            .update_user_names(email, body.first_name.as_deref(), body.last_name.as_deref())
            .await?;
    }

    let user = state
        .store
        .get_user_by_email(email)
        .await?
        .ok_or_else(|| ApiError::Internal("failed to re-read updated user".into()))?;

    Ok(Json(UserProfile::from(&user)))
}

/// List every registered user's profile.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let users = state.store.list_users().await?;
    Ok(Json(users.iter().map(UserProfile::from).collect()))
}
