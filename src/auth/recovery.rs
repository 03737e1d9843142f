//! `/password/*`: reset links are short-lived tokens sent by email.

use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        claims::TokenKind,
        dto::{EmailRequest, ResetPasswordRequest, UserMessage},
        password::hash_password_blocking,
        services::{normalize_email, present, MIN_PASSWORD_LEN},
    },
    config::TokenPolicy,
    error::AppError,
    extract::AppJson,
    mail::{self, templates},
    state::AppState,
};

pub fn password_routes() -> Router<AppState> {
    Router::new()
        .route("/password/forgot", post(forgot_password))
        .route("/password/reset", post(reset_password))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<EmailRequest>,
) -> Result<Json<UserMessage>, AppError> {
    let email = present(payload.email)
        .map(|e| normalize_email(&e))
        .unwrap_or_default();

    let Some(user) = state.users.find_by_email(&email).await? else {
        return Err(AppError::NotFound);
    };

    let token = state.tokens.issue(&user.email, TokenKind::PasswordReset)?;
    state.users.set_password_reset_token(user.id, &token).await?;

    info!(user_id = %user.id, "password reset requested");
    mail::deliver(
        state.mailer.as_ref(),
        templates::password_reset(&state.config.mail, &user.email, &token),
    )
    .await;

    Ok(Json(UserMessage {
        user: user.into(),
        message: "Email sent successfully!",
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> Result<Json<UserMessage>, AppError> {
    let Some(token) = present(payload.token) else {
        return Err(AppError::Validation("No token!"));
    };
    let Some(password) = present(payload.password) else {
        return Err(AppError::Validation("Password is required!"));
    };
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation("Password too short!"));
    }

    let claims = state.tokens.verify_kind(&token, TokenKind::PasswordReset)?;

    let Some(user) = state.users.find_by_email(&claims.email).await? else {
        return Err(AppError::NotFound);
    };

    if state.config.jwt.policy == TokenPolicy::LatestOnly
        && user.password_reset_token.as_deref() != Some(token.as_str())
    {
        warn!(user_id = %user.id, "reset token already used or superseded");
        return Err(AppError::InvalidToken);
    }

    let password_hash = hash_password_blocking(password).await?;
    let user = state
        .users
        .update_password(user.id, &password_hash)
        .await?
        .ok_or(AppError::NotFound)?;

    info!(user_id = %user.id, "password reset");
    Ok(Json(UserMessage {
        user: user.into(),
        message: "Password reset successfully!",
    }))
}
