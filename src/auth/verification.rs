//! `/email/*`: confirm ownership of an address and re-issue the link.

use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        claims::TokenKind,
        dto::{EmailRequest, Message, TokenRequest, UserMessage},
        services::{normalize_email, present},
    },
    config::TokenPolicy,
    error::AppError,
    extract::AppJson,
    mail::{self, templates},
    state::AppState,
};

pub fn email_routes() -> Router<AppState> {
    Router::new()
        .route("/email/verify", post(verify_email))
        .route("/email/resend", post(resend_verification))
}

#[instrument(skip(state, payload))]
pub async fn verify_email(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TokenRequest>,
) -> Result<Json<UserMessage>, AppError> {
    let Some(token) = present(payload.token) else {
        return Err(AppError::Validation("No token!"));
    };
    let claims = state.tokens.verify_kind(&token, TokenKind::Verification)?;

    let Some(user) = state.users.find_by_email(&claims.email).await? else {
        return Err(AppError::NotFound);
    };

    if state.config.jwt.policy == TokenPolicy::LatestOnly
        && user.verification_token.as_deref() != Some(token.as_str())
    {
        warn!(user_id = %user.id, "superseded verification token");
        return Err(AppError::InvalidToken);
    }

    let user = state
        .users
        .mark_email_verified(user.id)
        .await?
        .ok_or(AppError::NotFound)?;

    info!(user_id = %user.id, "email verified");
    Ok(Json(UserMessage {
        user: user.into(),
        message: "Email verified successfully!",
    }))
}

#[instrument(skip(state, payload))]
pub async fn resend_verification(
    State(state): State<AppState>,
    AppJson(payload): AppJson<EmailRequest>,
) -> Result<Json<Message>, AppError> {
    let Some(email) = present(payload.email) else {
        return Err(AppError::Validation("Email is required!"));
    };
    let email = normalize_email(&email);

    let Some(user) = state.users.find_by_email(&email).await? else {
        return Err(AppError::NotFound);
    };
    if user.email_verified {
        return Err(AppError::Validation("Email already verified!"));
    }

    let token = state.tokens.issue(&user.email, TokenKind::Verification)?;
    state.users.set_verification_token(user.id, &token).await?;

    info!(user_id = %user.id, "verification token reissued");
    mail::deliver(
        state.mailer.as_ref(),
        templates::verification(&state.config.mail, &user.email, &token),
    )
    .await;

    Ok(Json(Message {
        message: "Email sent successfully!".to_string(),
    }))
}
