use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        claims::TokenKind,
        dto::{CurrentUser, LoginRequest, LoginResponse, Message, RegisterRequest, UserMessage},
        extractors::AuthUser,
        password::{hash_password_blocking, verify_password_blocking},
        repo_types::{NewUser, DEFAULT_USER_NAME},
        services::{is_valid_email, normalize_email, present, MIN_PASSWORD_LEN},
    },
    error::AppError,
    extract::AppJson,
    mail::{self, templates},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/get-user", get(get_user))
}

pub fn welcome_routes() -> Router<AppState> {
    Router::new().route("/", get(welcome))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<Json<UserMessage>, AppError> {
    let (Some(email), Some(password)) = (present(payload.email), present(payload.password)) else {
        return Err(AppError::Validation("Email and password are required!"));
    };
    let email = normalize_email(&email);

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("Invalid email!"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation("Password too short!"));
    }

    // Fast path only; the unique constraint on insert is authoritative.
    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict);
    }

    let password_hash = hash_password_blocking(password).await?;
    let verification_token = state.tokens.issue(&email, TokenKind::Verification)?;
    let name = present(payload.name)
        .map(|n| n.trim().to_string())
        .unwrap_or_else(|| DEFAULT_USER_NAME.to_string());

    let user = state
        .users
        .create(NewUser {
            name,
            email,
            password_hash,
            verification_token: verification_token.clone(),
        })
        .await
        .map_err(|e| {
            let e = AppError::from(e);
            if matches!(e, AppError::Conflict) {
                warn!("concurrent registration lost the unique constraint race");
            }
            e
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    mail::deliver(
        state.mailer.as_ref(),
        templates::verification(&state.config.mail, &user.email, &verification_token),
    )
    .await;

    Ok(Json(UserMessage {
        user: user.into(),
        message: "User created successfully!",
    }))
}

/// Succeeds only for an existing, verified user with a matching password.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (Some(email), Some(password)) = (present(payload.email), present(payload.password)) else {
        return Err(AppError::Validation("Email and password are required!"));
    };
    let email = normalize_email(&email);

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::NotFound);
    };

    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Validation("Invalid Password or Email!"));
    }

    if !user.email_verified {
        warn!(user_id = %user.id, "login before email verification");
        return Err(AppError::Validation("Email not verified!"));
    }

    let token = state.tokens.issue(&user.email, TokenKind::Access)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        token,
        message: "Logged in successfully!",
    }))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(email): AuthUser,
) -> Result<Json<CurrentUser>, AppError> {
    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "token subject no longer exists");
        return Err(AppError::Unauthorized("User not found!"));
    };

    Ok(Json(CurrentUser {
        id: user.id,
        email: user.email,
        email_verified: user.email_verified,
    }))
}

pub async fn welcome(AuthUser(email): AuthUser) -> Json<Message> {
    Json(Message {
        message: format!("Welcome to the API! {email}"),
    })
}
