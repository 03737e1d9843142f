use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::{auth::jwt::InvalidToken, db::StoreError};

/// Every failure a handler can surface. Internal details stay in the logs.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Invalid or expired token!")]
    InvalidToken,

    #[error("User already exists!")]
    Conflict,

    #[error("User not found!")]
    NotFound,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Forbidden!")]
    Forbidden,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidToken => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "Something went wrong!".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation => Self::Conflict,
            StoreError::Database(e) => Self::Internal(e),
        }
    }
}

impl From<InvalidToken> for AppError {
    fn from(_: InvalidToken) -> Self {
        Self::InvalidToken
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::Internal(e) = &self {
            error!(error = ?e, "request failed");
        }
        let body = json!({
            "error": {
                "status": status.as_u16(),
                "message": self.client_message(),
            }
        });
        (status, Json(body)).into_response()
    }
}
