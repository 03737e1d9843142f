use crate::state::AppState;
use axum::Router;

pub mod claims;
mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
mod recovery;
pub mod repo;
pub mod repo_types;
pub(crate) mod services;
mod verification;


pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::welcome_routes())
        .merge(verification::email_routes())
        .merge(recovery::password_routes())
}
