mod app;
mod auth;
mod config;
mod db;
mod error;
mod extract;
mod mail;
mod posts;
mod state;

#[cfg(test)]
mod testing;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "scribe=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    // Missing JWT_SECRET and friends stop the process here.
    let config = AppConfig::from_env()?;
    tracing::info!(
        policy = ?config.jwt.policy,
        delivery = ?config.mail.delivery,
        page_size = config.post_page_size,
        "configuration loaded"
    );

    let app_state = AppState::init(config).await?;
    let app = app::build_app(app_state);

    app::serve(app).await
}
