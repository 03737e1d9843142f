use crate::auth::{
    jwt::TokenService,
    repo::{PgUserStore, UserStore},
};
use crate::config::AppConfig;
use crate::mail::{self, Mailer};
use crate::posts::repo::{PgPostStore, PostStore};
use std::sync::Arc;

/// Shared, read-only after startup. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenService>,
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn PostStore>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = crate::db::connect(&config).await?;
        crate::db::migrate(&db).await?;

        let mailer = mail::build(&config.mail)?;
        let users = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
        let posts = Arc::new(PgPostStore::new(db)) as Arc<dyn PostStore>;

        Ok(Self::from_parts(Arc::new(config), users, posts, mailer))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        posts: Arc<dyn PostStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(&config.jwt));
        Self {
            config,
            tokens,
            users,
            posts,
            mailer,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        crate::testing::TestApp::new().state
    }
}
