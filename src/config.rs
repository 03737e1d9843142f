use std::str::FromStr;

use anyhow::{bail, Context};
use serde::Deserialize;

/// Ten years; longer token lifetimes are treated as misconfiguration.
pub const MAX_TTL_MINUTES: i64 = 10 * 365 * 24 * 60;

/// Whether a body token must also match the copy stored on the user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenPolicy {
    /// Any correctly signed, unexpired token of the right kind is accepted.
    Stateless,
    /// Only the most recently issued token is accepted; reset tokens are single-use.
    LatestOnly,
}

impl FromStr for TokenPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stateless" => Ok(Self::Stateless),
            "latest-only" | "latest_only" => Ok(Self::LatestOnly),
            other => anyhow::bail!("unknown TOKEN_POLICY `{other}`"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailDelivery {
    Queued,
    Inline,
}

impl FromStr for MailDelivery {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queued" => Ok(Self::Queued),
            "inline" => Ok(Self::Inline),
            other => anyhow::bail!("unknown MAIL_DELIVERY `{other}`"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    /// `None` means login tokens carry no `exp`.
    pub access_ttl_minutes: Option<i64>,
    pub verification_ttl_minutes: Option<i64>,
    pub reset_ttl_minutes: i64,
    pub leeway_seconds: u64,
    pub policy: TokenPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub mailer_url: String,
    pub from_email: String,
    pub public_server_url: String,
    pub delivery: MailDelivery,
    pub timeout_seconds: u64,
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub post_page_size: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> anyhow::Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{key} must be set"))
        };
        let parsed = |key: &str| -> anyhow::Result<Option<i64>> {
            lookup(key)
                .map(|v| v.trim().parse::<i64>())
                .transpose()
                .with_context(|| format!("{key} must be an integer"))
        };

        let ttl = |key: &str| -> anyhow::Result<Option<i64>> {
            match parsed(key)? {
                Some(m) if !(1..=MAX_TTL_MINUTES).contains(&m) => {
                    bail!("{key} must be between 1 and {MAX_TTL_MINUTES} minutes")
                }
                other => Ok(other),
            }
        };

        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            access_ttl_minutes: ttl("ACCESS_TOKEN_TTL_MINUTES")?,
            verification_ttl_minutes: ttl("VERIFICATION_TOKEN_TTL_MINUTES")?,
            reset_ttl_minutes: ttl("RESET_TOKEN_TTL_MINUTES")?.unwrap_or(60),
            leeway_seconds: parsed("JWT_LEEWAY_SECONDS")?.unwrap_or(0).max(0) as u64,
            policy: lookup("TOKEN_POLICY")
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or(TokenPolicy::Stateless),
        };

        let mail = MailConfig {
            mailer_url: required("MAILER_URL")?,
            from_email: required("FROM_EMAIL")?,
            public_server_url: required("PUBLIC_SERVER_URL")?,
            delivery: lookup("MAIL_DELIVERY")
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or(MailDelivery::Queued),
            timeout_seconds: parsed("MAIL_TIMEOUT_SECONDS")?.unwrap_or(10).max(1) as u64,
            queue_capacity: parsed("MAIL_QUEUE_CAPACITY")?.unwrap_or(256).max(1) as usize,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            db_max_connections: parsed("DB_MAX_CONNECTIONS")?.unwrap_or(10).max(1) as u32,
            jwt,
            mail,
            post_page_size: parsed("POST_PAGE_SIZE")?.unwrap_or(10).max(1),
        })
    }
}
