use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::claims::{Claims, TokenKind};
use crate::{config::JwtConfig, state::AppState};

#[derive(Debug, thiserror::Error)]
#[error("invalid or expired token")]
pub struct InvalidToken;

/// Signs and verifies HS256 tokens with the process-wide secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Option<Duration>,
    verification_ttl: Option<Duration>,
    reset_ttl: Option<Duration>,
    leeway: u64,
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl TokenService {
    pub fn new(cfg: &JwtConfig) -> Self {
        let minutes = |m: i64| Duration::minutes(m);
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            access_ttl: cfg.access_ttl_minutes.map(minutes),
            verification_ttl: cfg.verification_ttl_minutes.map(minutes),
            reset_ttl: Some(minutes(cfg.reset_ttl_minutes)),
            leeway: cfg.leeway_seconds,
        }
    }

    fn ttl(&self, kind: TokenKind) -> Option<Duration> {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Verification => self.verification_ttl,
            TokenKind::PasswordReset => self.reset_ttl,
        }
    }

    pub fn issue(&self, email: &str, kind: TokenKind) -> anyhow::Result<String> {
        self.issue_at(email, kind, self.ttl(kind), OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(
        &self,
        email: &str,
        kind: TokenKind,
        ttl: Option<Duration>,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let exp = ttl
            .map(|ttl| {
                now.checked_add(ttl)
                    .and_then(|at| u64::try_from(at.unix_timestamp()).ok())
                    .context("token expiry out of range")
            })
            .transpose()?;
        let claims = Claims {
            email: email.to_string(),
            iat: u64::try_from(now.unix_timestamp()).context("clock before unix epoch")?,
            exp,
            kind,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(email = %email, kind = ?kind, "jwt signed");
        Ok(token)
    }

    /// Malformed, tampered and expired tokens all fail the same way.
    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is optional; when present it is still enforced.
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.leeway = self.leeway;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            InvalidToken
        })?;
        debug!(email = %data.claims.email, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_kind(&self, token: &str, kind: TokenKind) -> Result<Claims, InvalidToken> {
        let claims = self.verify(token)?;
        if claims.kind != kind {
            debug!(expected = ?kind, got = ?claims.kind, "jwt kind mismatch");
            return Err(InvalidToken);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenPolicy;

    fn jwt_config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.into(),
            access_ttl_minutes: None,
            verification_ttl_minutes: None,
            reset_ttl_minutes: 60,
            leeway_seconds: 0,
            policy: TokenPolicy::Stateless,
        }
    }

    fn make_keys(secret: &str) -> TokenService {
        TokenService::new(&jwt_config(secret))
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let keys = make_keys("dev-secret");
        let token = keys.issue("ada@example.com", TokenKind::Access).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn reset_tokens_expire_after_an_hour() {
        let keys = make_keys("dev-secret");
        let token = keys.issue("ada@example.com", TokenKind::PasswordReset).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        let exp = claims.exp.expect("reset tokens carry exp");
        assert_eq!(exp - claims.iat, 3600);
    }

    #[test]
    fn reset_token_boundary() {
        let keys = make_keys("dev-secret");
        let ttl = Some(Duration::hours(1));
        let now = OffsetDateTime::now_utc();

        // Issued 59:59 ago: one second of validity left.
        let fresh = keys
            .issue_at("ada@example.com", TokenKind::PasswordReset, ttl, now - Duration::seconds(3599))
            .expect("sign");
        assert!(keys.verify(&fresh).is_ok());

        // Issued 60:01 ago: expired one second ago.
        let stale = keys
            .issue_at("ada@example.com", TokenKind::PasswordReset, ttl, now - Duration::seconds(3601))
            .expect("sign");
        assert!(keys.verify(&stale).is_err());
    }

    #[test]
    fn leeway_tolerates_small_skew() {
        let mut cfg = jwt_config("dev-secret");
        cfg.leeway_seconds = 30;
        let keys = TokenService::new(&cfg);
        let now = OffsetDateTime::now_utc();
        let token = keys
            .issue_at("ada@example.com", TokenKind::Access, Some(Duration::seconds(60)), now - Duration::seconds(70))
            .expect("sign");
        assert!(keys.verify(&token).is_ok());
    }

    #[test]
    fn verify_rejects_other_secret() {
        let good = make_keys("secret-a");
        let bad = make_keys("secret-b");
        let token = good.issue("ada@example.com", TokenKind::Access).expect("sign");
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_tampered_and_garbage() {
        let keys = make_keys("dev-secret");
        let token = keys.issue("ada@example.com", TokenKind::Access).expect("sign");
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_payload = {
            let other = keys.issue("eve@example.com", TokenKind::Access).expect("sign");
            other.split('.').nth(1).map(str::to_string).expect("payload")
        };
        parts[1] = &forged_payload;
        // Payload swapped in from another token, signature kept.
        let forged = parts.join(".");
        assert!(keys.verify(&forged).is_err());
        assert!(keys.verify("invalid_token").is_err());
        assert!(keys.verify("").is_err());
    }

    #[test]
    fn verify_kind_rejects_mismatch() {
        let keys = make_keys("dev-secret");
        let token = keys.issue("ada@example.com", TokenKind::Verification).expect("sign");
        assert!(keys.verify_kind(&token, TokenKind::Verification).is_ok());
        assert!(keys.verify_kind(&token, TokenKind::Access).is_err());
        assert!(keys.verify_kind(&token, TokenKind::PasswordReset).is_err());
    }

    #[test]
    fn oversized_ttl_is_an_error_not_a_panic() {
        let keys = make_keys("dev-secret");
        let now = OffsetDateTime::now_utc();
        let err = keys
            .issue_at("ada@example.com", TokenKind::Access, Some(Duration::MAX), now)
            .unwrap_err();
        assert!(err.to_string().contains("expiry out of range"));
    }
}
