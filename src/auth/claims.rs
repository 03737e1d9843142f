use serde::{Deserialize, Serialize};

/// Purpose a token was issued for. Each endpoint accepts exactly one kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Verification,
    PasswordReset,
}

/// JWT payload: `{email, iat[, exp], kind}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub email: String,
    pub iat: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    pub kind: TokenKind,
}
