//! Body and query extractors that reject with `AppError` instead of axum's
//! plain-text rejections.

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{header, request::Parts, HeaderMap},
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::AppError;

/// JSON request body. A missing body or a non-JSON content type reads as `{}`,
/// so handlers report their own "field is required" errors.
#[derive(Debug)]
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = is_json_content(req.headers());
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            debug!(error = %e, "request body unreadable");
            AppError::Validation("Invalid request body!")
        })?;

        let raw: &[u8] = if is_json && !bytes.iter().all(u8::is_ascii_whitespace) {
            &bytes
        } else {
            b"{}"
        };
        serde_json::from_slice(raw).map(AppJson).map_err(|e| {
            debug!(error = %e, "request body rejected");
            AppError::Validation("Invalid request body!")
        })
    }
}

/// Query string; an unparseable value is a 400 in the usual error shape.
#[derive(Debug)]
pub struct AppQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                debug!(error = %e, "query string rejected");
                AppError::Validation("Invalid query parameters!")
            })?;
        Ok(AppQuery(value))
    }
}

/// `application/json` or any `+json` media type, parameters ignored.
fn is_json_content(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let mime = value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(content_type: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).expect("header"));
        h
    }

    #[test]
    fn recognises_json_media_types() {
        assert!(is_json_content(&headers("application/json")));
        assert!(is_json_content(&headers("Application/JSON; charset=utf-8")));
        assert!(is_json_content(&headers("application/merge-patch+json")));
        assert!(!is_json_content(&headers("text/plain")));
        assert!(!is_json_content(&headers("application/x-www-form-urlencoded")));
        assert!(!is_json_content(&HeaderMap::new()));
    }
}
