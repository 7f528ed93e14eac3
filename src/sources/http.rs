//! Shared HTTP plumbing for the network-backed sources
//!
//! Requests return a [`FetchError`] carrying only the classified reason; the
//! adapter stamps its own id on it when converting to a `SourceFailure`.

use crate::types::{FailureKind, SourceFailure};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Largest response body a source will read; wiki pages sit well below it
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// A classified transport or decoding failure without source attribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub reason: FailureKind,
    pub detail: String,
}

impl FetchError {
    pub fn new(reason: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }

    pub fn parse(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::ParseError, detail)
    }

    pub fn into_failure(self, source_id: &str) -> SourceFailure {
        SourceFailure::new(source_id, self.reason, self.detail)
    }
}

/// Client shared by every source, sending browser-like headers so wiki
/// front ends serve the regular page
pub fn build_client() -> reqwest::Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

    Client::builder().default_headers(headers).build()
}

/// GET a URL and decode the body as JSON
pub async fn get_json(client: &Client, url: &str, timeout: Duration) -> Result<Value, FetchError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify_reqwest_error(&e))?;

    if let Some(err) = classify_status(response.status()) {
        return Err(err);
    }

    let body = read_body(response, MAX_BODY_BYTES).await?;
    serde_json::from_slice(&body).map_err(|e| FetchError::parse(format!("invalid JSON from {}: {}", url, e)))
}

/// GET a URL and return the body as text
pub async fn get_text(client: &Client, url: &str, timeout: Duration) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify_reqwest_error(&e))?;

    if let Some(err) = classify_status(response.status()) {
        return Err(err);
    }

    let body = read_body(response, MAX_BODY_BYTES).await?;
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Read a response body chunk by chunk, giving up once it passes `limit`
pub async fn read_body(mut response: reqwest::Response, limit: usize) -> Result<Vec<u8>, FetchError> {
    if let Some(length) = response.content_length() {
        if length > limit as u64 {
            return Err(FetchError::parse(format!("response body of {} bytes exceeds {} bytes", length, limit)));
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| classify_reqwest_error(&e))? {
        if body.len() + chunk.len() > limit {
            return Err(FetchError::parse(format!("response body exceeds {} bytes", limit)));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Map a transport error to a classified failure
pub fn classify_reqwest_error(err: &reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return FetchError::parse(err.to_string());
    }
    if let Some(classified) = err.status().and_then(classify_status) {
        return classified;
    }
    FetchError::new(FailureKind::Unreachable, err.to_string())
}

/// Map a non-success status to a classified failure, `None` for 2xx
pub fn classify_status(status: StatusCode) -> Option<FetchError> {
    if status.is_success() {
        return None;
    }

    let reason = match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => FailureKind::NotFound,
        StatusCode::TOO_MANY_REQUESTS => FailureKind::RateLimited,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => FailureKind::Timeout,
        _ => FailureKind::Unreachable,
    };

    Some(FetchError::new(reason, format!("HTTP {}", status)))
}
