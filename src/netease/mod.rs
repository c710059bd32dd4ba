//! # NetEase Cloud Music API client
//!
//! Thin async client for the NeteaseCloudMusicApi node server. The server is
//! an external collaborator; this module only speaks its request/response
//! JSON protocol.
//!
//! ## Layout
//!
//! ```text
//! CLI Layer
//!     ↓
//! ApiClient (retry, cookie, API codes)
//!     ├── login  (QR key, QR image, polling, status, logout)
//!     ├── album  (album detail → library tracks)
//!     ├── song   (download URL per quality level)
//!     └── server (optional launcher for the node process)
//!          ↓
//! reqwest
//! ```
//!
//! ## Error handling
//!
//! Connection failures, timeouts and HTTP 429/502/503/504 are retried up to
//! three times with a linear back-off; `Retry-After` is honoured up to 120
//! seconds. The API signals "not logged in" with code 301, either as HTTP
//! status or in the body, which surfaces as [`ApiError::NotLoggedIn`] so the
//! caller can run the QR login again.

pub mod album;
pub mod login;
pub mod server;
pub mod song;

use std::{fmt, time::Duration};

use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::sleep;

use crate::{config, debug, warning};

const MAX_ATTEMPTS: u32 = 3;
const MAX_RETRY_AFTER_SECS: u64 = 120;
const CODE_OK: i64 = 200;
const CODE_NOT_LOGGED_IN: i64 = 301;

#[derive(Debug)]
pub enum ApiError {
    Http(reqwest::Error),
    Decode(serde_json::Error),
    NotLoggedIn,
    Api { code: i64, message: String },
    Unavailable(StatusCode),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Http(e) => write!(f, "HTTP error: {}", e),
            ApiError::Decode(e) => write!(f, "unexpected response: {}", e),
            ApiError::NotLoggedIn => write!(f, "not logged in"),
            ApiError::Api { code, message } => write!(f, "API error {}: {}", code, message),
            ApiError::Unavailable(status) => {
                write!(f, "service unavailable after {} attempts ({})", MAX_ATTEMPTS, status)
            }
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
    cookie: Option<String>,
    retry_delay: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            cookie: None,
            retry_delay: Duration::from_secs(2),
        })
    }

    pub fn from_config() -> Result<Self, ApiError> {
        Self::new(&config::api_url(), config::http_timeout())
    }

    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie;
        self
    }

    /// Base delay between retries; attempt `n` waits `n * delay`.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn set_cookie(&mut self, cookie: Option<String>) {
        self.cookie = cookie;
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    /// GET `path`, decode the body and require API code 200.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let value = self.get_value(path, params).await?;
        if let Some(code) = value.get("code").and_then(Value::as_i64) {
            if code != CODE_OK {
                return Err(ApiError::Api {
                    code,
                    message: message_of(&value),
                });
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    /// GET `path` and return the raw JSON body. Only transport failures and
    /// "not logged in" are treated as errors here.
    pub async fn get_value(&self, path: &str, params: &[(&str, String)]) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let mut query: Vec<(&str, String)> = params.to_vec();
        query.push(("timestamp", Utc::now().timestamp_millis().to_string()));
        if let Some(cookie) = &self.cookie {
            query.push(("cookie", cookie.clone()));
        }

        let mut attempt = 1;
        loop {
            debug!("GET {} (attempt {}/{})", path, attempt, MAX_ATTEMPTS);
            let response = match self.http.get(&url).query(&query).send().await {
                Ok(resp) => resp,
                Err(err) if is_transient(&err) && attempt < MAX_ATTEMPTS => {
                    warning!("Request to {} failed ({}), retrying...", path, err);
                    sleep(self.retry_delay * attempt).await;
                    attempt += 1;
                    continue;
                }
                Err(err) => return Err(ApiError::Http(err)),
            };

            let status = response.status();
            if is_retryable_status(status) {
                if attempt >= MAX_ATTEMPTS {
                    return Err(ApiError::Unavailable(status));
                }
                let wait = retry_after(&response).unwrap_or(self.retry_delay * attempt);
                warning!("{} answered {}, retrying in {:?}...", path, status, wait);
                sleep(wait).await;
                attempt += 1;
                continue;
            }

            if status.as_u16() as i64 == CODE_NOT_LOGGED_IN {
                return Err(ApiError::NotLoggedIn);
            }

            let body = response.text().await?;
            let value: Value = serde_json::from_str(&body)?;

            if value.get("code").and_then(Value::as_i64) == Some(CODE_NOT_LOGGED_IN) {
                return Err(ApiError::NotLoggedIn);
            }

            if status.is_client_error() || status.is_server_error() {
                return Err(ApiError::Api {
                    code: value
                        .get("code")
                        .and_then(Value::as_i64)
                        .unwrap_or(status.as_u16() as i64),
                    message: message_of(&value),
                });
            }

            return Ok(value);
        }
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || err.is_request()
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    let value = response.headers().get("retry-after")?.to_str().ok()?;
    parse_retry_after(value)
}

/// Delay from a `Retry-After` value in seconds, capped at 120 seconds.
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs = value.trim().parse::<u64>().ok()?;
    if secs > MAX_RETRY_AFTER_SECS {
        warning!(
            "Retry-After of {} seconds is too long, capping at {}.",
            secs,
            MAX_RETRY_AFTER_SECS
        );
    }
    Some(Duration::from_secs(secs.min(MAX_RETRY_AFTER_SECS)))
}

fn message_of(value: &Value) -> String {
    ["message", "msg"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .unwrap_or("no message")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_is_read_in_seconds() {
        assert_eq!(parse_retry_after("5"), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after(" 0 "), Some(Duration::ZERO));
    }

    #[test]
    fn retry_after_is_capped() {
        assert_eq!(
            parse_retry_after("3600"),
            Some(Duration::from_secs(MAX_RETRY_AFTER_SECS))
        );
        assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
    }

    #[test]
    fn retry_after_ignores_dates_and_garbage() {
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
        assert_eq!(parse_retry_after("-1"), None);
        assert_eq!(parse_retry_after(""), None);
    }
}
