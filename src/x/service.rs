// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! HTTPS connector for the X API.
//!
//! Service structures in this module provide a low-level way to interact
//! with the X API over HTTPS, essentially a specialized HTTPS client
//! specifically for X. Authentication is app-only: a bearer token read
//! from the environment, attached to every request.

use crate::response::{ApiResponse, Fields};
use serde_json::Value;
use std::env;
use thiserror::Error;

/// Base URL for X API v2 endpoints.
pub const API_BASE: &str = "https://api.x.com/2";

/// Environment variable holding the app-only bearer token.
pub const BEARER_TOKEN_VAR: &str = "X_BEARER_TOKEN";

/// The result of a request made in raw mode: the plain HTTP response,
/// before any parsing, for debugging.
#[derive(Debug)]
pub struct Raw {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Rate-limit counters surfaced from `x-rate-limit-*` response headers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    pub reset: Option<u64>,
}

/// An error from the X API or the transport underneath it.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The bearer token is missing from the environment.
    #[error("{BEARER_TOKEN_VAR} is not set; export an app-only bearer token to use the API.")]
    MissingToken,

    /// An error that occurred while making an HTTP request.
    #[error("Error while making HTTP request: {0}")]
    Request(#[from] reqwest::Error),

    /// An unsuccessful HTTP status code, with whatever detail the
    /// response body carried.
    #[error("{0}")]
    Api(ApiFailure),
}

/// Details of a non-2xx API response.
#[derive(Debug)]
pub struct ApiFailure {
    pub status: u16,
    pub detail: Vec<String>,
    pub rate_limit: RateLimit,
}

impl ApiFailure {
    fn hint(&self) -> Option<&'static str> {
        match self.status {
            401 | 403 => Some("Check that X_BEARER_TOKEN holds a valid app-only bearer token."),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Request returned HTTP {}.", self.status)?;
        if self.status == 429 {
            let show = |v: Option<u64>| v.map_or("?".to_string(), |v| v.to_string());
            write!(
                f,
                " Rate limited: {} of {} requests remaining, window resets at {}.",
                show(self.rate_limit.remaining),
                show(self.rate_limit.limit),
                show(self.rate_limit.reset),
            )?;
        }
        for line in &self.detail {
            write!(f, "\n  {line}")?;
        }
        if let Some(hint) = self.hint() {
            write!(f, "\n{hint}")?;
        }
        Ok(())
    }
}

/// A service for making requests against the X API.
///
/// Using this trait, clients can implement different ways of connecting
/// to the X API, such as an actual connector for production code, and a
/// mocked connector for testing purposes.
pub trait Service {
    /// Performs a GET request and returns the parsed, normalized response.
    fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> impl Future<Output = Result<ApiResponse, ServiceError>>;

    /// Performs a GET request and returns the plain HTTP response.
    fn get_raw(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> impl Future<Output = Result<Raw, ServiceError>>;
}

/// A service that contacts the X API directly.
pub struct XService {
    client: reqwest::Client,
    bearer_token: String,
}

impl XService {
    /// Creates a service using the bearer token in the environment.
    pub fn from_env() -> Result<Self, ServiceError> {
        let bearer_token =
            env::var(BEARER_TOKEN_VAR).map_err(|_| ServiceError::MissingToken)?;
        if bearer_token.trim().is_empty() {
            return Err(ServiceError::MissingToken);
        }
        Ok(XService::new(bearer_token))
    }

    /// Creates a service with an explicit bearer token.
    pub fn new(bearer_token: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(XService::user_agent())
            .build()
            // According to the docs, build() only fails if a TLS backend
            // cannot be initialized, or if DNS resolution cannot be
            // initialized, and neither is recoverable for us.
            .expect("could not create a new HTTP client");
        XService {
            client,
            bearer_token,
        }
    }

    fn user_agent() -> String {
        format!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    fn uri(&self, path: &str) -> String {
        format!("{API_BASE}/{}", path.trim_start_matches('/'))
    }

    async fn send(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<reqwest::Response, ServiceError> {
        let resp = self
            .client
            .get(self.uri(path))
            .query(query)
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;
        Ok(resp)
    }
}

/// Pulls the `x-rate-limit-*` counters out of a header list.
pub fn rate_limit_from_headers(headers: &[(String, String)]) -> RateLimit {
    let value = |name: &str| {
        headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, value)| value.parse().ok())
    };
    RateLimit {
        limit: value("x-rate-limit-limit"),
        remaining: value("x-rate-limit-remaining"),
        reset: value("x-rate-limit-reset"),
    }
}

/// Pulls human-readable detail lines out of a response body's `errors`
/// array, tolerating both `title`/`detail` and `message` shapes.
pub fn error_detail(body: &str) -> Vec<String> {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return vec![];
    };
    let Some(errors) = value.array_field("errors") else {
        return vec![];
    };
    errors
        .iter()
        .filter_map(|error| {
            let title = error.str_field("title");
            let detail = error
                .str_field("detail")
                .or_else(|| error.str_field("message"));
            match (title, detail) {
                (Some(title), Some(detail)) => Some(format!("{title}: {detail}")),
                (Some(title), None) => Some(title.to_string()),
                (None, Some(detail)) => Some(detail.to_string()),
                (None, None) => None,
            }
        })
        .collect()
}

fn header_list(resp: &reqwest::Response) -> Vec<(String, String)> {
    resp.headers()
        .iter()
        .map(|(key, value)| {
            (
                key.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

impl Service for XService {
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<ApiResponse, ServiceError> {
        let resp = self.send(path, query).await?;
        let status = resp.status();
        let headers = header_list(&resp);
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(ServiceError::Api(ApiFailure {
                status: status.as_u16(),
                detail: error_detail(&body),
                rate_limit: rate_limit_from_headers(&headers),
            }));
        }

        let value = serde_json::from_str(&body).unwrap_or(Value::Null);
        Ok(ApiResponse::from_value(value))
    }

    async fn get_raw(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Raw, ServiceError> {
        let resp = self.send(path, query).await?;
        let status = resp.status().as_u16();
        let headers = header_list(&resp);
        let body = resp.text().await?;
        Ok(Raw {
            status,
            headers,
            body,
        })
    }
}
