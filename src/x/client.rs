// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! High-level lookups against the X API.
//!
//! Requests are described by [`Request`] values built by the free
//! functions in this module, then executed through a [`Service`]. The
//! builders apply the default field presets; a caller that wants
//! different fields overrides them on the returned request before
//! fetching.

use crate::response::ApiResponse;
use crate::x::service::{Raw, Service, ServiceError};

/// Default field selections requested for each kind of object.
pub mod presets {
    pub const USER_FIELDS: &str =
        "created_at,description,location,name,public_metrics,url,username,verified";
    pub const POST_FIELDS: &str =
        "attachments,author_id,created_at,entities,lang,public_metrics,referenced_tweets";
    pub const MEDIA_FIELDS: &str = "media_key,preview_image_url,type,url,alt_text";
    pub const EXPANSIONS: &str = "attachments.media_keys,author_id,referenced_tweets.id";
}

/// A described API request: a path under the API base plus its query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Request {
    fn new(path: impl Into<String>) -> Self {
        Request {
            path: path.into(),
            query: vec![],
        }
    }

    fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Replaces the value of a query parameter, or adds it.
    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.retain(|(existing, _)| existing != key);
        self.query.push((key.to_string(), value.into()));
        self
    }
}

/// Looks up up to 100 users by username.
pub fn users_by_usernames(usernames: &[String]) -> Request {
    Request::new("users/by")
        .param("usernames", usernames.join(","))
        .param("user.fields", presets::USER_FIELDS)
}

/// Looks up up to 100 users by ID.
pub fn users_by_ids(ids: &[String]) -> Request {
    Request::new("users")
        .param("ids", ids.join(","))
        .param("user.fields", presets::USER_FIELDS)
}

/// Looks up up to 100 posts by ID, with media and quoted-post expansions.
pub fn posts_by_ids(ids: &[String]) -> Request {
    Request::new("tweets")
        .param("ids", ids.join(","))
        .param("tweet.fields", presets::POST_FIELDS)
        .param("media.fields", presets::MEDIA_FIELDS)
        .param("expansions", presets::EXPANSIONS)
}

/// Searches recent posts. `limit` is clamped to the API's 10..=100 range.
pub fn search_recent(query: &str, limit: u32) -> Request {
    Request::new("tweets/search/recent")
        .param("query", query)
        .param("max_results", limit.clamp(10, 100).to_string())
        .param("tweet.fields", presets::POST_FIELDS)
        .param("media.fields", presets::MEDIA_FIELDS)
        .param("expansions", presets::EXPANSIONS)
}

/// Fetches trending topics for a WOEID.
pub fn trends_by_woeid(woeid: i64) -> Request {
    Request::new(format!("trends/by/woeid/{woeid}"))
}

/// Executes [`Request`]s against a [`Service`].
pub struct Client<S: Service> {
    service: S,
}

impl<S: Service> Client<S> {
    /// Wraps a service in a client.
    pub fn new(service: S) -> Self {
        Client { service }
    }

    /// Fetches a request and returns the parsed, normalized response.
    pub async fn fetch(&self, request: &Request) -> Result<ApiResponse, ServiceError> {
        self.service.get(&request.path, &request.query).await
    }

    /// Fetches a request in raw mode, surfacing the plain HTTP response.
    pub async fn fetch_raw(&self, request: &Request) -> Result<Raw, ServiceError> {
        self.service.get_raw(&request.path, &request.query).await
    }
}
