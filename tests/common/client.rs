//! HTTP client for end-to-end tests
//!
//! This module wraps reqwest and provides methods for the player-facing
//! endpoints. Every request carries a player-style User-Agent.
//!
//! When routes or request formats change, update only this file.

#![allow(dead_code)]

use super::constants::*;
use reqwest::header::{IF_MODIFIED_SINCE, IF_NONE_MATCH, USER_AGENT};
use reqwest::{Method, Response};
use std::time::Duration;

/// HTTP test client impersonating one player
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    /// The User-Agent sent with every request
    pub user_agent: String,
}

/// Builds a User-Agent the way SMIL players format it
pub fn player_user_agent(uuid: &str, name: &str, model: &str) -> String {
    format!(
        "ADAPI/2.0 (UUID:{}; NAME:{}) test-firmware/1.0.3 (MODEL:{})",
        uuid, name, model
    )
}

impl TestClient {
    pub fn new(base_url: String, user_agent: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            user_agent,
        }
    }

    /// Creates a client for a full-shape player with the given uuid
    pub fn for_player(base_url: String, uuid: &str) -> Self {
        Self::new(base_url, player_user_agent(uuid, "Test Player", GARLIC_MODEL))
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(USER_AGENT, &self.user_agent)
    }

    // ========================================================================
    // Index Endpoints
    // ========================================================================

    pub async fn get_index(&self, device_key: &str) -> Response {
        self.request(Method::GET, &format!("/index/{}", device_key))
            .send()
            .await
            .expect("GET index request failed")
    }

    pub async fn head_index(&self, device_key: &str) -> Response {
        self.request(Method::HEAD, &format!("/index/{}", device_key))
            .send()
            .await
            .expect("HEAD index request failed")
    }

    pub async fn options_index(&self, device_key: &str) -> Response {
        self.request(Method::OPTIONS, &format!("/index/{}", device_key))
            .send()
            .await
            .expect("OPTIONS index request failed")
    }

    /// GET with optional `If-None-Match` and `If-Modified-Since`
    pub async fn get_index_conditional(
        &self,
        device_key: &str,
        if_none_match: Option<&str>,
        if_modified_since: Option<&str>,
    ) -> Response {
        let mut request = self.request(Method::GET, &format!("/index/{}", device_key));
        if let Some(etag) = if_none_match {
            request = request.header(IF_NONE_MATCH, etag);
        }
        if let Some(date) = if_modified_since {
            request = request.header(IF_MODIFIED_SINCE, date);
        }
        request
            .send()
            .await
            .expect("Conditional GET index request failed")
    }

    // ========================================================================
    // Task Schedule Endpoints
    // ========================================================================

    pub async fn get_task_schedule(&self, device_key: &str) -> Response {
        self.request(Method::GET, &format!("/task-schedule/{}", device_key))
            .send()
            .await
            .expect("GET task schedule request failed")
    }

    pub async fn get_task_schedule_conditional(
        &self,
        device_key: &str,
        if_none_match: &str,
    ) -> Response {
        self.request(Method::GET, &format!("/task-schedule/{}", device_key))
            .header(IF_NONE_MATCH, if_none_match)
            .send()
            .await
            .expect("Conditional GET task schedule request failed")
    }

    // ========================================================================
    // Server
    // ========================================================================

    pub async fn get_stats(&self) -> Response {
        self.request(Method::GET, "/")
            .send()
            .await
            .expect("GET stats request failed")
    }
}
