pub mod auth;
pub mod service_announcement;
pub mod sharepoint;
pub mod teams;

use crate::config::{ConfigManager, ConnectionConfig};
use crate::error::{M365Error, Result};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const GRAPH_RESOURCE: &str = "https://graph.microsoft.com";

/// SharePoint REST: plain JSON without OData annotations
pub const ODATA_NOMETADATA: &str = "application/json;odata=nometadata";
/// Graph: plain JSON without OData annotations
pub const ODATA_METADATA_NONE: &str = "application/json;odata.metadata=none";

/// Retry behaviour for transient failures (429, 5xx, connection errors).
/// Clients send every request once unless a policy is set explicitly.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// +/- fraction of the backoff added as jitter
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// Single attempt, failures surface immediately
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::transient()
        }
    }

    /// Three attempts with capped exponential backoff between them
    pub fn transient() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_millis(30000),
            jitter: 0.3,
        }
    }

    /// Exponential backoff with jitter for the given zero-based attempt
    fn backoff(&self, attempt: u32) -> Duration {
        let initial = self.initial_backoff.as_millis() as u64;
        let base = initial.saturating_mul(2u64.saturating_pow(attempt));
        let capped = base.min(self.max_backoff.as_millis() as u64);

        let jitter_range = (capped as f64 * self.jitter) as u64;
        let jitter = if jitter_range > 0 {
            use std::hash::{Hash, Hasher};
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            std::time::SystemTime::now().hash(&mut hasher);
            (hasher.finish() % (jitter_range * 2)) as i64 - jitter_range as i64
        } else {
            0
        };

        Duration::from_millis((capped as i64 + jitter).max(0) as u64)
    }
}

/// A single REST call: method, absolute URL, accept header, extra headers and
/// an optional JSON body
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    url: String,
    accept: &'static str,
    headers: Vec<(&'static str, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            accept: "application/json",
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn accept(mut self, accept: &'static str) -> Self {
        self.accept = accept;
        self
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

}

/// Generic OData collection page
#[derive(Debug, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    /// Graph uses `@odata.nextLink`, SharePoint nometadata uses `odata.nextLink`
    #[serde(rename = "@odata.nextLink", alias = "odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// Bearer-authenticated client for Graph and SharePoint REST
pub struct RestClient {
    client: Client,
    access_token: String,
    graph_base: String,
    retry: RetryPolicy,
}

impl RestClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            access_token: access_token.into(),
            graph_base: GRAPH_RESOURCE.to_string(),
            retry: RetryPolicy::none(),
        }
    }

    /// Acquire a token for `resource` on behalf of the connection and build a client
    pub async fn for_resource(
        config: &ConfigManager,
        connection: &ConnectionConfig,
        resource: &str,
    ) -> Result<Self> {
        let graph_auth = auth::GraphAuth::new(config.clone());
        let access_token = graph_auth.get_access_token(connection, resource).await?;

        Ok(Self::new(access_token))
    }

    /// Point Graph requests at another host (national clouds, mock servers)
    pub fn with_graph_base(mut self, base: impl Into<String>) -> Self {
        self.graph_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Absolute Graph URL for a path such as `/v1.0/teams/{id}`
    pub fn graph_url(&self, path: &str) -> String {
        format!("{}/{}", self.graph_base, path.trim_start_matches('/'))
    }

    /// Send a request and deserialize the response body. An empty body
    /// deserializes as JSON `null`.
    pub async fn execute<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let text = self.send(request).await?;
        let body = if text.trim().is_empty() { "null" } else { &text };
        Ok(serde_json::from_str(body)?)
    }

    /// Send a request whose response body is irrelevant (204, empty 200)
    pub async fn execute_no_content(&self, request: &ApiRequest) -> Result<()> {
        self.send(request).await.map(|_| ())
    }

    /// GET every page of a collection by following the next link
    pub async fn get_all_items<T: DeserializeOwned>(
        &self,
        url: &str,
        accept: &'static str,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());

        while let Some(current) = next.take() {
            let page: PaginatedResponse<T> =
                self.execute(&ApiRequest::get(current).accept(accept)).await?;
            items.extend(page.value);
            next = page.next_link;
        }

        Ok(items)
    }

    /// Send with retry for transient failures; returns the body of a
    /// successful response
    async fn send(&self, request: &ApiRequest) -> Result<String> {
        let max_attempts = self.retry.max_attempts.max(1);

        for attempt in 0..max_attempts {
            let can_retry = attempt + 1 < max_attempts;
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                attempt = attempt + 1,
                "request"
            );

            let mut builder = self
                .client
                .request(request.method.clone(), &request.url)
                .bearer_auth(&self.access_token)
                .header(ACCEPT, request.accept);
            for (name, value) in &request.headers {
                builder = builder.header(*name, value.as_str());
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            match builder.send().await {
                Ok(resp) => {
                    let status = resp.status();

                    if status == StatusCode::TOO_MANY_REQUESTS && can_retry {
                        let wait_time = resp
                            .headers()
                            .get("Retry-After")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .map(Duration::from_secs)
                            .unwrap_or(self.retry.initial_backoff);
                        tracing::warn!(
                            "Rate limited (429). Retrying in {:?}... (attempt {}/{})",
                            wait_time,
                            attempt + 1,
                            max_attempts
                        );
                        tokio::time::sleep(wait_time).await;
                        continue;
                    }

                    if status.is_server_error() && can_retry {
                        let wait_time = self.retry.backoff(attempt);
                        tracing::warn!(
                            "Server error ({}). Retrying in {:?}... (attempt {}/{})",
                            status,
                            wait_time,
                            attempt + 1,
                            max_attempts
                        );
                        tokio::time::sleep(wait_time).await;
                        continue;
                    }

                    let text = resp.text().await?;
                    if !status.is_success() {
                        tracing::debug!(%status, body = %text, "request failed");
                        return Err(M365Error::from_response(status, &text));
                    }
                    return Ok(text);
                }
                Err(e) if can_retry && (e.is_connect() || e.is_timeout()) => {
                    let wait_time = self.retry.backoff(attempt);
                    tracing::warn!(
                        "Connection error: {}. Retrying in {:?}... (attempt {}/{})",
                        e,
                        wait_time,
                        attempt + 1,
                        max_attempts
                    );
                    tokio::time::sleep(wait_time).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(M365Error::CommandError(format!(
            "{} {} failed after {} attempts",
            request.method, request.url, max_attempts
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            jitter: 0.0,
            ..RetryPolicy::transient()
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(1000));
        assert_eq!(policy.backoff(2), Duration::from_millis(4000));
        assert_eq!(policy.backoff(10), Duration::from_millis(30000));
    }

    #[test]
    fn test_backoff_jitter_within_range() {
        let policy = RetryPolicy::transient();
        let wait = policy.backoff(1).as_millis();
        assert!((1400..=2600).contains(&wait));
    }

    #[test]
    fn test_default_policy_sends_once() {
        assert_eq!(RetryPolicy::default().max_attempts, 1);
        assert_eq!(RestClient::new("token").retry.max_attempts, 1);
    }

    #[test]
    fn test_graph_url_joins_paths() {
        let client = RestClient::new("token").with_graph_base("http://localhost:1234/");
        assert_eq!(
            client.graph_url("/v1.0/teams/1"),
            "http://localhost:1234/v1.0/teams/1"
        );
    }

    #[test]
    fn test_paginated_response_accepts_both_next_link_forms() {
        let graph: PaginatedResponse<Value> =
            serde_json::from_str(r#"{"value":[1],"@odata.nextLink":"https://next"}"#).unwrap();
        assert_eq!(graph.next_link.as_deref(), Some("https://next"));

        let spo: PaginatedResponse<Value> =
            serde_json::from_str(r#"{"value":[],"odata.nextLink":"https://spo-next"}"#).unwrap();
        assert_eq!(spo.next_link.as_deref(), Some("https://spo-next"));

        let last: PaginatedResponse<Value> = serde_json::from_str(r#"{"value":[]}"#).unwrap();
        assert!(last.next_link.is_none());
    }
}
