//! grabarr REST implementation of `BrowseBackend`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::BrowseError;
use super::types::{DirectoryEntry, RemoteTarget};
use super::BrowseBackend;
use crate::config::BrowserConfig;

#[derive(Serialize)]
struct OpenSessionRequest {
    remote_id: serde_json::Value,
}

#[derive(Deserialize)]
struct OpenSessionResponse {
    session_id: String,
}

#[derive(Serialize)]
struct ListRequest<'a> {
    path: &'a str,
}

/// FastAPI error body: `{"detail": "..."}`
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

pub struct HttpBrowseBackend {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
    bearer_token: Option<String>,
}

impl HttpBrowseBackend {
    pub fn new(config: &BrowserConfig) -> Result<Self, BrowseError> {
        let base_url = Url::parse(&config.api_base_url)
            .map_err(|e| BrowseError::InvalidBaseUrl(format!("{}: {}", config.api_base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| BrowseError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            bearer_token: config.bearer_token.clone(),
        })
    }

    /// Build `{base}/api/<segments...>`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BrowseError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BrowseError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(ref key) = self.api_key {
            builder = builder.header("x-api-key", key);
        } else if let Some(ref token) = self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, BrowseError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(BrowseError::Api {
            status: status.as_u16(),
            message: error_detail(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            }),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, BrowseError> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Extract FastAPI's `detail` message from an error body.
fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// grabarr remote ids are integers; anything else is sent as a string.
fn remote_id_value(target: &RemoteTarget) -> serde_json::Value {
    match target.as_str().parse::<u64>() {
        Ok(id) => serde_json::Value::from(id),
        Err(_) => serde_json::Value::from(target.as_str()),
    }
}

#[async_trait]
impl BrowseBackend for HttpBrowseBackend {
    async fn open_session(&self, target: &RemoteTarget) -> Result<String, BrowseError> {
        let url = self.endpoint(&["browse", "sessions"])?;
        debug!("Opening browse session for remote {}", target);
        let body = OpenSessionRequest {
            remote_id: remote_id_value(target),
        };
        let response: OpenSessionResponse =
            self.send_json(self.request(Method::POST, url).json(&body)).await?;
        Ok(response.session_id)
    }

    async fn close_session(&self, session_id: &str) -> Result<(), BrowseError> {
        let url = self.endpoint(&["browse", "sessions", session_id])?;
        match self.send(self.request(Method::DELETE, url)).await {
            Ok(_) => Ok(()),
            // Already gone (expired or closed twice)
            Err(BrowseError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn list_via_session(
        &self,
        session_id: &str,
        path: &str,
    ) -> Result<Vec<DirectoryEntry>, BrowseError> {
        let url = self.endpoint(&["browse", "sessions", session_id, "list"])?;
        let result = self
            .send_json(self.request(Method::POST, url).json(&ListRequest { path }))
            .await;
        match result {
            Err(BrowseError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(BrowseError::SessionNotFound(session_id.to_string()))
            }
            other => other,
        }
    }

    async fn list_stateless(
        &self,
        target: &RemoteTarget,
        path: &str,
    ) -> Result<Vec<DirectoryEntry>, BrowseError> {
        let url = self.endpoint(&["remotes", target.as_str(), "browse"])?;
        self.send_json(self.request(Method::POST, url).json(&ListRequest { path }))
            .await
    }
}
