//! HTTP transport for the sync exchange

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use super::{CloudExchange, InboundDelta, SyncRequest};
use crate::config::ClientConfig;
use crate::util::{compact_text, is_http_url, normalize_text_option};

const SYNC_PATH: &str = "/v1/sync";

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("Invalid sync configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Sync HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Sync API error: {0}")]
    Api(String),
}

impl From<CloudError> for crate::Error {
    fn from(error: CloudError) -> Self {
        Self::Sync(error.to_string())
    }
}

/// Talks to the sync endpoint of a Leaflet server
#[derive(Clone)]
pub struct HttpCloudClient {
    endpoint: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpCloudClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpCloudClient")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl HttpCloudClient {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, CloudError> {
        let base = normalize_base_url(base_url.into())?;
        Ok(Self {
            endpoint: format!("{base}{SYNC_PATH}"),
            token: normalize_text_option(token),
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, CloudError> {
        let base_url = config.api_base_url.clone().ok_or_else(|| {
            CloudError::InvalidConfiguration("api_base_url is not set".to_string())
        })?;
        Self::new(base_url, config.api_token.clone(), config.sync_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, request: &SyncRequest) -> Result<InboundDelta, CloudError> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .json(request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CloudError::Api(parse_api_error(status, &body)));
        }

        Ok(response.json::<InboundDelta>().await?)
    }
}

impl CloudExchange for HttpCloudClient {
    async fn exchange(&self, request: SyncRequest) -> crate::Result<InboundDelta> {
        Ok(self.post(&request).await?)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_base_url(raw: String) -> Result<String, CloudError> {
    let base = normalize_text_option(Some(raw)).ok_or_else(|| {
        CloudError::InvalidConfiguration("api_base_url must not be empty".to_string())
    })?;
    if is_http_url(&base) {
        Ok(base.trim_end_matches('/').to_string())
    } else {
        Err(CloudError::InvalidConfiguration(
            "api_base_url must include http:// or https://".to_string(),
        ))
    }
}
