//! Remote merge endpoint client.
//!
//! One authenticated POST per merge:
//! `{ "recipes": [a, b] }` → `{ "syncedRecipe": "..." }`, or
//! `{ "error": "..." }` with a non-success status.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use stacker_core::config::SyncConfig;
use stacker_core::error::{Result, StackError};

const USER_AGENT: &str = concat!("recipe-stacker/", env!("CARGO_PKG_VERSION"));

/// Message used when a failed response carries no readable error.
pub const GENERIC_FAILURE: &str = "API request failed";

/// Merges two recipe documents into one.
#[async_trait]
pub trait MergeService: Send + Sync {
    /// Return the merged markdown document for `first` and `second`.
    async fn merge(&self, api_key: &str, first: &str, second: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct MergeRequest<'a> {
    recipes: [&'a str; 2],
}

#[derive(Debug, Deserialize)]
struct MergeResponse {
    #[serde(rename = "syncedRecipe")]
    synced_recipe: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// [`MergeService`] over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpMergeService {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpMergeService {
    /// # Errors
    ///
    /// Returns [`StackError::Config`] if no endpoint is configured, or
    /// [`StackError::Network`] if the HTTP client cannot be built.
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let endpoint = config.require_endpoint()?.to_string();
        Self::with_timeout(endpoint, config.timeout)
    }

    /// # Errors
    ///
    /// Returns [`StackError::Network`] if the HTTP client cannot be built.
    pub fn with_timeout(endpoint: String, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| StackError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl MergeService for HttpMergeService {
    async fn merge(&self, api_key: &str, first: &str, second: &str) -> Result<String> {
        tracing::debug!(endpoint = %self.endpoint, "Requesting recipe merge");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("X-Api-Key", api_key)
            .json(&MergeRequest {
                recipes: [first, second],
            })
            .send()
            .await
            .map_err(|e| StackError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            tracing::error!(status = status.as_u16(), %message, "Recipe merge rejected");
            return Err(StackError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        let merged: MergeResponse = response.json().await.map_err(|e| StackError::Remote {
            status: status.as_u16(),
            message: format!("malformed merge response: {e}"),
        })?;
        Ok(merged.synced_recipe)
    }
}
