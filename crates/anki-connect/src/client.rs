//! AnkiConnect HTTP client.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::service::MediaService;
use crate::types::{Note, Request, Response};
use crate::{AnkiError, Result};

/// Default AnkiConnect endpoint.
pub const DEFAULT_URL: &str = "http://127.0.0.1:8765";

/// Per-request timeout applied unless overridden.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// JSON-RPC client for a running AnkiConnect add-on.
#[derive(Debug, Clone)]
pub struct AnkiConnect {
    client: Client,
    url: String,
}

impl AnkiConnect {
    /// Create a client for `url` with the default request timeout.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnkiError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Invoke an action and decode its `result`.
    ///
    /// A non-null `error` in the response, a non-success status or a body
    /// that is not the expected JSON are all reported as errors.
    pub async fn invoke<T: DeserializeOwned>(
        &self,
        action: &str,
        params: serde_json::Value,
    ) -> Result<T> {
        debug!("AnkiConnect {}", action);

        let response = self
            .client
            .post(&self.url)
            .json(&Request::new(action, params))
            .send()
            .await
            .map_err(|e| AnkiError::Connect {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnkiError::Http {
                action: action.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| AnkiError::Connect {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        decode_response(action, &body)
    }
}

/// Decode a raw response body into the action's result type.
fn decode_response<T: DeserializeOwned>(action: &str, body: &str) -> Result<T> {
    let malformed = |e: serde_json::Error| AnkiError::Malformed {
        action: action.to_string(),
        message: e.to_string(),
    };

    let response: Response = serde_json::from_str(body).map_err(malformed)?;
    if let Some(message) = response.error {
        return Err(AnkiError::Remote {
            action: action.to_string(),
            message,
        });
    }

    serde_json::from_value(response.result).map_err(malformed)
}

#[async_trait]
impl MediaService for AnkiConnect {
    async fn find_note_ids(&self, query: &str) -> Result<Vec<i64>> {
        self.invoke("findNotes", json!({ "query": query })).await
    }

    async fn notes_info(&self, ids: &[i64]) -> Result<Vec<Note>> {
        self.invoke("notesInfo", json!({ "notes": ids })).await
    }

    async fn media_file_names(&self, pattern: &str) -> Result<Vec<String>> {
        self.invoke("getMediaFilesNames", json!({ "pattern": pattern }))
            .await
    }

    async fn store_media_file(&self, filename: &str, path: &Path) -> Result<()> {
        // The result is the stored filename; only success matters here
        let _: serde_json::Value = self
            .invoke(
                "storeMediaFile",
                json!({
                    "filename": filename,
                    "path": path.to_string_lossy(),
                    "deleteExisting": true,
                }),
            )
            .await?;
        Ok(())
    }
}
