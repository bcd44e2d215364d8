//! Shared HTTP plumbing for provider and platform RPC clients.

use crate::refund::error::RefundError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;

/// Transport-level failure from an RPC call. Carries the verbatim HTTP
/// status and body so callers can surface the remote detail instead of a
/// generic message.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RpcError {
    message: String,
}

impl RpcError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<RpcError> for RefundError {
    fn from(error: RpcError) -> Self {
        RefundError::Unknown {
            message: error.to_string(),
        }
    }
}

/// Thin JSON client used by the gateway and the ledger/directory RPC
/// clients. Deliberately single-attempt: the refund flow moves money, and a
/// blind transport retry after an ambiguous failure could refund twice.
#[derive(Clone)]
pub struct RpcHttpClient {
    client: Client,
    timeout: Duration,
}

impl RpcHttpClient {
    pub fn new(timeout: Duration) -> Result<Self, RpcError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::new(format!("failed to initialize HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: &str,
        bearer_token: Option<&str>,
        body: Option<&JsonValue>,
    ) -> Result<T, RpcError> {
        let mut request = self.client.request(method, url).timeout(self.timeout);

        if let Some(token) = bearer_token {
            request = request.bearer_auth(token);
        }
        if let Some(payload) = body {
            request = request.json(payload);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RpcError::new(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(RpcError::new(format!("HTTP {}: {}", status, text)));
        }

        serde_json::from_str::<T>(&text)
            .map_err(|e| RpcError::new(format!("invalid JSON response from {}: {}", url, e)))
    }
}
