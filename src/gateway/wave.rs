//! Wave mobile-money refund gateway.
//!
//! The only provider currently wired up for refunds. Wave identifies the
//! original charge by its own transaction id; the refund endpoint is
//! `POST /v1/transactions/{id}/refund`.

use crate::gateway::http::RpcHttpClient;
use crate::gateway::{GatewayRefundConfirmation, GatewayRefundRequest, ProviderGateway};
use crate::refund::error::{RefundError, RefundResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct WaveConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.wave.com".to_string(),
            timeout_secs: 30,
        }
    }
}

impl WaveConfig {
    pub fn from_env() -> RefundResult<Self> {
        let api_key = std::env::var("WAVE_API_KEY").map_err(|_| RefundError::Validation {
            message: "WAVE_API_KEY environment variable is required".to_string(),
            field: Some("WAVE_API_KEY".to_string()),
        })?;

        Ok(Self {
            base_url: std::env::var("WAVE_BASE_URL")
                .unwrap_or_else(|_| "https://api.wave.com".to_string()),
            timeout_secs: std::env::var("WAVE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
            api_key,
        })
    }
}

pub struct WaveGateway {
    config: WaveConfig,
    http: RpcHttpClient,
}

impl WaveGateway {
    pub fn new(config: WaveConfig) -> RefundResult<Self> {
        let http = RpcHttpClient::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self { config, http })
    }

    pub fn from_env() -> RefundResult<Self> {
        Self::new(WaveConfig::from_env()?)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }
}

#[derive(Debug, Deserialize)]
struct WaveRefundResponse {
    id: String,
    status: String,
    #[serde(default)]
    payment_reason: Option<String>,
}

#[async_trait]
impl ProviderGateway for WaveGateway {
    async fn refund(
        &self,
        request: GatewayRefundRequest,
    ) -> RefundResult<GatewayRefundConfirmation> {
        let payload = serde_json::json!({
            "amount": request.amount.to_string(),
            "currency": request.currency,
            "reason": request.reason,
            "merchant_id": request.merchant_id,
        });

        let url = self.endpoint(&format!(
            "/v1/transactions/{}/refund",
            request.provider_transaction_id
        ));

        let raw: WaveRefundResponse = self
            .http
            .request_json(
                reqwest::Method::POST,
                &url,
                Some(&self.config.api_key),
                Some(&payload),
            )
            .await
            // Keep the transport detail (HTTP status and body) verbatim so
            // a provider decline is not flattened into a generic message.
            .map_err(|e| RefundError::Gateway {
                provider: "wave".to_string(),
                message: e.to_string(),
                provider_code: None,
            })?;

        // Wave reports declines with a 2xx envelope and a non-success status.
        if raw.status != "succeeded" && raw.status != "processing" {
            return Err(RefundError::Gateway {
                provider: "wave".to_string(),
                message: raw
                    .payment_reason
                    .unwrap_or_else(|| format!("refund declined with status {}", raw.status)),
                provider_code: Some(raw.status),
            });
        }

        info!(
            provider_refund_id = %raw.id,
            provider_transaction_id = %request.provider_transaction_id,
            "wave refund accepted"
        );

        Ok(GatewayRefundConfirmation {
            provider_refund_id: raw.id,
            provider_data: None,
        })
    }

    fn provider_name(&self) -> &'static str {
        "wave"
    }
}
