//! Provider-merchant-id lookup.
//!
//! Some providers accept the platform's merchant identity alongside a
//! refund. The lookup is best-effort enrichment, not a precondition: a
//! failure here is logged and the refund proceeds without it.

use crate::gateway::http::RpcHttpClient;
use crate::refund::error::{RefundError, RefundResult};
use crate::refund::types::ProviderCode;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

#[async_trait]
pub trait MerchantDirectory: Send + Sync {
    async fn provider_merchant_id(
        &self,
        organization_id: Uuid,
        provider: ProviderCode,
    ) -> RefundResult<String>;
}

/// Run the directory lookup under the explicit best-effort policy: a
/// failure is logged and collapsed to `None` instead of propagating.
pub async fn best_effort_merchant_id(
    directory: &dyn MerchantDirectory,
    organization_id: Uuid,
    provider: ProviderCode,
) -> Option<String> {
    match directory
        .provider_merchant_id(organization_id, provider)
        .await
    {
        Ok(merchant_id) => Some(merchant_id),
        Err(e) => {
            warn!(
                organization_id = %organization_id,
                provider = %provider,
                error = %e,
                "provider merchant-id lookup failed, continuing without it"
            );
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct MerchantDirectoryConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl MerchantDirectoryConfig {
    pub fn from_env() -> RefundResult<Self> {
        let base_url =
            std::env::var("MERCHANT_DIRECTORY_BASE_URL").map_err(|_| RefundError::Validation {
                message: "MERCHANT_DIRECTORY_BASE_URL environment variable is required"
                    .to_string(),
                field: Some("MERCHANT_DIRECTORY_BASE_URL".to_string()),
            })?;
        let api_key =
            std::env::var("MERCHANT_DIRECTORY_API_KEY").map_err(|_| RefundError::Validation {
                message: "MERCHANT_DIRECTORY_API_KEY environment variable is required".to_string(),
                field: Some("MERCHANT_DIRECTORY_API_KEY".to_string()),
            })?;

        Ok(Self {
            base_url,
            api_key,
            timeout_secs: std::env::var("MERCHANT_DIRECTORY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        })
    }
}

pub struct HttpMerchantDirectory {
    config: MerchantDirectoryConfig,
    http: RpcHttpClient,
}

impl HttpMerchantDirectory {
    pub fn new(config: MerchantDirectoryConfig) -> RefundResult<Self> {
        let http = RpcHttpClient::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self { config, http })
    }

    pub fn from_env() -> RefundResult<Self> {
        Self::new(MerchantDirectoryConfig::from_env()?)
    }
}

#[derive(Debug, Deserialize)]
struct MerchantLookupResponse {
    merchant_id: String,
}

#[async_trait]
impl MerchantDirectory for HttpMerchantDirectory {
    async fn provider_merchant_id(
        &self,
        organization_id: Uuid,
        provider: ProviderCode,
    ) -> RefundResult<String> {
        let url = format!(
            "{}/organizations/{}/providers/{}/merchant",
            self.config.base_url,
            organization_id,
            provider.as_str()
        );

        let response: MerchantLookupResponse = self
            .http
            .request_json(reqwest::Method::GET, &url, Some(&self.config.api_key), None)
            .await
            .map_err(|e| RefundError::ProviderLookup {
                message: e.to_string(),
            })?;

        Ok(response.merchant_id)
    }
}
