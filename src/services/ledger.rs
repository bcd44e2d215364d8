//! Ledger/audit RPC client.
//!
//! The ledger is the platform's authoritative financial record store. A
//! refund only counts once the ledger has it; the store side flips the
//! transaction to `refunded` as a side effect of the ledger write.

use crate::gateway::http::RpcHttpClient;
use crate::refund::error::{RefundError, RefundResult};
use crate::refund::types::ProviderCode;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

/// Everything the ledger needs to persist one refund.
#[derive(Debug, Clone)]
pub struct CreateRefundRecord {
    pub organization_id: Uuid,
    pub transaction_id: Uuid,
    pub amount: Decimal,
    pub reason: String,
    pub provider: ProviderCode,
    pub provider_transaction_id: String,
    pub provider_refund_id: String,
    pub provider_merchant_id: Option<String>,
    pub processing_fee: Decimal,
    pub net_amount: Decimal,
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Persist the refund record. Returns the ledger-side refund id.
    async fn create_refund(&self, record: CreateRefundRecord) -> RefundResult<String>;
}

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl LedgerConfig {
    pub fn from_env() -> RefundResult<Self> {
        let base_url = std::env::var("LEDGER_BASE_URL").map_err(|_| RefundError::Validation {
            message: "LEDGER_BASE_URL environment variable is required".to_string(),
            field: Some("LEDGER_BASE_URL".to_string()),
        })?;
        let api_key = std::env::var("LEDGER_API_KEY").map_err(|_| RefundError::Validation {
            message: "LEDGER_API_KEY environment variable is required".to_string(),
            field: Some("LEDGER_API_KEY".to_string()),
        })?;

        Ok(Self {
            base_url,
            api_key,
            timeout_secs: std::env::var("LEDGER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
        })
    }
}

pub struct HttpLedgerClient {
    config: LedgerConfig,
    http: RpcHttpClient,
}

impl HttpLedgerClient {
    pub fn new(config: LedgerConfig) -> RefundResult<Self> {
        let http = RpcHttpClient::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self { config, http })
    }

    pub fn from_env() -> RefundResult<Self> {
        Self::new(LedgerConfig::from_env()?)
    }
}

#[derive(Debug, Deserialize)]
struct LedgerRefundResponse {
    refund_id: String,
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn create_refund(&self, record: CreateRefundRecord) -> RefundResult<String> {
        let payload = serde_json::json!({
            "organization_id": record.organization_id,
            "transaction_id": record.transaction_id,
            "amount": record.amount.to_string(),
            "reason": record.reason,
            "provider": record.provider.as_str(),
            "provider_transaction_id": record.provider_transaction_id,
            "provider_refund_id": record.provider_refund_id,
            "provider_merchant_id": record.provider_merchant_id,
            "metadata": {
                "processing_fee": record.processing_fee.to_string(),
                "net_amount": record.net_amount.to_string(),
            },
        });

        let url = format!("{}/rpc/create_refund", self.config.base_url);
        let response: LedgerRefundResponse = self
            .http
            .request_json(
                reqwest::Method::POST,
                &url,
                Some(&self.config.api_key),
                Some(&payload),
            )
            .await
            // The message feeds the reconciliation alert; keep the real
            // transport detail rather than the user-facing generic text.
            .map_err(|e| RefundError::Ledger {
                message: e.to_string(),
            })?;

        Ok(response.refund_id)
    }
}
