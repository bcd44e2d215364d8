pub mod http;
pub mod wave;

use crate::refund::error::RefundResult;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

/// Outbound refund call to a payment provider.
#[derive(Debug, Clone)]
pub struct GatewayRefundRequest {
    /// Provider-side transaction reference the refund applies to.
    pub provider_transaction_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub reason: String,
    /// Provider-side merchant identity, when the best-effort directory
    /// lookup produced one.
    pub merchant_id: Option<String>,
}

/// Provider confirmation that money has moved.
#[derive(Debug, Clone)]
pub struct GatewayRefundConfirmation {
    pub provider_refund_id: String,
    pub provider_data: Option<JsonValue>,
}

/// Per-provider refund endpoint client. One money-movement attempt per call;
/// idempotency across attempts is the provider's responsibility, so
/// implementations must not retry on their own.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    async fn refund(&self, request: GatewayRefundRequest)
        -> RefundResult<GatewayRefundConfirmation>;

    fn provider_name(&self) -> &'static str;
}
