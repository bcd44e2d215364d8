//! Reconciliation alerts for refunds that moved money but were not recorded.
//!
//! When the gateway refund succeeds and the ledger write then fails, the
//! provider and the platform disagree about the merchant's money. Retrying
//! the whole flow would refund twice at the provider, so the attempt
//! terminates as a failure and an alert is raised for an operator to settle
//! by hand.

use crate::refund::types::ProviderCode;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationAlert {
    pub transaction_id: Uuid,
    pub organization_id: Uuid,
    pub provider: ProviderCode,
    pub provider_refund_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub ledger_error: String,
    pub occurred_at: DateTime<Utc>,
}

/// Destination for reconciliation alerts. A named seam so tests can assert
/// the alert fires exactly when the inconsistency window opens.
pub trait AlertSink: Send + Sync {
    fn raise(&self, alert: ReconciliationAlert);
}

/// Default sink: a structured error log under a dedicated target that the
/// log pipeline routes to operator alerting.
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn raise(&self, alert: ReconciliationAlert) {
        error!(
            target: "reconciliation",
            transaction_id = %alert.transaction_id,
            organization_id = %alert.organization_id,
            provider = %alert.provider,
            provider_refund_id = %alert.provider_refund_id,
            amount = %alert.amount,
            currency = %alert.currency,
            ledger_error = %alert.ledger_error,
            "refund moved money at the provider but was not recorded in the ledger"
        );
    }
}
