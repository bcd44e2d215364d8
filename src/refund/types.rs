use crate::refund::error::RefundError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Payment providers known to the platform.
///
/// The status quo: Wave is the only provider wired up for refunds. Orange
/// Money charges exist in the ledger but refunds for them have not been
/// built yet. Crypto settlements are final and can never be refunded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderCode {
    Wave,
    OrangeMoney,
    Crypto,
}

impl ProviderCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderCode::Wave => "wave",
            ProviderCode::OrangeMoney => "orange_money",
            ProviderCode::Crypto => "crypto",
        }
    }

    /// Refund capability for this provider, as a closed union rather than
    /// string checks scattered across callers.
    pub fn refund_support(&self) -> RefundSupport {
        match self {
            ProviderCode::Wave => RefundSupport::Supported {
                requires_provider_reference: true,
            },
            ProviderCode::OrangeMoney => RefundSupport::NotYetSupported,
            ProviderCode::Crypto => RefundSupport::Never,
        }
    }
}

impl std::fmt::Display for ProviderCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderCode {
    type Err = RefundError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "wave" => Ok(ProviderCode::Wave),
            "orange_money" | "orange-money" | "om" => Ok(ProviderCode::OrangeMoney),
            "crypto" => Ok(ProviderCode::Crypto),
            _ => Err(RefundError::Validation {
                message: format!("unknown provider: {}", value),
                field: Some("provider".to_string()),
            }),
        }
    }
}

/// Whether and how a provider supports refunds through this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundSupport {
    Supported { requires_provider_reference: bool },
    NotYetSupported,
    Never,
}

/// Transaction lifecycle states.
///
/// Closed and complete: `Expired` is a real state (abandoned checkouts) even
/// though only `Completed` transactions ever enter the refund flow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
    Expired,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Refunded => "refunded",
            TransactionStatus::Expired => "expired",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = RefundError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "failed" => Ok(TransactionStatus::Failed),
            "refunded" => Ok(TransactionStatus::Refunded),
            "expired" => Ok(TransactionStatus::Expired),
            _ => Err(RefundError::Validation {
                message: format!("unknown transaction status: {}", value),
                field: Some("status".to_string()),
            }),
        }
    }
}

/// Read-only snapshot of a transaction as handed to the refund processor.
/// The transaction store owns the record; the processor never mutates it
/// directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub gross_amount: Decimal,
    pub currency: String,
    pub status: TransactionStatus,
    pub provider: ProviderCode,
    pub provider_transaction_id: Option<String>,
    pub provider_checkout_id: Option<String>,
}

/// One refund attempt as requested by the caller. Not persisted as-is; the
/// attempt audit row is written by the processor.
#[derive(Debug, Clone, Deserialize)]
pub struct RefundRequest {
    pub transaction_id: Uuid,
    pub requested_amount: Decimal,
    pub reason: String,
}

/// Fee split for a candidate refund amount. The fee is always the cleanly
/// rounded 2% figure; the net absorbs any rounding remainder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefundBreakdown {
    pub processing_fee: Decimal,
    pub net_amount: Decimal,
}

/// Why a transaction is not (or is) eligible for refund.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EligibilityReason {
    Ok,
    NotCompleted,
    AlreadyRefunded,
    MissingProviderReference,
    ProviderNotSupported,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EligibilityResult {
    pub eligible: bool,
    pub reason: EligibilityReason,
}

impl EligibilityResult {
    pub fn ok() -> Self {
        Self {
            eligible: true,
            reason: EligibilityReason::Ok,
        }
    }

    pub fn blocked(reason: EligibilityReason) -> Self {
        Self {
            eligible: false,
            reason,
        }
    }
}

/// State machine for a single refund attempt. Terminal states are final;
/// there are no automatic retry transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefundAttemptState {
    Idle,
    Validating,
    ValidationFailed,
    Eligible,
    CallingGateway,
    GatewayFailed,
    GatewayOk,
    WritingLedger,
    LedgerFailed,
    Done,
}

impl RefundAttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RefundAttemptState::ValidationFailed
                | RefundAttemptState::GatewayFailed
                | RefundAttemptState::LedgerFailed
                | RefundAttemptState::Done
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RefundAttemptState::Idle => "idle",
            RefundAttemptState::Validating => "validating",
            RefundAttemptState::ValidationFailed => "validation_failed",
            RefundAttemptState::Eligible => "eligible",
            RefundAttemptState::CallingGateway => "calling_gateway",
            RefundAttemptState::GatewayFailed => "gateway_failed",
            RefundAttemptState::GatewayOk => "gateway_ok",
            RefundAttemptState::WritingLedger => "writing_ledger",
            RefundAttemptState::LedgerFailed => "ledger_failed",
            RefundAttemptState::Done => "done",
        }
    }
}

/// Result of a refund attempt returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RefundOutcome {
    pub success: bool,
    pub transaction_id: Uuid,
    pub breakdown: Option<RefundBreakdown>,
    pub gateway_reference: Option<String>,
    pub ledger_reference: Option<String>,
    pub failure_kind: Option<String>,
    pub failure_reason: Option<String>,
    pub terminal_state: RefundAttemptState,
}
