use crate::refund::types::EligibilityReason;
use thiserror::Error;

pub type RefundResult<T> = Result<T, RefundError>;

#[derive(Debug, Clone, Error)]
pub enum RefundError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Refund amount must be greater than zero")]
    AmountNotPositive,

    #[error("Refund amount exceeds the original transaction amount")]
    AmountExceedsGross,

    #[error("Transaction is not eligible for refund: {reason:?}")]
    Eligibility { reason: EligibilityReason },

    #[error("Refund already in progress or transaction no longer refundable")]
    ConcurrentRefund,

    #[error("Provider lookup failed: {message}")]
    ProviderLookup { message: String },

    #[error("Gateway error: provider={provider}, message={message}")]
    Gateway {
        provider: String,
        message: String,
        provider_code: Option<String>,
    },

    // Display carries the underlying cause for logs and reconciliation
    // alerts; user_message() stays fixed for end users.
    #[error("Failed to record the refund in our system: {message}")]
    Ledger { message: String },

    #[error("Unexpected refund error: {message}")]
    Unknown { message: String },
}

impl RefundError {
    /// Local errors happened before any money movement was attempted; the
    /// caller may let the user correct input and retry immediately. Remote
    /// failures after the gateway call must never be blindly retried.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            RefundError::Validation { .. }
                | RefundError::AmountNotPositive
                | RefundError::AmountExceedsGross
                | RefundError::Eligibility { .. }
                | RefundError::ConcurrentRefund
        )
    }

    /// Stable failure-kind tag surfaced to callers so a UI can decide
    /// between "retry now" (local) and "warn about partial completion"
    /// (ledger) without parsing messages.
    pub fn kind(&self) -> &'static str {
        match self {
            RefundError::Validation { .. }
            | RefundError::AmountNotPositive
            | RefundError::AmountExceedsGross => "validation",
            RefundError::Eligibility { .. } => "eligibility",
            RefundError::ConcurrentRefund => "concurrent_refund",
            RefundError::ProviderLookup { .. } => "provider_lookup",
            RefundError::Gateway { .. } => "gateway",
            RefundError::Ledger { .. } => "ledger",
            RefundError::Unknown { .. } => "unknown",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            RefundError::Validation { .. } => 400,
            RefundError::AmountNotPositive => 400,
            RefundError::AmountExceedsGross => 400,
            RefundError::Eligibility { .. } => 409,
            RefundError::ConcurrentRefund => 409,
            RefundError::ProviderLookup { .. } => 404,
            RefundError::Gateway { .. } => 502,
            RefundError::Ledger { .. } => 500,
            RefundError::Unknown { .. } => 500,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            RefundError::Validation { message, .. } => message.clone(),
            RefundError::AmountNotPositive => {
                "Refund amount must be greater than zero".to_string()
            }
            RefundError::AmountExceedsGross => {
                "Refund amount cannot exceed the original transaction amount".to_string()
            }
            RefundError::Eligibility { reason } => match reason {
                EligibilityReason::AlreadyRefunded => {
                    "This transaction has already been refunded".to_string()
                }
                EligibilityReason::NotCompleted => {
                    "Only completed transactions can be refunded".to_string()
                }
                EligibilityReason::MissingProviderReference => {
                    "Missing the provider reference needed to issue this refund".to_string()
                }
                EligibilityReason::ProviderNotSupported => {
                    "Refunds are not supported for this payment provider".to_string()
                }
                EligibilityReason::Ok => "Transaction is eligible for refund".to_string(),
            },
            RefundError::ConcurrentRefund => {
                "A refund for this transaction is already in progress".to_string()
            }
            RefundError::ProviderLookup { .. } => {
                "Could not find the provider details for this transaction".to_string()
            }
            RefundError::Gateway { message, .. } => message.clone(),
            RefundError::Ledger { .. } => "Failed to record the refund in our system".to_string(),
            RefundError::Unknown { .. } => {
                "An unexpected error occurred while processing the refund".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_errors_are_distinguishable_from_remote() {
        assert!(RefundError::AmountExceedsGross.is_local());
        assert!(RefundError::ConcurrentRefund.is_local());
        assert!(!RefundError::Gateway {
            provider: "wave".to_string(),
            message: "declined".to_string(),
            provider_code: None
        }
        .is_local());
        assert!(!RefundError::Ledger {
            message: "rpc timeout".to_string()
        }
        .is_local());
    }

    #[test]
    fn error_http_status_mapping_is_correct() {
        assert_eq!(RefundError::AmountNotPositive.http_status_code(), 400);
        assert_eq!(RefundError::ConcurrentRefund.http_status_code(), 409);
        assert_eq!(
            RefundError::Gateway {
                provider: "wave".to_string(),
                message: "timeout".to_string(),
                provider_code: None
            }
            .http_status_code(),
            502
        );
    }

    #[test]
    fn ledger_failure_user_message_is_fixed_but_display_keeps_cause() {
        let err = RefundError::Ledger {
            message: "insert failed".to_string(),
        };
        assert_eq!(err.user_message(), "Failed to record the refund in our system");
        assert!(err.to_string().contains("insert failed"));
    }
}
