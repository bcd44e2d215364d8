//! Refund eligibility gating.

use crate::refund::types::{
    EligibilityReason, EligibilityResult, RefundSupport, Transaction, TransactionStatus,
};

/// Decide whether a transaction can enter the refund flow. Pure, no side
/// effects; the processor re-checks the store-side status with a conditional
/// update before any money moves.
pub fn check_eligibility(transaction: &Transaction) -> EligibilityResult {
    match transaction.status {
        TransactionStatus::Refunded => {
            return EligibilityResult::blocked(EligibilityReason::AlreadyRefunded)
        }
        TransactionStatus::Completed => {}
        // Pending, Failed and Expired all fall under "not completed".
        _ => return EligibilityResult::blocked(EligibilityReason::NotCompleted),
    }

    match transaction.provider.refund_support() {
        RefundSupport::Supported {
            requires_provider_reference,
        } => {
            if requires_provider_reference && !has_provider_reference(transaction) {
                return EligibilityResult::blocked(EligibilityReason::MissingProviderReference);
            }
            EligibilityResult::ok()
        }
        RefundSupport::NotYetSupported | RefundSupport::Never => {
            EligibilityResult::blocked(EligibilityReason::ProviderNotSupported)
        }
    }
}

fn has_provider_reference(transaction: &Transaction) -> bool {
    transaction
        .provider_transaction_id
        .as_deref()
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false)
}
