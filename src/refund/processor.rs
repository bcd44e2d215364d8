//! Refund execution.
//!
//! One attempt per call, sequential steps, each gating the next: claim the
//! transaction, resolve references, call the provider gateway, record the
//! refund in the ledger. There is no retry anywhere past the gateway call;
//! a refund that moved money but failed to record terminates as a failure
//! with a reconciliation alert.

use crate::gateway::{GatewayRefundRequest, ProviderGateway};
use crate::refund::breakdown::compute_breakdown;
use crate::refund::eligibility::check_eligibility;
use crate::refund::error::{RefundError, RefundResult};
use crate::refund::reconciliation::{AlertSink, ReconciliationAlert};
use crate::refund::store::TransactionStore;
use crate::refund::types::{
    EligibilityReason, EligibilityResult, RefundAttemptState, RefundBreakdown, RefundOutcome,
    RefundRequest, Transaction,
};
use crate::services::ledger::{CreateRefundRecord, LedgerClient};
use crate::services::merchant_directory::{best_effort_merchant_id, MerchantDirectory};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct RefundProcessor {
    store: Arc<dyn TransactionStore>,
    directory: Arc<dyn MerchantDirectory>,
    gateway: Arc<dyn ProviderGateway>,
    ledger: Arc<dyn LedgerClient>,
    alerts: Arc<dyn AlertSink>,
}

impl RefundProcessor {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        directory: Arc<dyn MerchantDirectory>,
        gateway: Arc<dyn ProviderGateway>,
        ledger: Arc<dyn LedgerClient>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            store,
            directory,
            gateway,
            ledger,
            alerts,
        }
    }

    /// Eligibility for a stored transaction. Read-only.
    pub async fn eligibility(&self, transaction_id: Uuid) -> RefundResult<EligibilityResult> {
        let transaction = self.store.find_transaction(transaction_id).await?;
        Ok(check_eligibility(&transaction))
    }

    /// Fee preview for a stored transaction and a candidate amount.
    pub async fn preview(
        &self,
        transaction_id: Uuid,
        requested_amount: rust_decimal::Decimal,
    ) -> RefundResult<RefundBreakdown> {
        let transaction = self.store.find_transaction(transaction_id).await?;
        compute_breakdown(requested_amount, transaction.gross_amount)
    }

    /// Execute one refund attempt. Every failure path comes back as a
    /// structured outcome; nothing is thrown past this boundary.
    pub async fn execute_refund(&self, request: RefundRequest) -> RefundOutcome {
        let transaction_id = request.transaction_id;

        info!(
            transaction_id = %transaction_id,
            requested_amount = %request.requested_amount,
            state = RefundAttemptState::Validating.as_str(),
            "refund attempt started"
        );

        // Local validation and eligibility. No side effects on failure.
        let (transaction, breakdown) = match self.validate(&request).await {
            Ok(prepared) => prepared,
            Err(e) => return Self::failed(transaction_id, None, e, RefundAttemptState::ValidationFailed),
        };

        // At-most-once guard: only one caller wins completed -> refunding.
        match self.store.claim_for_refund(transaction_id).await {
            Ok(true) => {}
            Ok(false) => {
                return Self::failed(
                    transaction_id,
                    Some(breakdown),
                    RefundError::ConcurrentRefund,
                    RefundAttemptState::ValidationFailed,
                )
            }
            Err(e) => {
                return Self::failed(
                    transaction_id,
                    Some(breakdown),
                    e,
                    RefundAttemptState::ValidationFailed,
                )
            }
        }

        // Resolve the gateway reference. check_eligibility already vetted
        // the snapshot; this guards against the store having changed since.
        let provider_transaction_id = match self.resolve_reference(transaction_id).await {
            Ok(reference) => reference,
            Err(e) => {
                self.release_claim(transaction_id).await;
                return Self::failed(
                    transaction_id,
                    Some(breakdown),
                    e,
                    RefundAttemptState::ValidationFailed,
                );
            }
        };

        // Best-effort enrichment; failure is logged inside and never aborts.
        let merchant_id = best_effort_merchant_id(
            self.directory.as_ref(),
            transaction.organization_id,
            transaction.provider,
        )
        .await;

        info!(
            transaction_id = %transaction_id,
            provider = %transaction.provider,
            state = RefundAttemptState::CallingGateway.as_str(),
            "issuing gateway refund"
        );

        let confirmation = match self
            .gateway
            .refund(GatewayRefundRequest {
                provider_transaction_id: provider_transaction_id.clone(),
                amount: request.requested_amount,
                currency: transaction.currency.clone(),
                reason: request.reason.clone(),
                merchant_id: merchant_id.clone(),
            })
            .await
        {
            Ok(confirmation) => confirmation,
            Err(e) => {
                // No money moved; hand the transaction back.
                self.release_claim(transaction_id).await;
                return Self::failed(
                    transaction_id,
                    Some(breakdown),
                    e,
                    RefundAttemptState::GatewayFailed,
                );
            }
        };

        info!(
            transaction_id = %transaction_id,
            provider_refund_id = %confirmation.provider_refund_id,
            state = RefundAttemptState::WritingLedger.as_str(),
            "gateway confirmed, recording refund"
        );

        let record = CreateRefundRecord {
            organization_id: transaction.organization_id,
            transaction_id,
            amount: request.requested_amount,
            reason: request.reason.clone(),
            provider: transaction.provider,
            provider_transaction_id,
            provider_refund_id: confirmation.provider_refund_id.clone(),
            provider_merchant_id: merchant_id,
            processing_fee: breakdown.processing_fee,
            net_amount: breakdown.net_amount,
        };

        match self.ledger.create_refund(record).await {
            Ok(ledger_reference) => {
                info!(
                    transaction_id = %transaction_id,
                    ledger_reference = %ledger_reference,
                    state = RefundAttemptState::Done.as_str(),
                    "refund recorded"
                );
                RefundOutcome {
                    success: true,
                    transaction_id,
                    breakdown: Some(breakdown),
                    gateway_reference: Some(confirmation.provider_refund_id),
                    ledger_reference: Some(ledger_reference),
                    failure_kind: None,
                    failure_reason: None,
                    terminal_state: RefundAttemptState::Done,
                }
            }
            Err(e) => {
                // Money already moved at the provider. The claim stays in
                // place so nobody refunds again; an operator settles this.
                self.alerts.raise(ReconciliationAlert {
                    transaction_id,
                    organization_id: transaction.organization_id,
                    provider: transaction.provider,
                    provider_refund_id: confirmation.provider_refund_id.clone(),
                    amount: request.requested_amount,
                    currency: transaction.currency.clone(),
                    ledger_error: e.to_string(),
                    occurred_at: Utc::now(),
                });
                let ledger_error = match e {
                    RefundError::Ledger { .. } => e,
                    other => RefundError::Ledger {
                        message: other.to_string(),
                    },
                };
                let mut outcome = Self::failed(
                    transaction_id,
                    Some(breakdown),
                    ledger_error,
                    RefundAttemptState::LedgerFailed,
                );
                outcome.gateway_reference = Some(confirmation.provider_refund_id);
                outcome
            }
        }
    }

    async fn validate(
        &self,
        request: &RefundRequest,
    ) -> RefundResult<(Transaction, RefundBreakdown)> {
        if request.reason.trim().is_empty() {
            return Err(RefundError::Validation {
                message: "a refund reason is required".to_string(),
                field: Some("reason".to_string()),
            });
        }

        let transaction = self.store.find_transaction(request.transaction_id).await?;
        let breakdown = compute_breakdown(request.requested_amount, transaction.gross_amount)?;

        let eligibility = check_eligibility(&transaction);
        if !eligibility.eligible {
            return Err(RefundError::Eligibility {
                reason: eligibility.reason,
            });
        }

        Ok((transaction, breakdown))
    }

    async fn resolve_reference(&self, transaction_id: Uuid) -> RefundResult<String> {
        let references = self.store.find_refund_references(transaction_id).await?;
        references
            .provider_transaction_id
            .filter(|v| !v.trim().is_empty())
            .ok_or(RefundError::Eligibility {
                reason: EligibilityReason::MissingProviderReference,
            })
    }

    async fn release_claim(&self, transaction_id: Uuid) {
        if let Err(e) = self.store.release_refund_claim(transaction_id).await {
            warn!(
                transaction_id = %transaction_id,
                error = %e,
                "failed to release refund claim after aborted attempt"
            );
        }
    }

    fn failed(
        transaction_id: Uuid,
        breakdown: Option<RefundBreakdown>,
        error: RefundError,
        terminal_state: RefundAttemptState,
    ) -> RefundOutcome {
        warn!(
            transaction_id = %transaction_id,
            kind = error.kind(),
            state = terminal_state.as_str(),
            error = %error,
            "refund attempt failed"
        );
        RefundOutcome {
            success: false,
            transaction_id,
            breakdown,
            gateway_reference: None,
            ledger_reference: None,
            failure_kind: Some(error.kind().to_string()),
            failure_reason: Some(error.user_message()),
            terminal_state,
        }
    }
}
