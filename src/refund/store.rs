//! Seam between the refund processor and the transaction store.
//!
//! The store owns transaction state. The processor only reads snapshots and
//! drives the `completed -> refunding` claim that makes refund attempts
//! at-most-once across concurrent callers.

use crate::refund::error::RefundResult;
use crate::refund::types::Transaction;
use async_trait::async_trait;
use uuid::Uuid;

/// Provider-side references needed to issue the gateway call.
#[derive(Debug, Clone)]
pub struct RefundReferences {
    pub provider_transaction_id: Option<String>,
    pub provider_checkout_id: Option<String>,
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Fetch a transaction snapshot, or a not-found error.
    async fn find_transaction(&self, transaction_id: Uuid) -> RefundResult<Transaction>;

    /// Fetch the provider references for the gateway call.
    async fn find_refund_references(&self, transaction_id: Uuid)
        -> RefundResult<RefundReferences>;

    /// Conditionally move the transaction from `completed` to `refunding`.
    /// Returns false when the row was not in `completed`, which means
    /// another attempt won the claim (or the transaction already settled
    /// into a terminal state).
    async fn claim_for_refund(&self, transaction_id: Uuid) -> RefundResult<bool>;

    /// Undo a claim after a failure that happened before any money moved.
    async fn release_refund_claim(&self, transaction_id: Uuid) -> RefundResult<()>;
}
