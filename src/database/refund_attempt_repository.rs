use crate::database::error::DatabaseError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Audit row for one refund attempt, terminal state included. Written after
/// the attempt finishes regardless of outcome; reconciliation and support
/// both read from here.
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct RefundAttempt {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub requested_amount: Decimal,
    pub processing_fee: Option<Decimal>,
    pub net_amount: Option<Decimal>,
    pub reason: String,
    pub terminal_state: String,
    pub failure_kind: Option<String>,
    pub failure_reason: Option<String>,
    pub gateway_reference: Option<String>,
    pub ledger_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct RefundAttemptRepository {
    pool: PgPool,
}

impl RefundAttemptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn record_attempt(
        &self,
        transaction_id: Uuid,
        requested_amount: Decimal,
        processing_fee: Option<Decimal>,
        net_amount: Option<Decimal>,
        reason: &str,
        terminal_state: &str,
        failure_kind: Option<&str>,
        failure_reason: Option<&str>,
        gateway_reference: Option<&str>,
        ledger_reference: Option<&str>,
    ) -> Result<RefundAttempt, DatabaseError> {
        sqlx::query_as::<_, RefundAttempt>(
            "INSERT INTO refund_attempts
             (transaction_id, requested_amount, processing_fee, net_amount, reason,
              terminal_state, failure_kind, failure_reason, gateway_reference,
              ledger_reference)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING id, transaction_id, requested_amount, processing_fee, net_amount,
                       reason, terminal_state, failure_kind, failure_reason,
                       gateway_reference, ledger_reference, created_at",
        )
        .bind(transaction_id)
        .bind(requested_amount)
        .bind(processing_fee)
        .bind(net_amount)
        .bind(reason)
        .bind(terminal_state)
        .bind(failure_kind)
        .bind(failure_reason)
        .bind(gateway_reference)
        .bind(ledger_reference)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    pub async fn find_by_transaction(
        &self,
        transaction_id: Uuid,
        limit: i64,
    ) -> Result<Vec<RefundAttempt>, DatabaseError> {
        sqlx::query_as::<_, RefundAttempt>(
            "SELECT id, transaction_id, requested_amount, processing_fee, net_amount,
                    reason, terminal_state, failure_kind, failure_reason,
                    gateway_reference, ledger_reference, created_at
             FROM refund_attempts
             WHERE transaction_id = $1
             ORDER BY created_at DESC
             LIMIT $2",
        )
        .bind(transaction_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}
