use crate::database::error::DatabaseError;
use crate::refund::error::{RefundError, RefundResult};
use crate::refund::store::{RefundReferences, TransactionStore};
use crate::refund::types::{ProviderCode, Transaction, TransactionStatus};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

/// Raw transaction row. Status and provider are stored as strings and
/// parsed into the closed enums on the way out.
#[derive(Debug, Clone, FromRow)]
struct TransactionRow {
    id: Uuid,
    organization_id: Uuid,
    gross_amount: Decimal,
    currency: String,
    status: String,
    provider: String,
    provider_transaction_id: Option<String>,
    provider_checkout_id: Option<String>,
}

impl TransactionRow {
    fn into_transaction(self) -> RefundResult<Transaction> {
        Ok(Transaction {
            id: self.id,
            organization_id: self.organization_id,
            gross_amount: self.gross_amount,
            currency: self.currency,
            status: TransactionStatus::from_str(&self.status)?,
            provider: ProviderCode::from_str(&self.provider)?,
            provider_transaction_id: self.provider_transaction_id,
            provider_checkout_id: self.provider_checkout_id,
        })
    }
}

/// Postgres-backed transaction store.
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_row(&self, transaction_id: Uuid) -> Result<TransactionRow, DatabaseError> {
        sqlx::query_as::<_, TransactionRow>(
            "SELECT id, organization_id, gross_amount, currency, status, provider,
                    provider_transaction_id, provider_checkout_id
             FROM transactions
             WHERE id = $1",
        )
        .bind(transaction_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}

#[async_trait]
impl TransactionStore for TransactionRepository {
    async fn find_transaction(&self, transaction_id: Uuid) -> RefundResult<Transaction> {
        let row = self
            .fetch_row(transaction_id)
            .await
            .map_err(RefundError::from)?;
        row.into_transaction()
    }

    async fn find_refund_references(
        &self,
        transaction_id: Uuid,
    ) -> RefundResult<RefundReferences> {
        let row = self
            .fetch_row(transaction_id)
            .await
            .map_err(RefundError::from)?;
        Ok(RefundReferences {
            provider_transaction_id: row.provider_transaction_id,
            provider_checkout_id: row.provider_checkout_id,
        })
    }

    async fn claim_for_refund(&self, transaction_id: Uuid) -> RefundResult<bool> {
        // Conditional update: only one caller can move completed ->
        // refunding, which is the at-most-once guard for the whole flow.
        let result = sqlx::query(
            "UPDATE transactions
             SET status = 'refunding', updated_at = NOW()
             WHERE id = $1 AND status = 'completed'",
        )
        .bind(transaction_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
        .map_err(RefundError::from)?;

        Ok(result.rows_affected() == 1)
    }

    async fn release_refund_claim(&self, transaction_id: Uuid) -> RefundResult<()> {
        sqlx::query(
            "UPDATE transactions
             SET status = 'completed', updated_at = NOW()
             WHERE id = $1 AND status = 'refunding'",
        )
        .bind(transaction_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
        .map_err(RefundError::from)?;

        Ok(())
    }
}
