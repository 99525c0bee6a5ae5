//! Postgres implementation of TransactionStore.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::{Metadata, TransactionRecord, TransactionStatus};
use crate::ports::{StoreError, StoreResult, TransactionStore};

/// Postgres-backed transaction store.
///
/// Idempotency rides on the `UNIQUE (idempotency_key)` constraint: the insert and the
/// duplicate check are a single statement, so concurrent writers never both succeed.
#[derive(Clone)]
pub struct PostgresTransactionStore {
    pool: PgPool,
}

impl PostgresTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PostgresTransactionStore {
    async fn create_if_absent(&self, record: TransactionRecord) -> StoreResult<TransactionRecord> {
        let inserted = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO payment_transactions (
                transaction_id, idempotency_key, user_id, payment_type, amount,
                currency, metadata, status, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (idempotency_key) DO NOTHING
            RETURNING transaction_id, idempotency_key, user_id, payment_type, amount,
                currency, metadata, status, created_at
            "#,
        )
        .bind(&record.transaction_id)
        .bind(&record.idempotency_key)
        .bind(&record.user_id)
        .bind(&record.payment_type)
        .bind(&record.amount)
        .bind(&record.currency)
        .bind(Json(record.metadata.clone()))
        .bind(record.status.as_str())
        .bind(record.created_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return row.into_domain();
        }

        // ON CONFLICT waits for the competing insert to commit, so the winner is visible here.
        tracing::debug!(
            idempotency_key = %record.idempotency_key,
            "idempotency key already on file, loading stored record"
        );
        self.find_by_idempotency_key(&record.idempotency_key)
            .await?
            .ok_or_else(|| {
                StoreError::Other(format!(
                    "record for idempotency key {} conflicted but could not be read back",
                    record.idempotency_key
                ))
            })
    }

    async fn find_by_idempotency_key(&self, key: &str) -> StoreResult<Option<TransactionRecord>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT transaction_id, idempotency_key, user_id, payment_type, amount,
                currency, metadata, status, created_at
            FROM payment_transactions
            WHERE idempotency_key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TransactionRow::into_domain).transpose()
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> StoreResult<Option<TransactionRecord>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT transaction_id, idempotency_key, user_id, payment_type, amount,
                currency, metadata, status, created_at
            FROM payment_transactions
            WHERE transaction_id = $1
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TransactionRow::into_domain).transpose()
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let unavailable = match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => true,
            // SQLSTATE class 08 is connection exception; 57P01..57P03 are server shutdown/unavailable.
            sqlx::Error::Database(db) => db
                .code()
                .map(|code| code.starts_with("08") || code.starts_with("57P"))
                .unwrap_or(false),
            _ => false,
        };

        if unavailable {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Other(err.to_string())
        }
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    transaction_id: String,
    idempotency_key: String,
    user_id: Option<String>,
    payment_type: String,
    amount: bigdecimal::BigDecimal,
    currency: String,
    metadata: Json<Metadata>,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> StoreResult<TransactionRecord> {
        let status = self
            .status
            .parse::<TransactionStatus>()
            .map_err(StoreError::Other)?;

        Ok(TransactionRecord {
            transaction_id: self.transaction_id,
            idempotency_key: self.idempotency_key,
            user_id: self.user_id,
            payment_type: self.payment_type,
            amount: self.amount,
            currency: self.currency,
            metadata: self.metadata.0,
            status,
            created_at: self.created_at,
        })
    }
}
