use async_trait::async_trait;
use thiserror::Error;

use crate::domain::TransactionRecord;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The durable medium could not be reached (connection refused, pool timeout, ...).
    #[error("transaction store unavailable: {0}")]
    Unavailable(String),
    #[error("transaction store error: {0}")]
    Other(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable storage for transaction records, keyed by idempotency key.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Atomic check-and-insert on `record.idempotency_key`.
    ///
    /// Returns the inserted record, or the record already on file for that key
    /// unchanged. Under concurrent calls with one key exactly one insert wins.
    async fn create_if_absent(&self, record: TransactionRecord) -> StoreResult<TransactionRecord>;

    async fn find_by_idempotency_key(&self, key: &str) -> StoreResult<Option<TransactionRecord>>;

    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> StoreResult<Option<TransactionRecord>>;

    /// Cheap reachability probe for health checks.
    async fn ping(&self) -> StoreResult<()>;
}
