use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::TransactionRecord;
use crate::ports::{StoreResult, TransactionStore};

/// A thread-safe in-memory transaction store keyed by idempotency key.
///
/// Check-and-insert happens under a single write lock, which gives the same
/// one-winner guarantee as the unique constraint in Postgres. Used for local
/// development and tests; contents are lost on restart.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    records: Arc<RwLock<HashMap<String, TransactionRecord>>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn create_if_absent(&self, record: TransactionRecord) -> StoreResult<TransactionRecord> {
        let mut records = self.records.write().await;
        let stored = records
            .entry(record.idempotency_key.clone())
            .or_insert(record);
        Ok(stored.clone())
    }

    async fn find_by_idempotency_key(&self, key: &str) -> StoreResult<Option<TransactionRecord>> {
        let records = self.records.read().await;
        Ok(records.get(key).cloned())
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> StoreResult<Option<TransactionRecord>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|record| record.transaction_id == transaction_id)
            .cloned())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
