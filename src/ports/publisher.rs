use async_trait::async_trait;
use thiserror::Error;

use crate::domain::TransactionRecord;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("failed to publish transaction {transaction_id}: {reason}")]
    Failed {
        transaction_id: String,
        reason: String,
    },
}

/// Hook fired after a record is durably committed. Delivery is at-least-once:
/// a duplicate submission publishes the stored record again.
#[async_trait]
pub trait TransactionPublisher: Send + Sync {
    async fn publish(&self, record: &TransactionRecord) -> Result<(), PublishError>;
}
