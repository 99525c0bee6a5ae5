use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::TransactionRecord;
use crate::ports::{PublishError, TransactionPublisher};

const DEFAULT_CAPACITY: usize = 256;

/// Fans committed records out to in-process subscribers over a broadcast channel.
///
/// Having no subscribers is not an error; slow subscribers observe `Lagged`.
#[derive(Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<TransactionRecord>,
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl BroadcastPublisher {
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransactionRecord> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl TransactionPublisher for BroadcastPublisher {
    async fn publish(&self, record: &TransactionRecord) -> Result<(), PublishError> {
        match self.sender.send(record.clone()) {
            Ok(receivers) => {
                tracing::debug!(
                    transaction_id = %record.transaction_id,
                    receivers,
                    "transaction published"
                );
            }
            Err(_) => {
                tracing::debug!(
                    transaction_id = %record.transaction_id,
                    "no transaction subscribers"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AssemblyContext, PaymentRequest, TransactionAssembler, TransactionStatus};
    use bigdecimal::BigDecimal;

    fn record() -> TransactionRecord {
        TransactionAssembler::default()
            .assemble(
                &PaymentRequest::new("card", BigDecimal::from(5)),
                &AssemblyContext::new(TransactionStatus::Pending),
            )
            .unwrap()
    }

    #[tokio::test]
    async fn test_subscribers_receive_published_records() {
        let publisher = BroadcastPublisher::default();
        let mut rx = publisher.subscribe();
        let record = record();

        publisher.publish(&record).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_succeeds() {
        let publisher = BroadcastPublisher::with_capacity(4);
        assert!(publisher.publish(&record()).await.is_ok());
    }
}
