//! Normalizes a payment request into a canonical transaction record.

use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;

use super::ids::{namespaced, IdGenerator, UuidGenerator, IDEMPOTENCY_KEY_PREFIX, TRANSACTION_ID_PREFIX};
use super::transaction::{PaymentDetails, PaymentRequest, TransactionRecord, TransactionStatus};
use crate::validation::{validate_idempotency_key, ValidationError};

/// Per-call facts the record is stamped with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyContext {
    pub status: TransactionStatus,
    pub received_at: DateTime<Utc>,
}

impl AssemblyContext {
    /// Timestamps are kept at microsecond precision, the resolution of the durable store.
    pub fn new(status: TransactionStatus) -> Self {
        Self {
            status,
            received_at: Utc::now().trunc_subsecs(6),
        }
    }
}

#[derive(Clone)]
pub struct TransactionAssembler {
    ids: Arc<dyn IdGenerator>,
}

impl Default for TransactionAssembler {
    fn default() -> Self {
        Self::new(Arc::new(UuidGenerator))
    }
}

impl TransactionAssembler {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }

    /// Builds a fresh record. Performs no I/O; the only nondeterminism is the id source.
    pub fn assemble(
        &self,
        request: &PaymentRequest,
        context: &AssemblyContext,
    ) -> Result<TransactionRecord, ValidationError> {
        let details = PaymentDetails::from_request(request)?;
        let idempotency_key = self.resolve_idempotency_key(request.idempotency_key.as_deref())?;
        let user_id = details.user_id();

        Ok(TransactionRecord {
            transaction_id: namespaced(TRANSACTION_ID_PREFIX, &self.ids.next_token()),
            idempotency_key,
            user_id,
            payment_type: details.payment_type,
            amount: details.amount,
            currency: details.currency,
            metadata: details.metadata,
            status: context.status,
            created_at: context.received_at,
        })
    }

    /// Caller-supplied keys are used verbatim; absent or empty keys get a fresh token.
    fn resolve_idempotency_key(&self, supplied: Option<&str>) -> Result<String, ValidationError> {
        match supplied {
            Some(key) if !key.is_empty() => {
                validate_idempotency_key(key)?;
                Ok(key.to_string())
            }
            _ => Ok(namespaced(IDEMPOTENCY_KEY_PREFIX, &self.ids.next_token())),
        }
    }
}
