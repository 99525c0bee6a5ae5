#![allow(dead_code)]

use async_trait::async_trait;
use payment_gateway::adapters::InMemoryTransactionStore;
use payment_gateway::config::AuthorizationMode;
use payment_gateway::domain::{PaymentDetails, TransactionAssembler, TransactionRecord};
use payment_gateway::ports::{
    AuthFailure, AuthorizationPort, Decision, PublishError, StoreError, StoreResult,
    TransactionPublisher, TransactionStore,
};
use payment_gateway::use_cases::PaymentIntake;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Authorization double returning a fixed verdict and counting calls.
pub struct StubAuthorization {
    verdict: Result<Decision, AuthFailure>,
    calls: AtomicUsize,
}

impl StubAuthorization {
    pub fn approving() -> Self {
        Self::returning(Ok(Decision::approved()))
    }

    pub fn returning(verdict: Result<Decision, AuthFailure>) -> Self {
        Self {
            verdict,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorizationPort for StubAuthorization {
    async fn authorize(
        &self,
        _credential: &str,
        _details: &PaymentDetails,
    ) -> Result<Decision, AuthFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict.clone()
    }
}

/// Wraps the in-memory store, counting writes and optionally failing them.
#[derive(Clone, Default)]
pub struct ObservedStore {
    pub inner: InMemoryTransactionStore,
    writes: Arc<AtomicUsize>,
    unavailable: bool,
}

impl ObservedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionStore for ObservedStore {
    async fn create_if_absent(&self, record: TransactionRecord) -> StoreResult<TransactionRecord> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        self.inner.create_if_absent(record).await
    }

    async fn find_by_idempotency_key(&self, key: &str) -> StoreResult<Option<TransactionRecord>> {
        self.inner.find_by_idempotency_key(key).await
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> StoreResult<Option<TransactionRecord>> {
        self.inner.find_by_transaction_id(transaction_id).await
    }

    async fn ping(&self) -> StoreResult<()> {
        if self.unavailable {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

/// Publisher double that records what it was handed.
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<String> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionPublisher for RecordingPublisher {
    async fn publish(&self, record: &TransactionRecord) -> Result<(), PublishError> {
        self.published
            .lock()
            .unwrap()
            .push(record.transaction_id.clone());
        if self.fail {
            return Err(PublishError::Failed {
                transaction_id: record.transaction_id.clone(),
                reason: "broker offline".to_string(),
            });
        }
        Ok(())
    }
}

pub struct Harness {
    pub intake: Arc<PaymentIntake>,
    pub authorization: Arc<StubAuthorization>,
    pub store: ObservedStore,
    pub publisher: Arc<RecordingPublisher>,
}

impl Harness {
    pub fn new(authorization: StubAuthorization, mode: AuthorizationMode) -> Self {
        Self::with_parts(authorization, ObservedStore::new(), RecordingPublisher::default(), mode)
    }

    pub fn with_parts(
        authorization: StubAuthorization,
        store: ObservedStore,
        publisher: RecordingPublisher,
        mode: AuthorizationMode,
    ) -> Self {
        let authorization = Arc::new(authorization);
        let publisher = Arc::new(publisher);
        let intake = PaymentIntake::new(
            authorization.clone(),
            Arc::new(store.clone()),
            publisher.clone(),
            TransactionAssembler::default(),
            mode,
        );

        Self {
            intake: Arc::new(intake),
            authorization,
            store,
            publisher,
        }
    }
}
