//! Initiate payment use case.
//! Sequences authorization, record assembly and idempotent persistence.

use std::sync::Arc;

use crate::config::AuthorizationMode;
use crate::domain::{
    AssemblyContext, PaymentDetails, PaymentRequest, TransactionAssembler, TransactionRecord,
    TransactionStatus,
};
use crate::error::IntakeError;
use crate::ports::{AuthFailure, AuthorizationPort, TransactionPublisher, TransactionStore};

/// Payment intake orchestrator.
///
/// Holds no per-request state; every collaborator is injected at construction and
/// all cross-call coordination is left to `TransactionStore::create_if_absent`.
/// Nothing is retried here: callers retry by re-submitting the same idempotency key.
pub struct PaymentIntake {
    authorization: Arc<dyn AuthorizationPort>,
    store: Arc<dyn TransactionStore>,
    publisher: Arc<dyn TransactionPublisher>,
    assembler: TransactionAssembler,
    mode: AuthorizationMode,
}

impl PaymentIntake {
    pub fn new(
        authorization: Arc<dyn AuthorizationPort>,
        store: Arc<dyn TransactionStore>,
        publisher: Arc<dyn TransactionPublisher>,
        assembler: TransactionAssembler,
        mode: AuthorizationMode,
    ) -> Self {
        if mode != AuthorizationMode::Required {
            tracing::warn!(
                target: "audit",
                authorization_mode = %mode,
                "payment intake running with relaxed authorization"
            );
        }

        Self {
            authorization,
            store,
            publisher,
            assembler,
            mode,
        }
    }

    pub fn authorization_mode(&self) -> AuthorizationMode {
        self.mode
    }

    /// Admits `request` into a durable transaction record.
    ///
    /// Returns the stored record, which is the pre-existing one when the
    /// idempotency key was already on file.
    pub async fn initiate(
        &self,
        request: PaymentRequest,
        credential: &str,
    ) -> Result<TransactionRecord, IntakeError> {
        let status = self.authorize(&request, credential).await?;

        let record = self
            .assembler
            .assemble(&request, &AssemblyContext::new(status))?;
        let assembled_id = record.transaction_id.clone();

        let stored = self.store.create_if_absent(record).await.map_err(|e| {
            tracing::error!(transaction_id = %assembled_id, error = %e, "failed to persist transaction");
            IntakeError::from(e)
        })?;

        if stored.transaction_id == assembled_id {
            tracing::info!(
                transaction_id = %stored.transaction_id,
                idempotency_key = %stored.idempotency_key,
                status = %stored.status,
                "transaction created"
            );
        } else {
            tracing::info!(
                transaction_id = %stored.transaction_id,
                discarded_transaction_id = %assembled_id,
                idempotency_key = %stored.idempotency_key,
                "duplicate submission, returning stored transaction"
            );
        }

        if let Err(e) = self.publisher.publish(&stored).await {
            tracing::warn!(
                transaction_id = %stored.transaction_id,
                error = %e,
                "post-commit publication failed"
            );
        }

        Ok(stored)
    }

    /// Runs the authorization step and decides the status the record is created with.
    async fn authorize(
        &self,
        request: &PaymentRequest,
        credential: &str,
    ) -> Result<TransactionStatus, IntakeError> {
        if self.mode == AuthorizationMode::Bypass {
            tracing::info!(
                target: "audit",
                idempotency_key = request.idempotency_key.as_deref().unwrap_or("<generated>"),
                "authorization bypassed by configuration"
            );
            return Ok(TransactionStatus::Pending);
        }

        let details = PaymentDetails::from_request(request)?;

        if credential.trim().is_empty() {
            tracing::warn!("payment submitted without a credential");
            return Err(IntakeError::AuthorizationFailed(AuthFailure::Unauthorized(
                "missing credential".to_string(),
            )));
        }

        match self.authorization.authorize(credential, &details).await {
            Ok(decision) if decision.approved => Ok(TransactionStatus::Authorized),
            Ok(decision) => {
                tracing::info!(
                    reason_code = decision.reason_code.as_deref().unwrap_or(""),
                    "payment declined by authorization service"
                );
                Err(IntakeError::AuthorizationFailed(AuthFailure::Denied {
                    reason_code: decision.reason_code,
                    message: decision
                        .message
                        .unwrap_or_else(|| "payment declined".to_string()),
                }))
            }
            Err(AuthFailure::Unreachable(cause)) if self.mode == AuthorizationMode::SoftFail => {
                tracing::warn!(
                    target: "audit",
                    cause = %cause,
                    "authorization service unreachable, admitting payment as pending"
                );
                Ok(TransactionStatus::Pending)
            }
            Err(failure) => {
                tracing::warn!(error = %failure, "authorization failed");
                Err(IntakeError::AuthorizationFailed(failure))
            }
        }
    }
}
