//! Identifier generation for transaction records.

use uuid::Uuid;

pub const TRANSACTION_ID_PREFIX: &str = "tx";
pub const IDEMPOTENCY_KEY_PREFIX: &str = "idemp";

/// Source of unique tokens. Swapped for a deterministic sequence in tests.
pub trait IdGenerator: Send + Sync {
    fn next_token(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_token(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

pub fn namespaced(prefix: &str, token: &str) -> String {
    format!("{}-{}", prefix, token)
}
