//! Outbound capabilities the payment intake pipeline depends on.

pub mod authorization;
pub mod publisher;
pub mod store;

pub use authorization::{AuthFailure, AuthorizationPort, Decision};
pub use publisher::{PublishError, TransactionPublisher};
pub use store::{StoreError, StoreResult, TransactionStore};
