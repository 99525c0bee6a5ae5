pub mod broadcast_publisher;
pub mod http_authorization_client;
pub mod in_memory_transaction_store;
pub mod postgres_transaction_store;

pub use broadcast_publisher::BroadcastPublisher;
pub use http_authorization_client::HttpAuthorizationClient;
pub use in_memory_transaction_store::InMemoryTransactionStore;
pub use postgres_transaction_store::PostgresTransactionStore;
