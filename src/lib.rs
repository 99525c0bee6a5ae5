pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod use_cases;
pub mod utils;
pub mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::ports::TransactionStore;
use crate::use_cases::PaymentIntake;

#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<PaymentIntake>,
    pub store: Arc<dyn TransactionStore>,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/payments", post(handlers::payments::initiate_payment))
        .route("/transactions/:id", get(handlers::payments::get_transaction))
        .layer(axum::middleware::from_fn(
            middleware::request_logger::request_logger_middleware,
        ))
        .with_state(state)
}
