use clap::{Parser, Subcommand};
use std::path::Path;

use crate::adapters::PostgresTransactionStore;
use crate::config::Config;
use crate::ports::TransactionStore;

#[derive(Parser)]
#[command(name = "payment-gateway")]
#[command(about = "Payment Gateway - payment intake and idempotent transaction recording", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Transaction lookup commands
    #[command(subcommand)]
    Tx(TxCommands),

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Print and validate the resolved configuration
    Config,
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// Show a stored transaction by transaction id
    Show {
        #[arg(value_name = "TX_ID")]
        transaction_id: String,
    },
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

fn require_database_url(config: &Config) -> anyhow::Result<&str> {
    config
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set for this command"))
}

pub async fn handle_tx_show(config: &Config, transaction_id: &str) -> anyhow::Result<()> {
    let database_url = require_database_url(config)?;
    let pool = crate::db::create_pool(config, database_url).await?;
    let store = PostgresTransactionStore::new(pool);

    match store.find_by_transaction_id(transaction_id).await? {
        Some(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        None => {
            tracing::warn!("Transaction {} not found", transaction_id);
            anyhow::bail!("Transaction {} not found", transaction_id)
        }
    }
}

pub async fn handle_db_migrate(config: &Config) -> anyhow::Result<()> {
    let database_url = require_database_url(config)?;
    let pool = crate::db::create_pool(config, database_url).await?;

    tracing::info!("Running database migrations...");
    crate::db::run_migrations(&pool, Path::new(crate::db::MIGRATIONS_DIR)).await?;

    println!("✓ Database migrations completed");
    Ok(())
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");
    config.validate()?;

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!("  Environment: {:?}", config.environment);
    println!(
        "  Database URL: {}",
        config
            .redacted_database_url()
            .unwrap_or_else(|| "<unset, in-memory store>".to_string())
    );
    println!("  Auth Service URL: {}", config.auth_service_url);
    println!("  Auth Timeout: {}s", config.auth_timeout_secs);
    println!(
        "  Auth Circuit Breaker: {} failures, {}s reset",
        config.auth_circuit_failure_threshold, config.auth_circuit_reset_secs
    );
    println!("  Authorization Mode: {}", config.authorization_mode);

    tracing::info!("Configuration is valid");
    println!("✓ Configuration is valid");

    Ok(())
}
