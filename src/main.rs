use clap::Parser;
use payment_gateway::adapters::{
    BroadcastPublisher, HttpAuthorizationClient, InMemoryTransactionStore, PostgresTransactionStore,
};
use payment_gateway::cli::{self, Cli, Commands, DbCommands, TxCommands};
use payment_gateway::config::{AuthorizationMode, Config};
use payment_gateway::domain::TransactionAssembler;
use payment_gateway::ports::TransactionStore;
use payment_gateway::use_cases::PaymentIntake;
use payment_gateway::{create_app, db, AppState};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing();

    let config = Config::from_env()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Tx(TxCommands::Show { transaction_id }) => {
            cli::handle_tx_show(&config, &transaction_id).await
        }
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Config => cli::handle_config_validate(&config),
    }
}

fn init_tracing() {
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let store: Arc<dyn TransactionStore> = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = db::create_pool(&config, database_url).await?;
            db::run_migrations(&pool, Path::new(db::MIGRATIONS_DIR)).await?;
            tracing::info!(
                database = %config.redacted_database_url().unwrap_or_default(),
                "Using Postgres transaction store"
            );
            Arc::new(PostgresTransactionStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory transaction store");
            Arc::new(InMemoryTransactionStore::new())
        }
    };

    let authorization = HttpAuthorizationClient::from_config(&config);
    match config.authorization_mode {
        AuthorizationMode::Bypass => tracing::warn!(
            target: "audit",
            "AUTHORIZATION_MODE=bypass: payments will be admitted without authorization"
        ),
        mode => tracing::info!(
            auth_service_url = %config.auth_service_url,
            authorization_mode = %mode,
            "Authorization client initialized"
        ),
    }

    // Nothing in the binary subscribes yet; downstream consumers attach with
    // `BroadcastPublisher::subscribe`. Publishing with no subscribers is a no-op.
    let publisher = BroadcastPublisher::default();

    let intake = PaymentIntake::new(
        Arc::new(authorization),
        store.clone(),
        Arc::new(publisher),
        TransactionAssembler::default(),
        config.authorization_mode,
    );

    let app = create_app(AppState {
        intake: Arc::new(intake),
        store,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install shutdown handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
