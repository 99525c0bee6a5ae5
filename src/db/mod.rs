use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::path::Path;

use crate::config::Config;

pub const MIGRATIONS_DIR: &str = "./migrations";

pub async fn create_pool(config: &Config, database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(config.database_acquire_timeout())
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool, dir: &Path) -> anyhow::Result<()> {
    let migrator = Migrator::new(dir).await?;
    migrator.run(pool).await?;
    tracing::info!(migrations = %dir.display(), "Database migrations completed");
    Ok(())
}
