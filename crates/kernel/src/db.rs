//! Database connection pool management.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use crate::config::Config;

/// Name reported in `pg_stat_activity` for every pooled connection.
pub const APPLICATION_NAME: &str = "quarry";

/// Upper bound on waiting for a free connection before a query fails.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Parse the configured URL into connection options tagged with [`APPLICATION_NAME`].
pub fn connect_options(config: &Config) -> Result<PgConnectOptions> {
    let options = PgConnectOptions::from_str(&config.database_url)
        .context("DATABASE_URL is not a valid PostgreSQL connection URL")?;
    Ok(options.application_name(APPLICATION_NAME))
}

/// Create a PostgreSQL connection pool.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    let options = connect_options(config)?;
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await
        .context("failed to connect to PostgreSQL")?;

    tracing::info!(
        max_connections = config.database_max_connections,
        "Database pool ready"
    );
    Ok(pool)
}

/// Check if the database connection is healthy.
pub async fn check_health(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}
