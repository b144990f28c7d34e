//! Connection pools and SQLite schema bootstrap.

use std::str::FromStr;

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::config::DatabaseConfig;
use crate::Result;

const SQLITE_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS customers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        store_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        phone_backup TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_customers_store_name ON customers (store_id, name)",
    "CREATE TABLE IF NOT EXISTS packages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_id INTEGER NOT NULL REFERENCES customers (id),
        status TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_packages_customer_status ON packages (customer_id, status)",
];

pub async fn connect_sqlite(config: &DatabaseConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

    // every connection to an in-memory database gets its own database
    let pool = if config.is_in_memory() {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?
    };

    tracing::info!(max_connections = pool.options().get_max_connections(), "SQLite pool ready");
    Ok(pool)
}

pub async fn connect_mysql(config: &DatabaseConfig) -> Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    tracing::info!(max_connections = config.max_connections, "MySQL pool ready");
    Ok(pool)
}

/// Create the customers and packages tables if they are missing.
pub async fn create_sqlite_schema(pool: &SqlitePool) -> Result<()> {
    for statement in SQLITE_SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("SQLite schema ready");
    Ok(())
}
