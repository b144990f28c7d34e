//! Shared application state

use std::sync::Arc;

use pagewise_query::{MySqlStore, PagedQuery, SqliteStore};
use sqlx::SqlitePool;

use crate::config::{Backend, Config};
use crate::resources::customers;
use crate::{db, Error, Result};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
}

/// The paged query engine for the configured backend.
#[derive(Clone)]
pub enum Database {
    Sqlite(PagedQuery<SqliteStore>),
    MySql(PagedQuery<MySqlStore>),
}

impl AppState {
    /// Connect to the configured database, creating the SQLite schema when
    /// asked to.
    pub async fn new(config: Config) -> Result<Self> {
        let backend = config.database.backend().map_err(Error::Internal)?;
        customers::CUSTOMERS.check()?;

        let db = match backend {
            Backend::Sqlite => {
                let pool = db::connect_sqlite(&config.database).await?;
                if config.database.create_schema {
                    db::create_sqlite_schema(&pool).await?;
                }
                Database::Sqlite(PagedQuery::new(SqliteStore::new(pool)))
            }
            Backend::MySql => {
                if config.database.create_schema {
                    tracing::warn!("database.create_schema only applies to SQLite, ignoring");
                }
                let pool = db::connect_mysql(&config.database).await?;
                let mut store = MySqlStore::new(pool);
                if let Some(strategy) = config.database.count_strategy {
                    store = store.with_count_strategy(strategy);
                }
                Database::MySql(PagedQuery::new(store))
            }
        };

        Ok(Self {
            config: Arc::new(config),
            db,
        })
    }

    pub fn sqlite_pool(&self) -> Option<&SqlitePool> {
        match &self.db {
            Database::Sqlite(engine) => Some(engine.store().pool()),
            Database::MySql(_) => None,
        }
    }
}
