//! SQLite store.
//!
//! SQLite has no found-rows facility, so the total is re-counted with the
//! same FROM / WHERE inside the same transaction. A deferred SQLite
//! transaction takes its read snapshot at the first statement and keeps it
//! until commit.

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use super::{bind_params, PageStore, PageTransaction};
use crate::assemble::{CountStrategy, Statement};
use crate::error::StoreError;

#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl PageStore for SqliteStore {
    type Transaction = SqliteTransaction;

    fn count_strategy(&self) -> CountStrategy {
        CountStrategy::Requery
    }

    async fn begin(&self) -> Result<SqliteTransaction, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(SqliteTransaction { tx })
    }
}

pub struct SqliteTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl PageTransaction for SqliteTransaction {
    type Row = SqliteRow;

    fn fetch<'t>(
        &'t mut self,
        statement: &'t Statement,
    ) -> BoxStream<'t, Result<SqliteRow, StoreError>> {
        bind_params(sqlx::query(&statement.sql), &statement.params)
            .fetch(&mut *self.tx)
            .map_err(StoreError::from)
            .boxed()
    }

    async fn fetch_count(&mut self, statement: &Statement) -> Result<i64, StoreError> {
        let row = bind_params(sqlx::query(&statement.sql), &statement.params)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    async fn commit(self) -> Result<(), StoreError> {
        Ok(self.tx.commit().await?)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(self.tx.rollback().await?)
    }
}
