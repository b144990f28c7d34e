//! MySQL store.
//!
//! Page transactions rely on InnoDB's REPEATABLE READ: the first read of a
//! transaction fixes its snapshot, so the page read and the count read see
//! the same data. Pools handed to [`MySqlStore`] must not lower the session
//! isolation level below that. The default count
//! strategy uses `SQL_CALC_FOUND_ROWS` / `FOUND_ROWS()`; servers that have
//! removed it can be switched to a re-count.

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, Row, Transaction};

use super::{bind_params, PageStore, PageTransaction};
use crate::assemble::{CountStrategy, Statement};
use crate::error::StoreError;

#[derive(Clone, Debug)]
pub struct MySqlStore {
    pool: MySqlPool,
    count_strategy: CountStrategy,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            count_strategy: CountStrategy::FoundRows,
        }
    }

    pub fn with_count_strategy(mut self, strategy: CountStrategy) -> Self {
        self.count_strategy = strategy;
        self
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl PageStore for MySqlStore {
    type Transaction = MySqlTransaction;

    fn count_strategy(&self) -> CountStrategy {
        self.count_strategy
    }

    async fn begin(&self) -> Result<MySqlTransaction, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(MySqlTransaction { tx })
    }
}

pub struct MySqlTransaction {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl PageTransaction for MySqlTransaction {
    type Row = MySqlRow;

    fn fetch<'t>(
        &'t mut self,
        statement: &'t Statement,
    ) -> BoxStream<'t, Result<MySqlRow, StoreError>> {
        bind_params(sqlx::query(&statement.sql), &statement.params)
            .fetch(&mut *self.tx)
            .map_err(StoreError::from)
            .boxed()
    }

    async fn fetch_count(&mut self, statement: &Statement) -> Result<i64, StoreError> {
        let row = bind_params(sqlx::query(&statement.sql), &statement.params)
            .fetch_one(&mut *self.tx)
            .await?;
        // FOUND_ROWS() is BIGINT UNSIGNED, COUNT(*) is signed
        match row.try_get::<i64, _>(0) {
            Ok(total) => Ok(total),
            Err(_) => {
                let total = row.try_get::<u64, _>(0)?;
                i64::try_from(total).map_err(|_| {
                    StoreError::Backend(format!("total count {} out of range", total))
                })
            }
        }
    }

    async fn commit(self) -> Result<(), StoreError> {
        Ok(self.tx.commit().await?)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(self.tx.rollback().await?)
    }
}
