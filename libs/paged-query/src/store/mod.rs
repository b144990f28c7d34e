//! Transactional store seam.
//!
//! A [`PageStore`] hands out one [`PageTransaction`] per paged query. Both the
//! page rows and the total count are read through that transaction, so they
//! describe the same snapshot of the data.

use async_trait::async_trait;
use futures::stream::BoxStream;
use sqlx::{Database, Encode, Type};

use crate::assemble::{CountStrategy, Statement};
use crate::bind::BindValue;
use crate::error::StoreError;

#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[async_trait]
pub trait PageStore: Send + Sync {
    type Transaction: PageTransaction;

    /// How this store reads back the exact total.
    fn count_strategy(&self) -> CountStrategy;

    /// Open a transaction at an isolation level that gives its statements a
    /// consistent view of the data.
    async fn begin(&self) -> Result<Self::Transaction, StoreError>;
}

/// One open transaction.
///
/// `fetch` borrows the transaction for as long as its rows are being read,
/// so no other statement can be issued while the cursor is open.
#[async_trait]
pub trait PageTransaction: Send {
    type Row: Send;

    fn fetch<'t>(
        &'t mut self,
        statement: &'t Statement,
    ) -> BoxStream<'t, Result<Self::Row, StoreError>>;

    /// Run a statement that returns a single integer.
    async fn fetch_count(&mut self, statement: &Statement) -> Result<i64, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}

/// Row type produced by a store's transactions.
pub type StoreRow<S> = <<S as PageStore>::Transaction as PageTransaction>::Row;

/// Bind values onto an `sqlx` query in placeholder order.
pub(crate) fn bind_params<'q, DB>(
    mut query: sqlx::query::Query<'q, DB, <DB as Database>::Arguments<'q>>,
    params: &'q [BindValue],
) -> sqlx::query::Query<'q, DB, <DB as Database>::Arguments<'q>>
where
    DB: Database,
    &'q str: Encode<'q, DB> + Type<DB>,
    i64: Encode<'q, DB> + Type<DB>,
    f64: Encode<'q, DB> + Type<DB>,
    bool: Encode<'q, DB> + Type<DB>,
{
    for value in params {
        query = match value {
            BindValue::Text(v) => query.bind(v.as_str()),
            BindValue::Int(v) => query.bind(*v),
            BindValue::Float(v) => query.bind(*v),
            BindValue::Bool(v) => query.bind(*v),
        };
    }
    query
}
