//! Transactional page execution.
//!
//! One paged query runs as `begin -> drain page rows -> read total -> commit`.
//! Each state owns the open transaction, so a state can only be reached
//! through the one before it: the count statement is never issued while the
//! row cursor is open, and commit only happens after both reads succeeded.
//! Every failure path rolls the transaction back explicitly.

use futures::StreamExt;

use crate::assemble::{AssembledQuery, Statement};
use crate::context::ExecContext;
use crate::decode::RowDecoder;
use crate::error::ExecutionFailure;
use crate::store::{PageStore, PageTransaction, StoreRow};
use crate::{Error, Result};

/// The rows of one page and the exact total they were counted against.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

struct Began<T> {
    tx: T,
}

struct Drained<T, I> {
    tx: T,
    items: Vec<I>,
}

struct Counted<T, I> {
    tx: T,
    items: Vec<I>,
    total: i64,
}

/// A failed step, still holding the transaction that must be rolled back.
struct Aborted<T> {
    tx: T,
    failure: ExecutionFailure,
}

impl<T: PageTransaction> Began<T> {
    async fn drain<D>(
        mut self,
        statement: &Statement,
        decoder: &D,
        ctx: &ExecContext,
    ) -> std::result::Result<Drained<T, D::Item>, Aborted<T>>
    where
        D: RowDecoder<T::Row>,
    {
        let step = async {
            let mut rows = self.tx.fetch(statement);
            let mut items = Vec::new();
            while let Some(row) = rows.next().await {
                let row = row.map_err(ExecutionFailure::Query)?;
                items.push(decoder.decode(&row).map_err(ExecutionFailure::Decode)?);
            }
            Ok::<_, ExecutionFailure>(items)
        };

        match ctx.guard(step).await {
            Ok(items) => Ok(Drained { tx: self.tx, items }),
            Err(failure) => Err(Aborted {
                tx: self.tx,
                failure,
            }),
        }
    }
}

impl<T: PageTransaction, I> Drained<T, I> {
    async fn count(
        mut self,
        statement: &Statement,
        ctx: &ExecContext,
    ) -> std::result::Result<Counted<T, I>, Aborted<T>> {
        let step = async {
            self.tx
                .fetch_count(statement)
                .await
                .map_err(ExecutionFailure::Count)
        };

        match ctx.guard(step).await {
            Ok(total) => Ok(Counted {
                tx: self.tx,
                items: self.items,
                total,
            }),
            Err(failure) => Err(Aborted {
                tx: self.tx,
                failure,
            }),
        }
    }
}

impl<T: PageTransaction, I> Counted<T, I> {
    async fn commit(self) -> std::result::Result<Page<I>, ExecutionFailure> {
        self.tx.commit().await.map_err(ExecutionFailure::Commit)?;
        Ok(Page {
            items: self.items,
            total: self.total,
        })
    }
}

impl<T: PageTransaction> Aborted<T> {
    /// Roll back, then surface the original failure.
    async fn abort(self) -> ExecutionFailure {
        if let Err(e) = self.tx.rollback().await {
            tracing::warn!(error = %e, failure = %self.failure, "rollback after failed page step also failed");
        }
        self.failure
    }
}

async fn run_page<S, D>(
    store: &S,
    query: &AssembledQuery,
    decoder: &D,
    ctx: &ExecContext,
) -> std::result::Result<Page<D::Item>, ExecutionFailure>
where
    S: PageStore,
    D: RowDecoder<StoreRow<S>>,
{
    let tx = ctx
        .guard(async { store.begin().await.map_err(ExecutionFailure::Begin) })
        .await?;
    let began = Began { tx };

    let drained = match began.drain(&query.page, decoder, ctx).await {
        Ok(drained) => drained,
        Err(aborted) => return Err(aborted.abort().await),
    };

    let counted = match drained.count(&query.count, ctx).await {
        Ok(counted) => counted,
        Err(aborted) => return Err(aborted.abort().await),
    };

    counted.commit().await
}

/// Run an assembled page query and its count in one transaction.
///
/// Any failure after the transaction opened is reported only after the
/// transaction has been rolled back.
pub async fn execute_page<S, D>(
    store: &S,
    query: &AssembledQuery,
    decoder: &D,
    resource: &str,
    ctx: &ExecContext,
) -> Result<Page<D::Item>>
where
    S: PageStore,
    D: RowDecoder<StoreRow<S>>,
{
    run_page(store, query, decoder, ctx).await.map_err(|failure| {
        tracing::debug!(resource, error = %failure, "paged query rolled back");
        Error::server(resource, failure)
    })
}
