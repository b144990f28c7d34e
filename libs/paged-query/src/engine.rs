//! Entry point tying assembly, execution and paging together.

use std::time::Instant;

use tracing::Instrument;

use crate::assemble::assemble;
use crate::context::ExecContext;
use crate::decode::RowDecoder;
use crate::error::ExecutionFailure;
use crate::execute::execute_page;
use crate::params::SearchParams;
use crate::spec::{JoinData, QuerySpec};
use crate::store::{PageStore, StoreRow};
use crate::{Error, Result};

/// Runs paged list queries against one store.
#[derive(Clone, Debug)]
pub struct PagedQuery<S> {
    store: S,
}

impl<S: PageStore> PagedQuery<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch one page of `spec`'s resource.
    ///
    /// On success the returned items are the requested page and `params`
    /// carries the exact total and page count from the same transaction.
    /// On failure `params` is left as it was passed in.
    pub async fn execute<D>(
        &self,
        spec: &QuerySpec<D>,
        params: &mut SearchParams,
        context_joins: &[JoinData],
        ctx: &ExecContext,
    ) -> Result<Vec<D::Item>>
    where
        D: RowDecoder<StoreRow<S>>,
    {
        let span = tracing::info_span!(
            "paged_query",
            resource = spec.resource(),
            request_id = ctx.request_id().unwrap_or(""),
            scope = params.scopes.first().map(String::as_str).unwrap_or(""),
            page_index = params.page_info.page_index,
            items_per_page = params.page_info.items_per_page,
        );

        async move {
            let started = Instant::now();
            let query = assemble(spec, params, context_joins, self.store.count_strategy())?;
            tracing::debug!(
                sql = %query.page.sql,
                params = query.page.params.len(),
                "assembled page query"
            );

            let page = execute_page(&self.store, &query, spec.decoder(), spec.resource(), ctx)
                .await?;
            params.attach_paging(page.total);

            tracing::debug!(
                total = page.total,
                items = page.items.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "paged query completed"
            );
            Ok(page.items)
        }
        .instrument(span)
        .await
    }

    /// [`execute`](Self::execute) on a task of its own.
    ///
    /// Dropping the returned future cancels `ctx`. The task then abandons its
    /// in-flight store step and rolls the transaction back rather than
    /// running on with nobody waiting for it.
    pub async fn execute_detached<D>(
        &self,
        spec: &'static QuerySpec<D>,
        mut params: SearchParams,
        context_joins: Vec<JoinData>,
        ctx: ExecContext,
    ) -> Result<(Vec<D::Item>, SearchParams)>
    where
        S: Clone + 'static,
        D: RowDecoder<StoreRow<S>> + 'static,
        D::Item: 'static,
    {
        let engine = self.clone();
        let _cancel_on_drop = ctx.cancellation_token().clone().drop_guard();

        let task = tokio::spawn(async move {
            let items = engine
                .execute(spec, &mut params, &context_joins, &ctx)
                .await?;
            Ok::<_, Error>((items, params))
        });

        task.await.map_err(|e| {
            Error::server(spec.resource(), ExecutionFailure::Task(e.to_string()))
        })?
    }
}
