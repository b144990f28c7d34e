//! Customer listing handlers
//!
//! - `GET /customers`
//! - `GET /stores/{store_id}/customers`
//!
//! Both accept `scopes`, `terms`, `sort`, `pageIndex` and `itemsPerPage`.

use axum::extract::{Extension, Path, Query, State};
use pagewise_query::{JoinData, SearchParams};

use crate::{
    request_context::RequestContext,
    resources::customers::{self, Customer},
    response::Envelope,
    state::AppState,
    Error, Result,
};

pub async fn list_customers(
    State(state): State<AppState>,
    Extension(request): Extension<RequestContext>,
    Query(items): Query<Vec<(String, String)>>,
) -> Result<Envelope<Vec<Customer>>> {
    list(&state, &request, &items, Vec::new()).await
}

pub async fn list_store_customers(
    State(state): State<AppState>,
    Extension(request): Extension<RequestContext>,
    Path(store_id): Path<i64>,
    Query(items): Query<Vec<(String, String)>>,
) -> Result<Envelope<Vec<Customer>>> {
    list(&state, &request, &items, vec![customers::in_store(store_id)]).await
}

async fn list(
    state: &AppState,
    request: &RequestContext,
    items: &[(String, String)],
    context: Vec<JoinData>,
) -> Result<Envelope<Vec<Customer>>> {
    let result = fetch(state, request, items, context).await;
    if let Err(Error::Query(e)) = &result {
        if e.is_client_error() && !state.config.is_production() {
            tracing::debug!(error = %e, "Rejected list request");
        }
    }
    result
}

async fn fetch(
    state: &AppState,
    request: &RequestContext,
    items: &[(String, String)],
    context: Vec<JoinData>,
) -> Result<Envelope<Vec<Customer>>> {
    let params = SearchParams::from_items(items)?;
    let ctx = request.exec_context(state.config.server.request_timeout());

    let (data, params) = customers::list(state, params, context, ctx).await?;
    Ok(Envelope::new(data).with_search_params(params))
}
