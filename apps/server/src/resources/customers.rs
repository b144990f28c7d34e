//! Customers resource
//!
//! - scope `All`: every customer
//! - scope `Active`: customers with at least one package still in flight
//! - terms: phone-like terms match either phone column, anything else
//!   matches name or email
//! - sorts: `name-asc`, `name-desc`

use lazy_static::lazy_static;
use pagewise_query::{
    escape_like, ExecContext, Fragment, FromRowDecoder, JoinData, QuerySpec, SearchParams,
    TermRejected,
};
use serde::Serialize;

use crate::state::{AppState, Database};
use crate::Result;

/// Package statuses that make a customer active.
pub const ACTIVE_PACKAGE_STATUSES: [&str; 7] = [
    "CREATED",
    "REJECTED",
    "ACCEPTED",
    "PACKAGED",
    "PICKED_UP",
    "SORTED",
    "OUT_FOR_DELIVERY",
];

const MAX_TERM_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub store_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub phone_backup: Option<String>,
}

lazy_static! {
    pub static ref CUSTOMERS: QuerySpec<FromRowDecoder<Customer>> = QuerySpec::new(
        "customers",
        "c.id, c.store_id, c.name, c.email, c.phone, c.phone_backup",
        "customers c",
        FromRowDecoder::new(),
    )
    .with_scope("All", JoinData::unrestricted())
    .with_scope("Active", JoinData::join(active_packages_join()))
    .with_term_predicate(customer_term)
    .with_sort("name-asc", "c.name ASC")
    .with_sort("name-desc", "c.name DESC");
}

fn active_packages_join() -> Fragment {
    let placeholders = vec!["?"; ACTIVE_PACKAGE_STATUSES.len()].join(", ");
    ACTIVE_PACKAGE_STATUSES.iter().fold(
        Fragment::new(format!(
            "JOIN packages p ON p.customer_id = c.id AND p.status IN ({})",
            placeholders
        )),
        |fragment, status| fragment.bind(*status),
    )
}

/// Digits plus common phone punctuation, with at least one digit.
pub fn is_phone_like(term: &str) -> bool {
    term.chars().any(|c| c.is_ascii_digit())
        && term
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | ' ' | '(' | ')' | '+' | '.'))
}

fn customer_term(term: &str) -> std::result::Result<Fragment, TermRejected> {
    if term.chars().count() > MAX_TERM_LEN {
        return Err(TermRejected(format!(
            "terms are limited to {} characters",
            MAX_TERM_LEN
        )));
    }

    let pattern = format!("%{}%", escape_like(term));
    let sql = if is_phone_like(term) {
        "c.phone LIKE ? ESCAPE '!' OR c.phone_backup LIKE ? ESCAPE '!'"
    } else {
        "c.name LIKE ? ESCAPE '!' OR c.email LIKE ? ESCAPE '!'"
    };
    Ok(Fragment::new(sql).bind(pattern.clone()).bind(pattern))
}

/// Restricts a listing to one store.
pub fn in_store(store_id: i64) -> JoinData {
    JoinData::filter(Fragment::new("c.store_id = ?").bind(store_id))
}

/// Fetch one page of customers.
///
/// The query runs on its own task. If the caller goes away first, the task
/// rolls its transaction back.
pub async fn list(
    state: &AppState,
    params: SearchParams,
    context: Vec<JoinData>,
    ctx: ExecContext,
) -> Result<(Vec<Customer>, SearchParams)> {
    let page = match &state.db {
        Database::Sqlite(engine) => {
            engine
                .execute_detached(&*CUSTOMERS, params, context, ctx)
                .await
        }
        Database::MySql(engine) => {
            engine
                .execute_detached(&*CUSTOMERS, params, context, ctx)
                .await
        }
    }?;
    Ok(page)
}
