//! SQL assembly for paged list queries.
//!
//! Builds one page statement and one total-count statement from a
//! [`QuerySpec`], validated [`SearchParams`] and the caller's context joins:
//! - context joins in caller order, then the scope join
//! - one predicate per search term, AND-ed together
//! - ORDER BY from the sort table, LIMIT from the page info
//!
//! Bound values are ordered by where their placeholders appear in the SQL
//! text: all join clauses (FROM) first, then all filters (WHERE).

use serde::Deserialize;

use crate::bind::{count_placeholders, push_fragment, BindValue, Fragment};
use crate::error::ExecutionFailure;
use crate::params::SearchParams;
use crate::spec::{EmptySortPolicy, JoinData, QuerySpec};
use crate::{Error, Result};

/// How the exact total is read back inside the page transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountStrategy {
    /// `SQL_CALC_FOUND_ROWS` on the page statement, then `SELECT FOUND_ROWS()`.
    FoundRows,
    /// `SELECT COUNT(*)` over the page statement without ORDER BY / LIMIT.
    Requery,
}

impl CountStrategy {
    fn select_marker(self) -> &'static str {
        match self {
            Self::FoundRows => "SQL_CALC_FOUND_ROWS ",
            Self::Requery => "",
        }
    }
}

/// A statement and the values for its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl Statement {
    fn is_balanced(&self) -> bool {
        count_placeholders(&self.sql) == self.params.len()
    }
}

/// The page statement plus the statement that reads its exact total.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledQuery {
    pub page: Statement,
    pub count: Statement,
}

/// Assemble the page and count statements for one request.
///
/// Client errors (unknown scope, rejected term, bad sort) come back as
/// [`Error::BadRequest`] / [`Error::UnprocessableEntity`]. A placeholder /
/// parameter mismatch means the resource configuration is broken and comes
/// back as a server error.
pub fn assemble<D>(
    spec: &QuerySpec<D>,
    params: &SearchParams,
    context_joins: &[JoinData],
    strategy: CountStrategy,
) -> Result<AssembledQuery> {
    let scope_name = params.ensure_single_scope()?;

    let mut from = format!("FROM {}", spec.base_from());
    let mut from_params = Vec::new();
    let mut filters = String::new();
    let mut filter_params = Vec::new();

    for join in context_joins {
        push_join(&mut from, &mut from_params, &mut filters, &mut filter_params, join);
    }

    let scope = spec
        .scope(scope_name)
        .ok_or_else(|| Error::bad_request(format!("Found unknown scope: '{}'.", scope_name)))?;
    push_join(&mut from, &mut from_params, &mut filters, &mut filter_params, scope);

    if !params.terms.is_empty() {
        let Some(predicate) = spec.term_predicate() else {
            return Err(Error::bad_request(format!(
                "Search terms are not supported for {}.",
                spec.resource()
            )));
        };
        for term in &params.terms {
            let fragment = predicate(term).map_err(|rejected| {
                Error::bad_request(format!(
                    "Could not process search term '{}': {}",
                    term, rejected
                ))
            })?;
            push_filter(&mut filters, &mut filter_params, &fragment);
        }
    }

    let order_by = resolve_sort(spec, &params.sort)?;

    // the always-true sentinel is only emitted when something follows it
    let where_clause = if filters.is_empty() {
        String::new()
    } else {
        format!(" WHERE TRUE{}", filters)
    };

    let mut bound = from_params;
    bound.extend(filter_params);

    let mut page_sql = format!(
        "SELECT DISTINCT {}{} {}{}",
        strategy.select_marker(),
        spec.fields(),
        from,
        where_clause
    );
    if let Some(order_by) = order_by {
        page_sql.push_str(" ORDER BY ");
        page_sql.push_str(order_by);
    }
    page_sql.push_str(&format!(
        " LIMIT {}, {}",
        params.page_info.offset(),
        params.page_info.items_per_page
    ));

    let count = match strategy {
        CountStrategy::FoundRows => Statement {
            sql: "SELECT FOUND_ROWS()".to_string(),
            params: Vec::new(),
        },
        CountStrategy::Requery => Statement {
            sql: format!(
                "SELECT COUNT(*) FROM (SELECT DISTINCT {} {}{}) AS page_count",
                spec.fields(),
                from,
                where_clause
            ),
            params: bound.clone(),
        },
    };

    let page = Statement {
        sql: page_sql,
        params: bound,
    };

    for statement in [&page, &count] {
        if !statement.is_balanced() {
            return Err(Error::server(
                spec.resource(),
                ExecutionFailure::MalformedQuery {
                    placeholders: count_placeholders(&statement.sql),
                    params: statement.params.len(),
                },
            ));
        }
    }

    Ok(AssembledQuery { page, count })
}

fn push_join(
    from: &mut String,
    from_params: &mut Vec<BindValue>,
    filters: &mut String,
    filter_params: &mut Vec<BindValue>,
    join: &JoinData,
) {
    if !join.join.is_empty() {
        from.push(' ');
        push_fragment(from, from_params, &join.join);
    }
    push_filter(filters, filter_params, &join.filter);
}

fn push_filter(
    filters: &mut String,
    filter_params: &mut Vec<BindValue>,
    fragment: &Fragment,
) {
    if fragment.is_empty() {
        return;
    }
    filters.push_str(" AND (");
    push_fragment(filters, filter_params, fragment);
    filters.push(')');
}

fn resolve_sort<'a, D>(spec: &'a QuerySpec<D>, sort: &str) -> Result<Option<&'a str>> {
    if sort.is_empty() && spec.empty_sort() == EmptySortPolicy::Unordered {
        return Ok(None);
    }
    spec.sort(sort)
        .map(Some)
        .ok_or_else(|| Error::unprocessable(format!("Bad sort value: '{}'.", sort)))
}
