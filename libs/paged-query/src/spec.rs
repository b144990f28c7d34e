//! Per-resource list query configuration.
//!
//! A [`QuerySpec`] is built once per resource type at startup and shared
//! read-only by every request afterwards. Its scope and sort tables are
//! closed: only the keys registered here are ever accepted.

use thiserror::Error;

use crate::bind::{count_placeholders, Fragment};
use crate::error::ExecutionFailure;

/// Turns one search term into a WHERE predicate plus its bound values.
///
/// A plain function pointer: predicates carry no state, and the set of
/// predicates a resource supports is fixed when its spec is built.
pub type TermPredicate = fn(&str) -> Result<Fragment, TermRejected>;

/// Returned by a [`TermPredicate`] for a term it cannot express.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TermRejected(pub String);

/// A join plus the predicate that goes with it.
///
/// Used for scope joins (selected by query parameters) and for context joins
/// (derived from the request path, e.g. "customers under store X").
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JoinData {
    pub join: Fragment,
    pub filter: Fragment,
}

impl JoinData {
    /// A scope or context that only restricts rows.
    pub fn filter(filter: Fragment) -> Self {
        Self {
            join: Fragment::default(),
            filter,
        }
    }

    /// A scope or context that only joins another table.
    pub fn join(join: Fragment) -> Self {
        Self {
            join,
            filter: Fragment::default(),
        }
    }

    pub fn with_filter(mut self, filter: Fragment) -> Self {
        self.filter = filter;
        self
    }

    /// A join that neither joins nor restricts (e.g. an "All" scope).
    pub fn unrestricted() -> Self {
        Self::default()
    }
}

/// What an empty `sort` value means for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptySortPolicy {
    /// An empty sort is a bad sort value like any other unknown key.
    #[default]
    Reject,
    /// An empty sort emits no ORDER BY; LIMIT still applies.
    Unordered,
}

/// Schema-specific configuration of a paged list query.
#[derive(Clone)]
pub struct QuerySpec<D> {
    resource: String,
    fields: String,
    base_from: String,
    scopes: Vec<(String, JoinData)>,
    term_predicate: Option<TermPredicate>,
    sorts: Vec<(String, String)>,
    empty_sort: EmptySortPolicy,
    decoder: D,
}

impl<D> std::fmt::Debug for QuerySpec<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySpec")
            .field("resource", &self.resource)
            .field("fields", &self.fields)
            .field("base_from", &self.base_from)
            .field("scopes", &self.scopes)
            .field("has_term_predicate", &self.term_predicate.is_some())
            .field("sorts", &self.sorts)
            .field("empty_sort", &self.empty_sort)
            .finish_non_exhaustive()
    }
}

impl<D> QuerySpec<D> {
    /// `fields` is the projection list, `base_from` the table expression
    /// that is always present (without the `FROM` keyword).
    pub fn new(
        resource: impl Into<String>,
        fields: impl Into<String>,
        base_from: impl Into<String>,
        decoder: D,
    ) -> Self {
        Self {
            resource: resource.into(),
            fields: fields.into(),
            base_from: base_from.into(),
            scopes: Vec::new(),
            term_predicate: None,
            sorts: Vec::new(),
            empty_sort: EmptySortPolicy::default(),
            decoder,
        }
    }

    pub fn with_scope(mut self, name: impl Into<String>, join: JoinData) -> Self {
        let name = name.into();
        self.scopes.retain(|(existing, _)| *existing != name);
        self.scopes.push((name, join));
        self
    }

    pub fn with_term_predicate(mut self, predicate: TermPredicate) -> Self {
        self.term_predicate = Some(predicate);
        self
    }

    /// Register a sort key and the ORDER BY expression it stands for.
    pub fn with_sort(mut self, key: impl Into<String>, order_by: impl Into<String>) -> Self {
        let key = key.into();
        self.sorts.retain(|(existing, _)| *existing != key);
        self.sorts.push((key, order_by.into()));
        self
    }

    pub fn with_empty_sort(mut self, policy: EmptySortPolicy) -> Self {
        self.empty_sort = policy;
        self
    }

    /// Resource name used in diagnostics.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn fields(&self) -> &str {
        &self.fields
    }

    pub fn base_from(&self) -> &str {
        &self.base_from
    }

    pub fn scope(&self, name: &str) -> Option<&JoinData> {
        self.scopes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, join)| join)
    }

    pub fn scope_names(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(|(key, _)| key.as_str())
    }

    pub fn term_predicate(&self) -> Option<TermPredicate> {
        self.term_predicate
    }

    pub fn sort(&self, key: &str) -> Option<&str> {
        self.sorts
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, order_by)| order_by.as_str())
    }

    pub fn empty_sort(&self) -> EmptySortPolicy {
        self.empty_sort
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Fails if a registered scope join or filter binds a different number
    /// of values than it has placeholders.
    pub fn check(&self) -> crate::Result<()> {
        for (_, scope) in &self.scopes {
            for fragment in [&scope.join, &scope.filter] {
                if !fragment.is_balanced() {
                    return Err(crate::Error::server(
                        &self.resource,
                        ExecutionFailure::MalformedQuery {
                            placeholders: count_placeholders(fragment.sql()),
                            params: fragment.params().len(),
                        },
                    ));
                }
            }
        }
        Ok(())
    }
}
