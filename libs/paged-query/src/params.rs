//! Search parameter parsing and validation
//!
//! Handles the caller-facing request shape of a list query:
//! - `scopes` - comma separated, exactly one required
//! - `terms` - comma separated free-text tokens, may be empty
//! - `sort` - a single sort key, checked later against the resource's sort table
//! - `pageIndex` / `itemsPerPage` - 1-based paging, with `itemsPerPage` clamped

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const DEFAULT_ITEMS_PER_PAGE: u32 = 100;
pub const MIN_ITEMS_PER_PAGE: u32 = 20;
pub const MAX_ITEMS_PER_PAGE: u32 = 250;

/// Paging request, and after execution, paging results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// 1-based index
    pub page_index: u32,
    pub items_per_page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_item_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_page_count: Option<i64>,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            page_index: 1,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            total_item_count: None,
            total_page_count: None,
        }
    }
}

impl PageInfo {
    /// Zero-based row offset of the first item on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page_index.saturating_sub(1)) * u64::from(self.items_per_page)
    }
}

/// Validated search parameters for one list request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub scopes: Vec<String>,
    pub terms: Vec<String>,
    pub sort: String,
    pub page_info: PageInfo,
}

/// Unvalidated search parameters as they arrive from a query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSearchParams {
    pub scopes: Option<String>,
    pub terms: Option<String>,
    pub sort: Option<String>,
    pub page_index: Option<String>,
    pub items_per_page: Option<String>,
}

impl SearchParams {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scopes: vec![scope.into()],
            terms: Vec::new(),
            sort: String::new(),
            page_info: PageInfo::default(),
        }
    }

    pub fn with_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms = terms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    /// Set the requested page. `items_per_page` is clamped like parsed input.
    pub fn with_page(mut self, page_index: u32, items_per_page: u32) -> Self {
        self.page_info = PageInfo {
            page_index: page_index.max(1),
            items_per_page: clamp_items_per_page(i64::from(items_per_page)),
            total_item_count: None,
            total_page_count: None,
        };
        self
    }

    /// Parse search parameters from ordered (key, value) query items.
    ///
    /// Unknown keys are ignored; a repeated key keeps its last value.
    pub fn from_items(items: &[(String, String)]) -> Result<Self> {
        let mut raw = RawSearchParams::default();
        for (key, value) in items {
            let slot = match key.as_str() {
                "scopes" => &mut raw.scopes,
                "terms" => &mut raw.terms,
                "sort" => &mut raw.sort,
                "pageIndex" => &mut raw.page_index,
                "itemsPerPage" => &mut raw.items_per_page,
                _ => continue,
            };
            *slot = Some(value.clone());
        }
        Self::try_from(raw)
    }

    /// Fails unless exactly one scope is present.
    pub fn ensure_single_scope(&self) -> Result<&str> {
        match self.scopes.as_slice() {
            [scope] => Ok(scope.as_str()),
            [] => Err(Error::bad_request("No scope specified.")),
            _ => Err(Error::bad_request(
                "We currently only support a single scope.",
            )),
        }
    }
}

impl TryFrom<RawSearchParams> for SearchParams {
    type Error = Error;

    fn try_from(raw: RawSearchParams) -> Result<Self> {
        let mut scopes: Vec<String> = Vec::new();
        for scope in split_list(raw.scopes.as_deref()) {
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }

        let terms = split_list(raw.terms.as_deref());
        let sort = raw.sort.map(|s| s.trim().to_string()).unwrap_or_default();

        let page_index = match non_empty(raw.page_index.as_deref()) {
            Some(value) => match value.parse::<u32>() {
                Ok(parsed) if parsed >= 1 => parsed,
                _ => {
                    return Err(Error::bad_request(format!(
                        "Could not parse pageIndex: {}",
                        value
                    )))
                }
            },
            None => 1,
        };

        let items_per_page = match non_empty(raw.items_per_page.as_deref()) {
            Some(value) => {
                let parsed: i64 = value.parse().map_err(|_| {
                    Error::bad_request(format!("Could not parse itemsPerPage: {}", value))
                })?;
                clamp_items_per_page(parsed)
            }
            None => DEFAULT_ITEMS_PER_PAGE,
        };

        let params = Self {
            scopes,
            terms,
            sort,
            page_info: PageInfo {
                page_index,
                items_per_page,
                total_item_count: None,
                total_page_count: None,
            },
        };
        params.ensure_single_scope()?;
        Ok(params)
    }
}

/// Out-of-range values are coerced into range rather than rejected.
pub fn clamp_items_per_page(requested: i64) -> u32 {
    // the clamp bounds fit in u32
    requested.clamp(i64::from(MIN_ITEMS_PER_PAGE), i64::from(MAX_ITEMS_PER_PAGE)) as u32
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
