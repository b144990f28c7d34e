//! Paginated, filtered, sorted list queries over a relational store.
//!
//! A [`QuerySpec`] describes one resource: its projection, its named scopes,
//! how a search term becomes a predicate and which sort keys exist.
//! [`PagedQuery::execute`] turns validated [`SearchParams`] into a page of
//! decoded rows plus the exact total, both read inside one transaction.
//!
//! ```no_run
//! # async fn demo(pool: sqlx::SqlitePool) -> pagewise_query::Result<()> {
//! use pagewise_query::{
//!     ExecContext, FromRowDecoder, JoinData, PagedQuery, QuerySpec, SearchParams, SqliteStore,
//! };
//!
//! #[derive(sqlx::FromRow)]
//! struct Widget {
//!     id: i64,
//!     name: String,
//! }
//!
//! let spec = QuerySpec::new("widgets", "w.id, w.name", "widgets w", FromRowDecoder::<Widget>::new())
//!     .with_scope("All", JoinData::unrestricted())
//!     .with_sort("name-asc", "w.name ASC");
//!
//! let engine = PagedQuery::new(SqliteStore::new(pool));
//! let mut params = SearchParams::new("All").with_sort("name-asc").with_page(1, 20);
//! let widgets = engine.execute(&spec, &mut params, &[], &ExecContext::new()).await?;
//! println!("{} of {:?}", widgets.len(), params.page_info.total_item_count);
//! # Ok(())
//! # }
//! ```

pub mod assemble;
pub mod bind;
pub mod context;
pub mod decode;
pub mod engine;
pub mod error;
pub mod execute;
pub mod paging;
pub mod params;
pub mod spec;
pub mod store;

pub use assemble::{assemble, AssembledQuery, CountStrategy, Statement};
pub use bind::{escape_like, BindValue, Fragment};
pub use context::ExecContext;
pub use decode::{FromRowDecoder, RowDecoder};
pub use engine::PagedQuery;
pub use error::{DecodeError, Error, ErrorClass, ExecutionFailure, Result, StoreError};
pub use execute::{execute_page, Page};
pub use paging::total_page_count;
pub use params::{PageInfo, RawSearchParams, SearchParams};
pub use spec::{EmptySortPolicy, JoinData, QuerySpec, TermPredicate, TermRejected};
pub use store::{PageStore, PageTransaction, StoreRow};

#[cfg(feature = "mysql")]
pub use store::mysql::{MySqlStore, MySqlTransaction};
#[cfg(feature = "sqlite")]
pub use store::sqlite::{SqliteStore, SqliteTransaction};
