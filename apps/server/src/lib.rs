//! Pagewise service
//!
//! Serves paged, filtered, sorted customer listings over HTTP. Each page and
//! its total count are read in one database transaction by `pagewise-query`.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod request_context;
pub mod resources;
pub mod response;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
