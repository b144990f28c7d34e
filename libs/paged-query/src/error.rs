//! Error types for paged list queries
//!
//! Errors fall into two families. Client input errors (unknown scope, bad
//! sort, malformed term or paging field) are raised before any store I/O.
//! Server errors are raised by the executor after the transaction has been
//! rolled back; their message names the resource and the underlying
//! [`ExecutionFailure`] is kept as the error source.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    UnprocessableEntity(String),

    #[error("{message}")]
    Server {
        resource: String,
        message: String,
        #[source]
        cause: ExecutionFailure,
    },
}

/// Coarse classification an HTTP layer can map to status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    BadRequest,
    UnprocessableEntity,
    Server,
}

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::UnprocessableEntity(message.into())
    }

    pub(crate) fn server(resource: &str, cause: ExecutionFailure) -> Self {
        Self::Server {
            resource: resource.to_string(),
            message: format!("Could not retrieve {}.", resource),
            cause,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::BadRequest(_) => ErrorClass::BadRequest,
            Self::UnprocessableEntity(_) => ErrorClass::UnprocessableEntity,
            Self::Server { .. } => ErrorClass::Server,
        }
    }

    pub fn is_client_error(&self) -> bool {
        !matches!(self.class(), ErrorClass::Server)
    }

    /// The execution failure behind a server error, if any.
    pub fn execution_failure(&self) -> Option<&ExecutionFailure> {
        match self {
            Self::Server { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// What went wrong inside (or just before) the page transaction.
#[derive(Error, Debug)]
pub enum ExecutionFailure {
    #[error("could not begin transaction: {0}")]
    Begin(#[source] StoreError),

    #[error("page query failed: {0}")]
    Query(#[source] StoreError),

    #[error("could not decode row: {0}")]
    Decode(#[source] DecodeError),

    #[error("total count readback failed: {0}")]
    Count(#[source] StoreError),

    #[error("commit failed: {0}")]
    Commit(#[source] StoreError),

    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    #[error("query task ended abnormally: {0}")]
    Task(String),

    #[error("assembled query has {placeholders} placeholders but {params} bound parameters")]
    MalformedQuery { placeholders: usize, params: usize },
}

/// Errors reported by a [`crate::store::PageStore`] implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Backend(String),
}

/// Errors reported by a row decoder. Kept apart from [`StoreError`] so a
/// caller can tell a schema/mapping problem from a connectivity problem.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("column error: {0}")]
    Column(#[from] sqlx::Error),

    #[error("invalid value: {0}")]
    Invalid(String),
}
