//! Error types for the service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pagewise_query::ErrorClass;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Query(#[from] pagewise_query::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Query(e) => match e.class() {
                ErrorClass::BadRequest => StatusCode::BAD_REQUEST,
                ErrorClass::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorClass::Server => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Database(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // logged by the handler, which knows the environment
            Error::Query(e) if e.is_client_error() => e.to_string(),
            // resource-level message only; the cause chain stays in the logs
            Error::Query(e) => {
                tracing::error!(error = %e, cause = %error_chain(e), "List query failed");
                e.to_string()
            }
            Error::Database(_) | Error::Internal(_) => {
                tracing::error!("Internal error: {}", self);
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "error": {
                "code": status.as_u16(),
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut parts = Vec::new();
    let mut source = error.source();
    while let Some(e) = source {
        parts.push(e.to_string());
        source = e.source();
    }
    parts.join(": ")
}
