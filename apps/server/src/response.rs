//! Response envelope shared by list endpoints.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use pagewise_query::SearchParams;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub data: T,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_params: Option<SearchParams>,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            message: String::new(),
            search_params: None,
        }
    }

    pub fn with_search_params(mut self, params: SearchParams) -> Self {
        self.search_params = Some(params);
        self
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
