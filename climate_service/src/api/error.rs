//! Request failure mapping.
//!
//! Clients only ever see a bare 500; the cause goes to the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::logging::{self, Source};
use crate::model::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Blocking query task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Task(err) = &self {
            logging::error(Source::Http, None, &err.to_string());
        }
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}
