//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use syllabus_core::{Classify, ErrorClass, gateway::GatewayError};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {source}")]
  Store {
    class:  ErrorClass,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ApiError {
  /// Wrap a backend error, keeping its class for the response status.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    ApiError::Store { class: e.class(), source: Box::new(e) }
  }

  fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Store { class, .. } => match class {
        ErrorClass::Validation => StatusCode::BAD_REQUEST,
        ErrorClass::NotFound => StatusCode::NOT_FOUND,
        ErrorClass::Contention | ErrorClass::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }

  fn is_retryable(&self) -> bool {
    matches!(self, ApiError::Store { class, .. } if class.is_retryable())
  }
}

impl From<syllabus_core::Error> for ApiError {
  fn from(e: syllabus_core::Error) -> Self {
    match e.class() {
      ErrorClass::Validation => ApiError::BadRequest(e.to_string()),
      _ => ApiError::store(e),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl<E> From<GatewayError<E>> for ApiError
where
  E: std::error::Error + Classify + Send + Sync + 'static,
{
  fn from(e: GatewayError<E>) -> Self {
    match e {
      GatewayError::UnknownSource(id) => ApiError::NotFound(format!("source {id} not found")),
      GatewayError::Invalid(e) => e.into(),
      GatewayError::Store(e) => ApiError::store(e),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let retryable = self.is_retryable();
    if status.is_server_error() {
      tracing::warn!(error = %self, retryable, "request failed");
    }
    let body = json!({ "error": self.to_string(), "retryable": retryable });
    (status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use syllabus_core::source::SourceId;

  use super::*;

  #[derive(Debug, Error)]
  #[error("database is locked")]
  struct Busy;

  impl Classify for Busy {
    fn class(&self) -> ErrorClass { ErrorClass::Unavailable }
  }

  #[test]
  fn unknown_source_is_not_found_and_final() {
    let err: ApiError = GatewayError::<Busy>::UnknownSource(SourceId::from("x")).into();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
    assert!(!err.is_retryable());
  }

  #[test]
  fn unavailable_store_is_retryable_503() {
    let err: ApiError = GatewayError::Store(Busy).into();
    assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(err.is_retryable());
  }
}
