//! Shared error types.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;

use crate::domain::GameState;

/// Failures from the analysis collaborator. The session treats all of them the same way.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalysisError {
  #[error("Missing VISION_ENDPOINT or VISION_KEY")]
  Configuration,
  #[error("Provide image URL or bytes")]
  NoImage,
  #[error("analysis request failed: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("analysis failed with status {status}")]
  Status { status: u16, body: String },
  #[error("analysis response could not be decoded: {0}")]
  Decode(String),
  #[error("analysis returned no caption")]
  MissingCaption,
}

impl AnalysisError {
  /// Short category name shown to clients.
  pub fn kind(&self) -> &'static str {
    match self {
      AnalysisError::Configuration => "configuration",
      AnalysisError::NoImage => "input",
      _ => "transport",
    }
  }
}

impl IntoResponse for AnalysisError {
  fn into_response(self) -> Response {
    match self {
      AnalysisError::NoImage => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": self.to_string() }))).into_response()
      }
      // Forward the provider's status and body untouched.
      AnalysisError::Status { status, body } => {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
        let body = serde_json::from_str::<serde_json::Value>(&body)
          .unwrap_or_else(|_| json!({ "error": body }));
        (status, Json(body)).into_response()
      }
      other => {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": other.to_string() }))).into_response()
      }
    }
  }
}

/// Rejected or failed session transitions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
  #[error("Provide an image URL or upload a file.")]
  NoImage,
  #[error("an analysis is already in flight")]
  Busy,
  #[error("cannot {action} while {state}")]
  InvalidState { action: &'static str, state: GameState },
  #[error(transparent)]
  Analysis(#[from] AnalysisError),
}

impl SessionError {
  pub fn kind(&self) -> &'static str {
    match self {
      SessionError::NoImage => "input",
      SessionError::Busy | SessionError::InvalidState { .. } => "state",
      SessionError::Analysis(e) => e.kind(),
    }
  }
}

/// Persistence failures. Logged by the session, never fatal.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error(transparent)]
  Json(#[from] serde_json::Error),
}
