//! Shared helpers: a fake vision provider and router wiring.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
  body::{Body, Bytes},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
  Json, Router,
};
use http_body_util::BodyExt;
use serde_json::json;
use tokio::net::TcpListener;

use caption_quest::config::{GameConfig, VisionCfg};
use caption_quest::state::AppState;
use caption_quest::vision::VisionClient;

pub const TEST_KEY: &str = "test-key";

/// Mimics the image analysis endpoint closely enough for the relay.
async fn fake_provider(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
  if headers.get("ocp-apim-subscription-key").and_then(|v| v.to_str().ok()) != Some(TEST_KEY) {
    return (
      StatusCode::UNAUTHORIZED,
      Json(json!({ "error": { "code": "401", "message": "Access denied due to invalid subscription key." } })),
    );
  }
  if body.as_ref() == b"boom" {
    return (
      StatusCode::BAD_REQUEST,
      Json(json!({ "error": { "code": "InvalidRequest", "message": "Image format is not valid." } })),
    );
  }
  (
    StatusCode::OK,
    Json(json!({
      "modelVersion": "2023-10-01",
      "captionResult": { "text": "a cat on a chair", "confidence": 0.83 },
      "denseCaptionsResult": { "values": [
        { "text": "a cat on a chair", "confidence": 0.83 },
        { "text": "a fluffy cat", "confidence": 0.74 }
      ]},
      "tagsResult": { "values": [
        { "name": "cat", "confidence": 0.99 },
        { "name": "chair", "confidence": 0.95 },
        { "name": "furniture", "confidence": 0.90 }
      ]}
    })),
  )
}

/// Serve `app` on an ephemeral port and return its base URL.
pub async fn spawn(app: Router) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });
  format!("http://{addr}")
}

pub async fn spawn_fake_provider() -> String {
  spawn(Router::new().fallback(fake_provider)).await
}

pub fn state_with_provider(endpoint: &str, key: &str) -> Arc<AppState> {
  let vision = VisionClient::new(endpoint, key, "2023-10-01", &VisionCfg::default());
  assert!(vision.is_some());
  Arc::new(AppState::with_parts(vision, GameConfig::default()))
}

pub fn state_without_provider() -> Arc<AppState> {
  Arc::new(AppState::with_parts(None, GameConfig::default()))
}

/// Parse response body as JSON.
pub async fn body_json(body: Body) -> serde_json::Value {
  let bytes = body.collect().await.unwrap().to_bytes();
  serde_json::from_slice(&bytes).unwrap()
}
