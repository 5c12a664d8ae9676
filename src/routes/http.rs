//! HTTP endpoint handlers: health and the vision relay.
//! Each handler is instrumented and logs basic request/result info (never image bytes).

use std::sync::Arc;

use axum::{
  body::Bytes,
  extract::State,
  http::{header::CONTENT_TYPE, HeaderMap},
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument, warn};

use crate::domain::ImageSource;
use crate::error::AnalysisError;
use crate::protocol::{AnalyzeUrlIn, HealthOut};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, vision: state.vision.is_some() })
}

/// Relay: raw bytes (`application/octet-stream`) or `{"url": ...}` in, normalized analysis out.
///
/// Credentials are checked before the body, so an unconfigured relay always answers 500.
#[instrument(level = "info", skip(state, headers, body), fields(body_len = body.len()))]
pub async fn http_post_analyze(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  body: Bytes,
) -> Response {
  let Some(vision) = &state.vision else {
    warn!(target: "caption_quest", "Analyze requested but vision provider is not configured");
    return AnalysisError::Configuration.into_response();
  };

  let Some(image) = image_from_request(&headers, body) else {
    return AnalysisError::NoImage.into_response();
  };

  match vision.analyze_image(&image).await {
    Ok(result) => {
      info!(target: "caption_quest", tags = result.tags.len(), dense = result.dense_captions.len(), "Analyze relayed");
      Json(result).into_response()
    }
    Err(e) => {
      warn!(target: "caption_quest", error = %e, "Analyze relay failed");
      e.into_response()
    }
  }
}

fn image_from_request(headers: &HeaderMap, body: Bytes) -> Option<ImageSource> {
  let is_octet = headers
    .get(CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|ct| ct.contains("application/octet-stream"));

  if is_octet {
    return ImageSource::from_parts(None, Some(body.to_vec()));
  }
  let parsed: AnalyzeUrlIn = serde_json::from_slice(&body).ok()?;
  ImageSource::from_parts(parsed.url, None)
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::HeaderValue;

  fn headers(ct: &'static str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(CONTENT_TYPE, HeaderValue::from_static(ct));
    h
  }

  #[test]
  fn octet_stream_body_is_bytes() {
    let img = image_from_request(&headers("application/octet-stream"), Bytes::from_static(b"\x89PNG"));
    assert_eq!(img, Some(ImageSource::Bytes(b"\x89PNG".to_vec())));
    assert_eq!(image_from_request(&headers("application/octet-stream"), Bytes::new()), None);
  }

  #[test]
  fn json_body_is_url() {
    let img = image_from_request(&headers("application/json"), Bytes::from_static(br#"{"url":"https://x/cat.jpg"}"#));
    assert_eq!(img, Some(ImageSource::Url("https://x/cat.jpg".into())));
    assert_eq!(image_from_request(&headers("application/json"), Bytes::from_static(b"{}")), None);
    assert_eq!(image_from_request(&HeaderMap::new(), Bytes::from_static(b"not json")), None);
  }
}
