//! Minimal vision-provider client (Azure Image Analysis 4.0) and the relay client.
//!
//! We request Caption, DenseCaptions and Tags in one call and normalize the answer
//! into `AnalysisResult`. Calls are instrumented and log latencies and sizes (not contents).
//!
//! NOTE: We never log the subscription key or raw image bytes.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::analyzer::Analyzer;
use crate::config::VisionCfg;
use crate::domain::{AnalysisResult, DenseCaption, ImageSource};
use crate::error::AnalysisError;
use crate::util::trunc_for_log;

const FEATURES: &str = "Caption,DenseCaptions,Tags";
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const CLIENT_AGENT: &str = "caption-quest/0.1";

#[derive(Clone)]
pub struct VisionClient {
  pub client: reqwest::Client,
  pub endpoint: String,
  pub api_key: String,
  pub api_version: String,
  pub language: Option<String>,
}

impl VisionClient {
  /// Construct the client if we find VISION_ENDPOINT and VISION_KEY; otherwise return None.
  pub fn from_env(cfg: &VisionCfg) -> Option<Self> {
    let endpoint = std::env::var("VISION_ENDPOINT").ok().filter(|s| !s.trim().is_empty())?;
    let api_key = std::env::var("VISION_KEY").ok().filter(|s| !s.trim().is_empty())?;
    let api_version = std::env::var("VISION_API_VERSION").unwrap_or_else(|_| cfg.api_version.clone());
    Self::new(&endpoint, &api_key, &api_version, cfg)
  }

  pub fn new(endpoint: &str, api_key: &str, api_version: &str, cfg: &VisionCfg) -> Option<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.timeout_secs))
      .build()
      .ok()?;

    Some(Self {
      client,
      endpoint: endpoint.trim().trim_end_matches('/').to_string(),
      api_key: api_key.to_string(),
      api_version: api_version.to_string(),
      language: cfg.language.clone(),
    })
  }

  fn analyze_url(&self) -> String {
    let mut url = format!(
      "{}/computervision/imageanalysis:analyze?api-version={}&features={}",
      self.endpoint, self.api_version, FEATURES
    );
    if let Some(lang) = &self.language {
      url.push_str("&language=");
      url.push_str(lang);
    }
    url
  }

  #[instrument(level = "info", skip(self, image), fields(source = ?image))]
  pub async fn analyze_image(&self, image: &ImageSource) -> Result<AnalysisResult, AnalysisError> {
    let req = self.client.post(self.analyze_url())
      .header(USER_AGENT, CLIENT_AGENT)
      .header(SUBSCRIPTION_KEY_HEADER, &self.api_key);
    let req = match image {
      ImageSource::Bytes(b) if !b.is_empty() => req
        .header(CONTENT_TYPE, "application/octet-stream")
        .body(b.clone()),
      ImageSource::Url(u) if !u.trim().is_empty() => req
        .header(CONTENT_TYPE, "application/json")
        .json(&serde_json::json!({ "url": u })),
      _ => return Err(AnalysisError::NoImage),
    };

    let start = Instant::now();
    let res = req.send().await?;
    let status = res.status();
    let body = res.text().await?;
    let elapsed = start.elapsed();

    if !status.is_success() {
      error!(target: "caption_quest", ?elapsed, %status, body = %trunc_for_log(&body, 300), "Vision provider returned an error");
      return Err(AnalysisError::Status { status: status.as_u16(), body });
    }

    let raw: ProviderResponse = serde_json::from_str(&body)
      .map_err(|e| AnalysisError::Decode(e.to_string()))?;
    let result = raw.normalize();
    info!(
      target: "caption_quest",
      ?elapsed,
      caption_len = result.caption.len(),
      tags = result.tags.len(),
      dense = result.dense_captions.len(),
      "Vision analysis received"
    );
    Ok(result)
  }
}

#[async_trait]
impl Analyzer for VisionClient {
  async fn analyze(&self, image: &ImageSource) -> Result<AnalysisResult, AnalysisError> {
    self.analyze_image(image).await
  }
}

/// Talks to our own relay (`POST /api/analyze`), the way a browser client would.
#[derive(Clone)]
pub struct RelayClient {
  pub client: reqwest::Client,
  pub analyze_url: String,
}

impl RelayClient {
  pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AnalysisError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      analyze_url: format!("{}/api/analyze", base_url.trim_end_matches('/')),
    })
  }
}

#[async_trait]
impl Analyzer for RelayClient {
  #[instrument(level = "info", skip(self, image), fields(source = ?image))]
  async fn analyze(&self, image: &ImageSource) -> Result<AnalysisResult, AnalysisError> {
    let req = self.client.post(&self.analyze_url).header(USER_AGENT, CLIENT_AGENT);
    let req = match image {
      ImageSource::Bytes(b) => req
        .header(CONTENT_TYPE, "application/octet-stream")
        .body(b.clone()),
      ImageSource::Url(u) => req.json(&serde_json::json!({ "url": u })),
    };

    let res = req.send().await?;
    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      return Err(AnalysisError::Status { status: status.as_u16(), body });
    }
    res.json::<AnalysisResult>()
      .await
      .map_err(|e| AnalysisError::Decode(e.to_string()))
  }
}

// --- Provider DTOs ---

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ProviderResponse {
  #[serde(default)] caption_result: Option<CaptionResult>,
  #[serde(default)] tags_result: Option<Values<TagValue>>,
  #[serde(default)] dense_captions_result: Option<Values<TextValue>>,
}
#[derive(Deserialize, Default)]
struct CaptionResult {
  #[serde(default)] text: Option<String>,
  #[serde(default)] captions: Vec<TextValue>,
}
#[derive(Deserialize)]
struct Values<T> { #[serde(default = "Vec::new")] values: Vec<T> }
#[derive(Deserialize)]
struct TagValue { name: String }
#[derive(Deserialize)]
struct TextValue { text: String }

impl ProviderResponse {
  fn normalize(self) -> AnalysisResult {
    let caption = self.caption_result
      .and_then(|c| {
        c.text.filter(|t| !t.is_empty())
          .or_else(|| c.captions.into_iter().next().map(|v| v.text))
      })
      .unwrap_or_default();
    let tags = self.tags_result
      .map(|t| t.values.into_iter().map(|v| v.name).collect())
      .unwrap_or_default();
    let dense_captions = self.dense_captions_result
      .map(|d| d.values.into_iter().map(|v| DenseCaption { text: v.text }).collect())
      .unwrap_or_default();
    AnalysisResult { caption, tags, dense_captions }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalizes_image_analysis_response() {
    let body = r#"{
      "modelVersion": "2023-10-01",
      "captionResult": { "text": "a cat sitting on a chair", "confidence": 0.8 },
      "denseCaptionsResult": { "values": [
        { "text": "a cat sitting on a chair", "confidence": 0.8 },
        { "text": "a wooden chair", "confidence": 0.7 }
      ]},
      "tagsResult": { "values": [ { "name": "cat", "confidence": 0.99 }, { "name": "indoor", "confidence": 0.9 } ] }
    }"#;
    let raw: ProviderResponse = serde_json::from_str(body).unwrap();
    let res = raw.normalize();
    assert_eq!(res.caption, "a cat sitting on a chair");
    assert_eq!(res.tags, vec!["cat", "indoor"]);
    assert_eq!(res.dense_captions.len(), 2);
    assert_eq!(res.dense_captions[1].text, "a wooden chair");
  }

  #[test]
  fn falls_back_to_caption_list_and_tolerates_missing_sections() {
    let body = r#"{ "captionResult": { "captions": [ { "text": "a beach" } ] } }"#;
    let res = serde_json::from_str::<ProviderResponse>(body).unwrap().normalize();
    assert_eq!(res.caption, "a beach");
    assert!(res.tags.is_empty());
    assert!(res.dense_captions.is_empty());

    let res = serde_json::from_str::<ProviderResponse>("{}").unwrap().normalize();
    assert!(res.caption.is_empty());
  }

  #[test]
  fn endpoint_is_trimmed_into_analyze_url() {
    let cfg = VisionCfg::default();
    let client = VisionClient::new("https://example.cognitiveservices.azure.com/ ", "k", "2023-10-01", &cfg).unwrap();
    assert_eq!(
      client.analyze_url(),
      "https://example.cognitiveservices.azure.com/computervision/imageanalysis:analyze?api-version=2023-10-01&features=Caption,DenseCaptions,Tags"
    );
  }
}
