//! Application state shared by every handler: configuration and the optional vision client.
//!
//! Game sessions are not stored here. Each WebSocket connection owns its own `Session`.

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::analyzer::Analyzer;
use crate::config::{load_game_config_from_env, GameConfig};
use crate::domain::{AnalysisResult, ImageSource};
use crate::error::AnalysisError;
use crate::vision::VisionClient;

#[derive(Clone)]
pub struct AppState {
    pub vision: Option<VisionClient>,
    pub config: GameConfig,
}

impl AppState {
    /// Build state from env: load config, init the vision client if credentials are present.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let config = load_game_config_from_env().unwrap_or_default();
        let vision = VisionClient::from_env(&config.vision);
        if let Some(v) = &vision {
            info!(target: "caption_quest", endpoint = %v.endpoint, api_version = %v.api_version, "Vision provider enabled.");
        } else {
            warn!(target: "caption_quest", "Vision provider disabled (missing VISION_ENDPOINT or VISION_KEY). Analyze requests will fail.");
        }
        info!(target: "caption_quest", default_difficulty = %config.game.default_difficulty, "Game settings");
        Self::with_parts(vision, config)
    }

    pub fn with_parts(vision: Option<VisionClient>, config: GameConfig) -> Self {
        Self { vision, config }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Provider if configured, configuration error otherwise.
#[async_trait]
impl Analyzer for AppState {
    async fn analyze(&self, image: &ImageSource) -> Result<AnalysisResult, AnalysisError> {
        match &self.vision {
            Some(v) => v.analyze_image(image).await,
            None => Err(AnalysisError::Configuration),
        }
    }
}
