//! Loading game configuration from TOML.
//!
//! See `GameConfig` for the expected schema. Every section is optional.
//!
//! ```toml
//! [game]
//! default_difficulty = "hard"
//!
//! [vision]
//! api_version = "2023-10-01"
//! timeout_secs = 20
//! language = "en"
//!
//! [store]
//! path = "caption-quest-score.json"
//! ```

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Difficulty;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct GameConfig {
  #[serde(default)]
  pub game: GameCfg,
  #[serde(default)]
  pub vision: VisionCfg,
  #[serde(default)]
  pub store: StoreCfg,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct GameCfg {
  #[serde(default)]
  pub default_difficulty: Difficulty,
}

/// Provider request settings. Credentials always come from the environment.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct VisionCfg {
  pub api_version: String,
  pub timeout_secs: u64,
  pub language: Option<String>,
}

impl Default for VisionCfg {
  fn default() -> Self {
    Self {
      api_version: "2023-10-01".into(),
      timeout_secs: 20,
      language: None,
    }
  }
}

/// Where the terminal client keeps score and streak.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StoreCfg {
  pub path: PathBuf,
}

impl Default for StoreCfg {
  fn default() -> Self {
    Self { path: PathBuf::from("caption-quest-score.json") }
  }
}

pub fn parse_game_config(s: &str) -> Result<GameConfig, toml::de::Error> {
  toml::from_str(s)
}

/// Attempt to load `GameConfig` from GAME_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_game_config_from_env() -> Option<GameConfig> {
  let path = std::env::var("GAME_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_game_config(&s) {
      Ok(cfg) => {
        info!(target: "caption_quest", %path, "Loaded game config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "caption_quest", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "caption_quest", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
