//! Domain models: analysis results, difficulty levels, rounds and game state.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// One dense caption returned by the vision provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenseCaption {
  pub text: String,
}

/// Normalized analysis output. This is also the relay's response body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
  /// Ground-truth answer for the round. Empty means no round is possible.
  #[serde(default)]
  pub caption: String,
  #[serde(default)]
  pub tags: Vec<String>,
  #[serde(default, rename = "denseCaptions")]
  pub dense_captions: Vec<DenseCaption>,
}

/// What the analyzer should look at.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageSource {
  Bytes(Vec<u8>),
  Url(String),
}

impl ImageSource {
  /// Uploaded bytes win over a URL, like the upload form does.
  /// Returns `None` when neither is usable.
  pub fn from_parts(url: Option<String>, bytes: Option<Vec<u8>>) -> Option<Self> {
    let src = match (bytes, url) {
      (Some(b), _) if !b.is_empty() => ImageSource::Bytes(b),
      (_, Some(u)) => ImageSource::Url(u.trim().to_string()),
      _ => return None,
    };
    (!src.is_empty()).then_some(src)
  }

  pub fn is_empty(&self) -> bool {
    match self {
      ImageSource::Bytes(b) => b.is_empty(),
      ImageSource::Url(u) => u.trim().is_empty(),
    }
  }
}

// Raw image bytes stay out of logs.
impl fmt::Debug for ImageSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ImageSource::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
      ImageSource::Url(u) => f.debug_tuple("Url").field(u).finish(),
    }
  }
}

/// Named setting controlling the total number of choices per round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Easy,
  #[default]
  Medium,
  Hard,
}

impl Difficulty {
  /// Total choices: one correct caption plus `count - 1` decoys.
  pub fn choice_count(self) -> usize {
    match self {
      Difficulty::Easy => 2,
      Difficulty::Medium => 4,
      Difficulty::Hard => 6,
    }
  }

  pub fn decoy_count(self) -> usize {
    self.choice_count() - 1
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Difficulty {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "easy" => Ok(Difficulty::Easy),
      "medium" => Ok(Difficulty::Medium),
      "hard" => Ok(Difficulty::Hard),
      other => Err(format!("unknown difficulty '{other}' (expected easy, medium or hard)")),
    }
  }
}

/// One presented choice set plus its correct answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Round {
  pub id: String,
  pub difficulty: Difficulty,
  pub choices: Vec<String>,
  pub correct: String,
}

impl Round {
  /// Fewer candidates than the difficulty asks for. Playable, just smaller.
  pub fn is_degenerate(&self) -> bool {
    self.choices.len() < self.difficulty.choice_count()
  }
}

/// Where the session is in its `idle → loading → question → result` cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
  #[default]
  Idle,
  Loading,
  Question,
  Result,
}

impl fmt::Display for GameState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      GameState::Idle => "idle",
      GameState::Loading => "loading",
      GameState::Question => "question",
      GameState::Result => "result",
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn difficulty_maps_to_choice_counts() {
    assert_eq!(Difficulty::Easy.choice_count(), 2);
    assert_eq!(Difficulty::Medium.choice_count(), 4);
    assert_eq!(Difficulty::Hard.choice_count(), 6);
    assert_eq!(Difficulty::Hard.decoy_count(), 5);
    assert_eq!(Difficulty::default(), Difficulty::Medium);
  }

  #[test]
  fn difficulty_parses_case_insensitively() {
    assert_eq!(" Hard ".parse::<Difficulty>(), Ok(Difficulty::Hard));
    assert!("impossible".parse::<Difficulty>().is_err());
  }

  #[test]
  fn analysis_result_uses_camel_case_dense_captions() {
    let json = r#"{"caption":"a dog","tags":["dog"],"denseCaptions":[{"text":"a brown dog"}]}"#;
    let parsed: AnalysisResult = serde_json::from_str(json).unwrap();
    assert_eq!(parsed.dense_captions[0].text, "a brown dog");

    let missing: AnalysisResult = serde_json::from_str("{}").unwrap();
    assert!(missing.caption.is_empty());
  }

  #[test]
  fn image_source_prefers_bytes_and_rejects_blank() {
    let src = ImageSource::from_parts(Some("https://x/y.jpg".into()), Some(vec![1, 2]));
    assert_eq!(src, Some(ImageSource::Bytes(vec![1, 2])));
    assert_eq!(ImageSource::from_parts(Some("  ".into()), Some(vec![])), None);
    assert_eq!(ImageSource::from_parts(None, None), None);
    assert_eq!(format!("{:?}", ImageSource::Bytes(vec![0; 3])), "Bytes(3 bytes)");
  }
}
