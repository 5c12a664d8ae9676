//! Round/session state machine.
//!
//! This module owns:
//!   - the game state (`idle → loading → question → result → idle`)
//!   - the current round and the selected difficulty
//!   - score and streak, persisted through a `ScoreStore` after every change
//!
//! The analyzer, the store and the random source are injected so callers (and tests)
//! decide where captions come from, where scores live, and how rounds are shuffled.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::analyzer::Analyzer;
use crate::decoys::build_round;
use crate::domain::{Difficulty, GameState, ImageSource, Round};
use crate::error::{AnalysisError, SessionError};
use crate::store::{ScoreRecord, ScoreStore};

/// Base points for a correct answer.
pub const BASE_POINTS: u64 = 10;
/// Extra points per answer already in the streak.
pub const STREAK_BONUS: u64 = 2;

/// Points for a correct answer given the streak before it.
pub fn points_for(streak_before: u64) -> u64 {
  BASE_POINTS.saturating_add(streak_before.saturating_mul(STREAK_BONUS))
}

/// What happened when the player picked a choice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
  pub correct: bool,
  pub chosen: String,
  /// The real caption, revealed in the result state.
  pub answer: String,
  pub points: u64,
  pub score: u64,
  pub streak: u64,
}

/// Read-only view for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
  pub state: GameState,
  pub score: u64,
  pub streak: u64,
  pub difficulty: Difficulty,
}

pub struct Session<A, S, R = StdRng> {
  analyzer: A,
  store: S,
  rng: R,
  state: GameState,
  record: ScoreRecord,
  round: Option<Round>,
  difficulty: Difficulty,
}

impl<A: Analyzer, S: ScoreStore> Session<A, S, StdRng> {
  /// Session with a non-deterministic random source.
  pub fn with_entropy(analyzer: A, store: S) -> Self {
    Self::new(analyzer, store, StdRng::from_entropy())
  }
}

impl<A: Analyzer, S: ScoreStore, R: Rng> Session<A, S, R> {
  /// Build a session, restoring score and streak from `store`.
  pub fn new(analyzer: A, store: S, rng: R) -> Self {
    let record = ScoreRecord::load(&store).unwrap_or_else(|e| {
      warn!(target: "caption_quest", error = %e, "Could not read stored score; starting from 0");
      ScoreRecord::default()
    });
    Self {
      analyzer,
      store,
      rng,
      state: GameState::Idle,
      record,
      round: None,
      difficulty: Difficulty::default(),
    }
  }

  #[must_use]
  pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
    self.difficulty = difficulty;
    self
  }

  pub fn state(&self) -> GameState { self.state }
  pub fn score(&self) -> u64 { self.record.score }
  pub fn streak(&self) -> u64 { self.record.streak }
  pub fn difficulty(&self) -> Difficulty { self.difficulty }
  pub fn round(&self) -> Option<&Round> { self.round.as_ref() }
  pub fn store(&self) -> &S { &self.store }

  pub fn snapshot(&self) -> SessionSnapshot {
    SessionSnapshot {
      state: self.state,
      score: self.record.score,
      streak: self.record.streak,
      difficulty: self.difficulty,
    }
  }

  /// Takes effect from the next round.
  pub fn set_difficulty(&mut self, difficulty: Difficulty) {
    self.difficulty = difficulty;
  }

  /// `Ok` when a new round may start: from `idle` or `result`.
  pub fn ready_for_round(&self) -> Result<(), SessionError> {
    match self.state {
      GameState::Loading => Err(SessionError::Busy),
      GameState::Question => Err(SessionError::InvalidState { action: "start a round", state: self.state }),
      GameState::Idle | GameState::Result => Ok(()),
    }
  }

  /// Analyze `image` and present a new round.
  ///
  /// From `result` the previous round is cleared first. A blank image is rejected
  /// before anything changes. Any analysis failure leaves the session `idle`
  /// with no round.
  ///
  /// Dropping the returned future mid-flight leaves the session `loading`;
  /// `reset` recovers it.
  #[instrument(level = "info", skip(self), fields(difficulty = %self.difficulty, state = %self.state))]
  pub async fn start_analysis(&mut self, image: ImageSource) -> Result<&Round, SessionError> {
    self.ready_for_round()?;
    if image.is_empty() {
      return Err(SessionError::NoImage);
    }
    self.reset();

    self.state = GameState::Loading;
    let analysis = match self.analyzer.analyze(&image).await {
      Ok(a) if a.caption.trim().is_empty() => Err(AnalysisError::MissingCaption),
      other => other,
    };
    let analysis = match analysis {
      Ok(a) => a,
      Err(e) => {
        self.state = GameState::Idle;
        warn!(target: "round", error = %e, kind = e.kind(), "Analysis failed; back to idle");
        return Err(e.into());
      }
    };

    let round = build_round(&analysis, self.difficulty, &mut self.rng);
    if round.is_degenerate() {
      debug!(target: "round", id = %round.id, choices = round.choices.len(), "Round has fewer choices than the difficulty asks for");
    }
    info!(target: "round", id = %round.id, difficulty = %round.difficulty, choices = round.choices.len(), "Round ready");
    self.state = GameState::Question;
    Ok(&*self.round.insert(round))
  }

  /// Score the pick against the real caption (exact string equality).
  #[instrument(level = "info", skip(self, choice), fields(state = %self.state, choice_len = choice.len()))]
  pub fn submit_answer(&mut self, choice: &str) -> Result<AnswerOutcome, SessionError> {
    let round = match (&self.round, self.state) {
      (Some(round), GameState::Question) => round,
      _ => return Err(SessionError::InvalidState { action: "submit an answer", state: self.state }),
    };

    let correct = choice == round.correct;
    let before = self.record;
    let points = if correct { points_for(before.streak) } else { 0 };
    self.record = if correct {
      ScoreRecord { score: before.score.saturating_add(points), streak: before.streak + 1 }
    } else {
      ScoreRecord { score: before.score, streak: 0 }
    };

    let outcome = AnswerOutcome {
      correct,
      chosen: choice.to_string(),
      answer: round.correct.clone(),
      points,
      score: self.record.score,
      streak: self.record.streak,
    };
    info!(target: "round", id = %round.id, correct, points, score = self.record.score, streak = self.record.streak, "Answer scored");

    self.persist();
    self.state = GameState::Result;
    Ok(outcome)
  }

  /// Drop the current round and go back to `idle`. Score and streak are kept.
  pub fn reset(&mut self) {
    self.round = None;
    self.state = GameState::Idle;
  }

  /// Zero score and streak and clear the store, whatever the game state.
  #[instrument(level = "info", skip(self))]
  pub fn reset_session(&mut self) {
    self.record = ScoreRecord::default();
    if let Err(e) = self.store.clear() {
      warn!(target: "caption_quest", error = %e, "Could not clear stored score");
    }
  }

  fn persist(&mut self) {
    if let Err(e) = self.record.save(&mut self.store) {
      warn!(target: "caption_quest", error = %e, "Could not persist score; continuing");
    }
  }
}
