//! Decoy selection and choice shuffling.
//!
//! Flow:
//! 1) Pool every candidate string (tags, dense captions, fallback captions), dropping exact duplicates.
//! 2) Drop empty strings and anything equal to the real caption ignoring case.
//! 3) Draw uniformly without replacement until enough decoys are picked or the pool runs dry.
//! 4) Merge the real caption in and shuffle (Fisher–Yates).
//!
//! Everything here is pure given the random source; callers pass the `Rng`.

use std::collections::HashSet;

use rand::{seq::SliceRandom, Rng};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{AnalysisResult, DenseCaption, Difficulty, Round};
use crate::seeds::FALLBACK_CAPTIONS;

/// Unique candidate strings in first-seen order, minus the real caption.
///
/// Order is kept stable so a seeded `Rng` reproduces the same draw.
fn candidate_pool<'a>(correct: &str, tags: &'a [String], dense: &'a [DenseCaption]) -> Vec<&'a str> {
  let correct_lower = correct.to_lowercase();
  let mut seen = HashSet::new();

  tags
    .iter()
    .map(String::as_str)
    .chain(dense.iter().map(|d| d.text.as_str()))
    .chain(FALLBACK_CAPTIONS.iter().copied())
    .filter(|c| seen.insert(*c))
    .filter(|c| !c.is_empty() && c.to_lowercase() != correct_lower)
    .collect()
}

/// Pick up to `decoy_count` distractors for `correct`.
///
/// Returns fewer when the pool is too small; that is a playable round, not an error.
pub fn generate<R: Rng + ?Sized>(
  correct: &str,
  tags: &[String],
  dense: &[DenseCaption],
  decoy_count: usize,
  rng: &mut R,
) -> Vec<String> {
  let mut pool = candidate_pool(correct, tags, dense);
  let mut picks = Vec::with_capacity(decoy_count.min(pool.len()));

  while picks.len() < decoy_count && !pool.is_empty() {
    let idx = rng.gen_range(0..pool.len());
    picks.push(pool.swap_remove(idx).to_string());
  }

  if picks.len() < decoy_count {
    debug!(target: "round", requested = decoy_count, available = picks.len(), "Not enough decoy candidates");
  }
  picks
}

/// `[correct, ...decoys]` in a uniformly random order.
pub fn build_choices<R: Rng + ?Sized>(correct: &str, decoys: Vec<String>, rng: &mut R) -> Vec<String> {
  let mut choices = Vec::with_capacity(decoys.len() + 1);
  choices.push(correct.to_string());
  choices.extend(decoys);
  choices.shuffle(rng);
  choices
}

/// Full round for one analysis result at the given difficulty.
pub fn build_round<R: Rng + ?Sized>(analysis: &AnalysisResult, difficulty: Difficulty, rng: &mut R) -> Round {
  let decoys = generate(
    &analysis.caption,
    &analysis.tags,
    &analysis.dense_captions,
    difficulty.decoy_count(),
    rng,
  );
  Round {
    id: Uuid::new_v4().to_string(),
    difficulty,
    choices: build_choices(&analysis.caption, decoys, rng),
    correct: analysis.caption.clone(),
  }
}
