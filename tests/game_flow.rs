//! End-to-end: a session playing through the relay, the way the terminal client does.

mod common;

use std::time::Duration;

use rand::{rngs::StdRng, SeedableRng};

use caption_quest::domain::{Difficulty, GameState, ImageSource};
use caption_quest::error::SessionError;
use caption_quest::routes::build_router;
use caption_quest::session::Session;
use caption_quest::store::{FileStore, MemoryStore, ScoreRecord};
use caption_quest::vision::RelayClient;

use common::{spawn, spawn_fake_provider, state_with_provider, state_without_provider, TEST_KEY};

async fn relay_with_provider() -> RelayClient {
  let provider = spawn_fake_provider().await;
  let relay = spawn(build_router(state_with_provider(&provider, TEST_KEY))).await;
  RelayClient::new(&relay, Duration::from_secs(5)).unwrap()
}

fn cat_url() -> ImageSource {
  ImageSource::Url("https://example.com/cat.jpg".into())
}

#[tokio::test]
async fn easy_round_through_the_relay() {
  let relay = relay_with_provider().await;
  let mut session = Session::new(relay, MemoryStore::new(), StdRng::seed_from_u64(3))
    .with_difficulty(Difficulty::Easy);

  let round = session.start_analysis(cat_url()).await.unwrap();
  assert_eq!(round.choices.len(), 2);
  assert_eq!(round.choices.iter().filter(|c| *c == "a cat on a chair").count(), 1);

  let outcome = session.submit_answer("a cat on a chair").unwrap();
  assert!(outcome.correct);
  assert_eq!(outcome.points, 10);
  assert_eq!(session.state(), GameState::Result);
}

#[tokio::test]
async fn score_persists_to_disk_across_sessions() {
  let path = std::env::temp_dir().join(format!("caption-quest-flow-{}.json", uuid::Uuid::new_v4()));
  let relay = relay_with_provider().await;

  {
    let store = FileStore::open(&path).unwrap();
    let mut session = Session::new(relay.clone(), store, StdRng::seed_from_u64(8));
    for _ in 0..3 {
      session.start_analysis(cat_url()).await.unwrap();
      session.submit_answer("a cat on a chair").unwrap();
    }
    assert_eq!((session.score(), session.streak()), (36, 3));
  }

  let store = FileStore::open(&path).unwrap();
  assert_eq!(ScoreRecord::load(&store).unwrap(), ScoreRecord { score: 36, streak: 3 });

  let mut session = Session::new(relay, store, StdRng::seed_from_u64(9));
  assert_eq!(session.score(), 36);
  session.reset_session();
  assert!(!path.exists());
}

#[tokio::test]
async fn relay_failure_leaves_session_idle() {
  let relay = spawn(build_router(state_without_provider())).await;
  let client = RelayClient::new(&relay, Duration::from_secs(5)).unwrap();
  let mut session = Session::new(client, MemoryStore::new(), StdRng::seed_from_u64(1));

  let err = session.start_analysis(cat_url()).await.unwrap_err();
  assert!(matches!(err, SessionError::Analysis(_)));
  assert_eq!(err.kind(), "transport");
  assert_eq!(session.state(), GameState::Idle);
  assert!(session.round().is_none());
}

#[tokio::test]
async fn corrupt_score_file_still_gives_a_playable_session() {
  let path = std::env::temp_dir().join(format!("caption-quest-corrupt-{}.json", uuid::Uuid::new_v4()));
  std::fs::write(&path, "{not json").unwrap();
  let relay = relay_with_provider().await;

  let mut session = Session::new(relay, FileStore::open_or_empty(&path), StdRng::seed_from_u64(5));
  assert_eq!((session.score(), session.streak()), (0, 0));
  assert_eq!(session.state(), GameState::Idle);

  session.start_analysis(cat_url()).await.unwrap();
  session.submit_answer("a cat on a chair").unwrap();
  assert_eq!(session.score(), 10);

  let store = FileStore::open(&path).unwrap();
  assert_eq!(ScoreRecord::load(&store).unwrap(), ScoreRecord { score: 10, streak: 1 });
  std::fs::remove_file(&path).unwrap();
}
