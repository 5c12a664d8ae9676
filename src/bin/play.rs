//! Terminal client: plays Caption Quest against a running relay.
//!
//! Usage: `caption-quest-play [RELAY_BASE_URL]` (default `$CAPTION_QUEST_URL` or http://localhost:3000)
//!
//! Score and streak persist in the file named by `[store] path` in GAME_CONFIG_PATH.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::error;

use caption_quest::config::load_game_config_from_env;
use caption_quest::domain::{Difficulty, GameState, ImageSource};
use caption_quest::session::Session;
use caption_quest::store::FileStore;
use caption_quest::telemetry;
use caption_quest::vision::RelayClient;

const HELP: &str = "\
Enter an image URL or a local file path to start a round.
While a question is open, answer with the choice number.
Commands: easy | medium | hard | again | reset | help | quit";

type PlaySession = Session<RelayClient, FileStore>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing_with_default("warn");

  let config = load_game_config_from_env().unwrap_or_default();
  let base_url = std::env::args()
    .nth(1)
    .or_else(|| std::env::var("CAPTION_QUEST_URL").ok())
    .unwrap_or_else(|| "http://localhost:3000".into());

  let relay = RelayClient::new(&base_url, Duration::from_secs(config.vision.timeout_secs + 5))?;
  let store = FileStore::open_or_empty(&config.store.path);
  let mut session = Session::with_entropy(relay, store).with_difficulty(config.game.default_difficulty);

  println!("📸 Caption Quest: guess the real caption. Relay: {base_url}");
  println!("{HELP}");
  print_score(&session);

  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  loop {
    prompt(session.state(), session.difficulty()).await?;
    let Some(line) = lines.next_line().await? else { break };
    let input = line.trim();
    if input.is_empty() {
      continue;
    }

    match input {
      "quit" | "exit" => break,
      "help" => println!("{HELP}"),
      "again" => session.reset(),
      "reset" => {
        session.reset_session();
        print_score(&session);
      }
      _ => {
        if let Ok(d) = input.parse::<Difficulty>() {
          session.set_difficulty(d);
          println!("Difficulty: {d} ({} choices)", d.choice_count());
        } else if session.state() == GameState::Question {
          answer(&mut session, input);
        } else {
          play_round(&mut session, input).await;
        }
      }
    }
  }
  Ok(())
}

async fn read_image(input: &str) -> Result<ImageSource, String> {
  if input.starts_with("http://") || input.starts_with("https://") {
    return Ok(ImageSource::Url(input.to_string()));
  }
  let bytes = tokio::fs::read(input)
    .await
    .map_err(|e| format!("Cannot read '{input}': {e}"))?;
  ImageSource::from_parts(None, Some(bytes)).ok_or_else(|| format!("'{input}' is empty"))
}

async fn prompt(state: GameState, difficulty: Difficulty) -> std::io::Result<()> {
  let mut out = tokio::io::stdout();
  out.write_all(format!("[{state} · {difficulty}] > ").as_bytes()).await?;
  out.flush().await
}

fn print_score(session: &PlaySession) {
  println!("Score: {}  Streak: {}", session.score(), session.streak());
}

fn answer(session: &mut PlaySession, input: &str) {
  let choices = session.round().map(|r| r.choices.clone()).unwrap_or_default();
  let picked = input
    .parse::<usize>()
    .ok()
    .and_then(|n| n.checked_sub(1))
    .and_then(|i| choices.get(i));
  let Some(choice) = picked else {
    println!("Pick a number between 1 and {}.", choices.len());
    return;
  };

  match session.submit_answer(choice) {
    Ok(outcome) if outcome.correct => println!("✅ Correct! +{} points", outcome.points),
    Ok(outcome) => println!("❌ Nope. The real caption: {}", outcome.answer),
    Err(e) => println!("{e}"),
  }
  print_score(session);
  println!("Type 'again' or enter another image.");
}

async fn play_round(session: &mut PlaySession, input: &str) {
  let image = match read_image(input).await {
    Ok(image) => image,
    Err(msg) => {
      println!("{msg}");
      return;
    }
  };

  println!("Analyzing...");
  match session.start_analysis(image).await {
    Ok(round) => {
      if round.is_degenerate() {
        println!("(only {} choices this time)", round.choices.len());
      }
      println!("Pick the real caption:");
      for (i, c) in round.choices.iter().enumerate() {
        println!("  {}. {}", i + 1, c);
      }
    }
    Err(e) => {
      error!(target: "caption_quest", error = %e, kind = e.kind(), "Round failed");
      println!("⚠️  {e}");
    }
  }
}
