//! WebSocket upgrade + game loop. Each connection owns one `Session`; client messages are
//! parsed as JSON and handled one at a time, so at most one analysis is in flight per session.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use rand::{rngs::StdRng, Rng};
use tracing::{debug, error, info, instrument};

use crate::analyzer::Analyzer;
use crate::domain::{Difficulty, ImageSource};
use crate::protocol::{to_out, ClientWsMessage, ServerWsMessage};
use crate::session::Session;
use crate::state::AppState;
use crate::store::{MemoryStore, ScoreStore};
use crate::util::decode_image_base64;

type WsSession = Session<Arc<AppState>, MemoryStore, StdRng>;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "caption_quest", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "caption_quest", "WebSocket connected");
  let difficulty = state.config.game.default_difficulty;
  let mut session: WsSession = Session::with_entropy(state, MemoryStore::new()).with_difficulty(difficulty);

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let incoming = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => incoming,
          Err(e) => {
            let reply = ServerWsMessage::error("input", format!("Invalid JSON: {}", e));
            if send(&mut socket, &reply).await.is_err() { break; }
            continue;
          }
        };
        debug!(target: "caption_quest", len = txt.len(), "WS message received");

        let reply = match incoming {
          ClientWsMessage::NewRound { url, image_base64, difficulty } => {
            match prepare_round(url, image_base64, &session) {
              Ok(image) => {
                if send(&mut socket, &ServerWsMessage::Loading).await.is_err() { break; }
                start_round(image, difficulty, &mut session).await
              }
              Err(reply) => reply,
            }
          }
          other => handle_client_ws(other, &mut session).await,
        };
        if send(&mut socket, &reply).await.is_err() { break; }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "caption_quest", score = session.score(), streak = session.streak(), "WebSocket disconnected");
}

async fn send(socket: &mut WebSocket, msg: &ServerWsMessage) -> Result<(), axum::Error> {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "kind": "internal", "message": format!("Serialization error: {}", e) }).to_string()
  });
  socket.send(Message::Text(out)).await.map_err(|e| {
    error!(target: "caption_quest", error = %e, "WS send error");
    e
  })
}

/// State and input checks for `new_round`. An `Err` is the reply to send; no analysis starts.
fn prepare_round<A: Analyzer, S: ScoreStore, R: Rng>(
  url: Option<String>,
  image_base64: Option<String>,
  session: &Session<A, S, R>,
) -> Result<ImageSource, ServerWsMessage> {
  session
    .ready_for_round()
    .map_err(|e| ServerWsMessage::error(e.kind(), e.to_string()))?;
  let bytes = image_base64
    .as_deref()
    .map(decode_image_base64)
    .transpose()
    .map_err(|e| ServerWsMessage::error("input", format!("Invalid base64 image: {}", e)))?;
  ImageSource::from_parts(url, bytes)
    .ok_or_else(|| ServerWsMessage::error("input", "Provide an image URL or upload a file."))
}

async fn start_round<A: Analyzer, S: ScoreStore, R: Rng>(
  image: ImageSource,
  difficulty: Option<Difficulty>,
  session: &mut Session<A, S, R>,
) -> ServerWsMessage {
  if let Some(d) = difficulty {
    session.set_difficulty(d);
  }
  match session.start_analysis(image).await {
    Ok(round) => ServerWsMessage::Round { round: to_out(round) },
    Err(e) => ServerWsMessage::error(e.kind(), e.to_string()),
  }
}

#[instrument(level = "info", skip_all)]
async fn handle_client_ws<A: Analyzer, S: ScoreStore, R: Rng>(
  msg: ClientWsMessage,
  session: &mut Session<A, S, R>,
) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::NewRound { url, image_base64, difficulty } => match prepare_round(url, image_base64, session) {
      Ok(image) => start_round(image, difficulty, session).await,
      Err(reply) => reply,
    },

    ClientWsMessage::SubmitAnswer { choice } => match session.submit_answer(&choice) {
      Ok(outcome) => ServerWsMessage::AnswerResult { outcome },
      Err(e) => ServerWsMessage::error(e.kind(), e.to_string()),
    },

    ClientWsMessage::SetDifficulty { difficulty } => {
      session.set_difficulty(difficulty);
      ServerWsMessage::Session { session: session.snapshot() }
    }

    ClientWsMessage::Reset => {
      session.reset();
      ServerWsMessage::Session { session: session.snapshot() }
    }

    ClientWsMessage::ResetSession => {
      session.reset_session();
      ServerWsMessage::Session { session: session.snapshot() }
    }

    ClientWsMessage::GetSession => ServerWsMessage::Session { session: session.snapshot() },
  }
}
