//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Difficulty, GameState, Round};
use crate::session::{AnswerOutcome, SessionSnapshot};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    NewRound {
        #[serde(default)]
        url: Option<String>,
        #[serde(default, rename = "imageBase64")]
        image_base64: Option<String>,
        #[serde(default)]
        difficulty: Option<Difficulty>,
    },
    SubmitAnswer {
        choice: String,
    },
    SetDifficulty {
        difficulty: Difficulty,
    },
    Reset,
    ResetSession,
    GetSession,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Loading,
    Round {
        round: RoundOut,
    },
    AnswerResult {
        #[serde(flatten)]
        outcome: AnswerOutcome,
    },
    Session {
        #[serde(flatten)]
        session: SessionSnapshot,
    },
    Error {
        kind: String,
        message: String,
    },
}

impl ServerWsMessage {
    pub fn error(kind: &str, message: impl Into<String>) -> Self {
        ServerWsMessage::Error { kind: kind.to_string(), message: message.into() }
    }
}

/// DTO for a presented round. The answer is included on purpose: there is no cheat-prevention.
#[derive(Debug, Serialize)]
pub struct RoundOut {
    #[serde(rename = "roundId")]
    pub round_id: String,
    pub difficulty: Difficulty,
    pub choices: Vec<String>,
    pub correct: String,
    pub degenerate: bool,
    pub state: GameState,
}

/// Convert the internal `Round` to the public DTO.
pub fn to_out(r: &Round) -> RoundOut {
    RoundOut {
        round_id: r.id.clone(),
        difficulty: r.difficulty,
        choices: r.choices.clone(),
        correct: r.correct.clone(),
        degenerate: r.is_degenerate(),
        state: GameState::Question,
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct AnalyzeUrlIn {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub vision: bool,
}
