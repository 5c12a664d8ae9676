//! Caption Quest · relay + game server
//!
//! - Axum HTTP relay for the vision provider (`POST /api/analyze`)
//! - WebSocket game sessions (`/ws`)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   VISION_ENDPOINT     : provider endpoint, e.g. "https://<name>.cognitiveservices.azure.com"
//!   VISION_KEY          : provider subscription key (required together with VISION_ENDPOINT)
//!   VISION_API_VERSION  : default "2023-10-01"
//!   GAME_CONFIG_PATH    : path to TOML config (difficulty, provider timeouts)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use caption_quest::routes::build_router;
use caption_quest::state::AppState;
use caption_quest::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared application state (config + optional vision client).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state);

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "caption_quest", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "caption_quest", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "caption_quest", "Shutdown signal received");
}
