//! Caption Quest · guess the real image caption.
//!
//! - `decoys`: candidate pooling, decoy sampling, choice shuffling
//! - `session`: the `idle → loading → question → result` state machine with score/streak
//! - `vision` + `routes`: the provider client, HTTP relay and WebSocket game

pub mod analyzer;
pub mod config;
pub mod decoys;
pub mod domain;
pub mod error;
pub mod protocol;
pub mod routes;
pub mod seeds;
pub mod session;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod util;
pub mod vision;
