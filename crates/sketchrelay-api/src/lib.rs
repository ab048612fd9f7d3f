//! SketchRelay — HTTP API.
//!
//! Axum router, shared state, error mapping, configuration and telemetry
//! for the drawing game server.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
