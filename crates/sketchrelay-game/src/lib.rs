//! SketchRelay — game sessions.
//!
//! Responsible for the round/phase state machine, chain rotation, the
//! write-once submission gate, the session registry and the archive of
//! finished games.

pub mod application;
pub mod domain;
