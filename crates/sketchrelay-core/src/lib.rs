//! SketchRelay Core — shared domain abstractions.
//!
//! This crate defines the fundamental traits and types that the game,
//! media and API crates depend on. It contains no infrastructure code.

pub mod aggregate;
pub mod blob;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod identity;
pub mod render;
