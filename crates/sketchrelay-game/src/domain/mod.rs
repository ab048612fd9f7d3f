//! Domain layer: the session aggregate and its rules.

pub mod archive;
pub mod commands;
pub mod events;
pub mod notifications;
pub mod rotation;
pub mod session;
pub mod submission;
