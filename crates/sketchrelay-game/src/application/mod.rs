//! Application layer: command/query handlers and process-wide services.

pub mod command_handlers;
pub mod directory;
pub mod query_handlers;
pub mod registry;
