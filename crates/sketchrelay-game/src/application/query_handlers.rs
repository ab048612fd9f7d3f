//! Query handlers for game sessions.
//!
//! Queries take a consistent snapshot of one session under its lock and
//! return read-only view DTOs.

use std::sync::Arc;

use serde::Serialize;
use sketchrelay_core::error::DomainError;
use uuid::Uuid;

use crate::application::directory::{NotificationView, ParticipantDirectory};
use crate::application::registry::SessionRegistry;
use crate::domain::archive::ArchivedResult;
use crate::domain::session::{Lifecycle, Phase};
use crate::domain::submission::ChainMatrix;

/// Read-only snapshot of a game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    /// The session identifier.
    pub session_id: Uuid,
    /// The session name.
    pub name: String,
    /// Lobby, running or ended.
    pub lifecycle: Lifecycle,
    /// Whether `start` has happened.
    pub game_started: bool,
    /// Current sub-state within the round.
    pub phase: Phase,
    /// Zero-based current round.
    pub current_round: usize,
    /// Resolved round count; 0 until started.
    pub total_rounds: usize,
    /// Round count as requested at creation.
    pub requested_rounds: Option<i64>,
    /// Advisory per-round time limit in seconds.
    pub round_timer: Option<u32>,
    /// Participants in join order.
    pub participants: Vec<String>,
    /// Identities that joined after start.
    pub spectators: Vec<String>,
    /// Prompt matrix, `[chain][round]`.
    pub prompts: ChainMatrix,
    /// Drawing matrix, `[chain][round]`.
    pub drawings: ChainMatrix,
    /// Current version (event count).
    pub version: i64,
}

/// Retrieves a snapshot of the named active session.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if no active session has that name.
/// Returns `DomainError::Infrastructure` if a lock is poisoned.
pub fn get_session_state(
    name: &str,
    registry: &SessionRegistry,
) -> Result<SessionView, DomainError> {
    let handle = registry.get(name)?;
    let session = handle
        .lock()
        .map_err(|e| DomainError::Infrastructure(format!("session mutex poisoned: {e}")))?;
    Ok(SessionView {
        session_id: session.id,
        name: session.name().to_owned(),
        lifecycle: session.lifecycle(),
        game_started: session.is_started(),
        phase: session.phase(),
        current_round: session.current_round(),
        total_rounds: session.total_rounds(),
        requested_rounds: session.requested_rounds(),
        round_timer: session.round_timer(),
        participants: session.participants().to_vec(),
        spectators: session.spectators().to_vec(),
        prompts: session.prompts().clone(),
        drawings: session.drawings().clone(),
        version: session.version,
    })
}

/// Lists the names of all active sessions, sorted.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the registry lock is poisoned.
pub fn list_active_sessions(registry: &SessionRegistry) -> Result<Vec<String>, DomainError> {
    registry.active_names()
}

/// Lists the ids of all archived results, oldest first.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the registry lock is poisoned.
pub fn list_archived_results(registry: &SessionRegistry) -> Result<Vec<String>, DomainError> {
    registry.archive_ids()
}

/// Retrieves one archived result.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if no archive has that id.
pub fn get_archived_result(
    id: &str,
    registry: &SessionRegistry,
) -> Result<Arc<ArchivedResult>, DomainError> {
    registry.archived(id)
}

/// Retrieves the queued notification of an identity.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the identity is unknown.
pub fn get_queued_notification(
    identity: &str,
    directory: &ParticipantDirectory,
) -> Result<NotificationView, DomainError> {
    directory.notification(identity)
}
