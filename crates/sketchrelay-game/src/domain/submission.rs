//! Submission gate.
//!
//! Enforces write-once cells in a session's prompt and drawing matrices and
//! triggers the phase/round transition once every chain has a value for the
//! current round. Callers must hold the session's lock across the whole of
//! [`submit`] so the completion check and the transition it triggers happen
//! atomically.

use serde::Serialize;
use sketchrelay_core::clock::Clock;
use sketchrelay_core::error::DomainError;
use uuid::Uuid;

use super::events::{DrawingSubmitted, PromptSubmitted, SessionEventKind};
use super::rotation::chain_index;
use super::session::{GameSession, Lifecycle, Phase};

/// A `[chain][round]` grid of optional submissions.
///
/// `None` means the cell was never filled; an empty string is a real value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChainMatrix {
    cells: Vec<Vec<Option<String>>>,
}

impl ChainMatrix {
    /// Allocates a matrix of `chains` × `rounds` unset cells.
    #[must_use]
    pub fn new(chains: usize, rounds: usize) -> Self {
        Self {
            cells: vec![vec![None; rounds]; chains],
        }
    }

    /// Number of chains (rows).
    #[must_use]
    pub fn chain_count(&self) -> usize {
        self.cells.len()
    }

    /// Returns the value stored at `(chain, round)`, if any.
    #[must_use]
    pub fn get(&self, chain: usize, round: usize) -> Option<&str> {
        self.cells
            .get(chain)
            .and_then(|row| row.get(round))
            .and_then(Option::as_deref)
    }

    /// Returns whether `(chain, round)` holds a value.
    #[must_use]
    pub fn is_set(&self, chain: usize, round: usize) -> bool {
        self.get(chain, round).is_some()
    }

    /// Returns every round of one chain.
    #[must_use]
    pub fn chain(&self, chain: usize) -> &[Option<String>] {
        self.cells.get(chain).map_or(&[], Vec::as_slice)
    }

    /// Returns whether every chain has a value for `round`. An unallocated
    /// matrix is never complete.
    #[must_use]
    pub fn round_complete(&self, round: usize) -> bool {
        !self.cells.is_empty()
            && self
                .cells
                .iter()
                .all(|row| row.get(round).is_some_and(Option::is_some))
    }

    /// Stores `value` if the cell is unset. Returns `false` (and leaves the
    /// cell untouched) if it was already set or out of range.
    pub(crate) fn fill(&mut self, chain: usize, round: usize, value: String) -> bool {
        match self.cells.get_mut(chain).and_then(|row| row.get_mut(round)) {
            Some(cell @ None) => {
                *cell = Some(value);
                true
            }
            _ => false,
        }
    }
}

/// Outcome of an accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Chain the content was written into.
    pub chain: usize,
    /// Round the content belongs to.
    pub round: usize,
    /// Whether this submission completed the phase and moved the session on.
    pub advanced: bool,
}

/// Accepts `content` from `identity` for `phase`.
///
/// Validation order: lifecycle, phase, spectator, membership, duplicate.
/// On success the cell is written and, if that filled every chain for the
/// current round, the session advances to the next phase or round.
///
/// # Errors
///
/// Returns `DomainError::State` if the session is not running, the phase
/// does not match, the identity is a spectator, or the cell is already set.
/// Returns `DomainError::NotFound` if the identity never joined.
/// Returns `DomainError::Validation` for a blank drawing reference.
pub fn submit(
    session: &mut GameSession,
    identity: &str,
    phase: Phase,
    content: String,
    correlation_id: Uuid,
    clock: &dyn Clock,
) -> Result<SubmissionReceipt, DomainError> {
    match session.lifecycle() {
        Lifecycle::Lobby => {
            return Err(DomainError::State(format!(
                "session {} has not started",
                session.name()
            )));
        }
        Lifecycle::Ended => {
            return Err(DomainError::State(format!(
                "session {} has ended",
                session.name()
            )));
        }
        Lifecycle::Running => {}
    }

    if session.phase() != phase {
        return Err(DomainError::State(format!(
            "session {} is {}, not {}",
            session.name(),
            session.phase().describe(),
            phase.describe()
        )));
    }

    if session.spectators().iter().any(|s| s == identity) {
        return Err(DomainError::State(format!(
            "{identity} is spectating and cannot submit"
        )));
    }

    let position = session
        .participants()
        .iter()
        .position(|p| p == identity)
        .ok_or_else(|| DomainError::not_found("participant", identity))?;

    let Some(count) = session.participant_count() else {
        return Err(DomainError::State(format!(
            "session {} has no participants",
            session.name()
        )));
    };

    let round = session.current_round();
    let chain = chain_index(position, round, count);

    let matrix = match phase {
        Phase::CollectingPrompts => session.prompts(),
        Phase::CollectingDrawings => session.drawings(),
    };
    if matrix.is_set(chain, round) {
        return Err(DomainError::State(format!(
            "{identity} already submitted a {} for round {}",
            phase.noun(),
            round + 1
        )));
    }

    let kind = match phase {
        Phase::CollectingPrompts => SessionEventKind::PromptSubmitted(PromptSubmitted {
            identity: identity.to_owned(),
            chain,
            round,
            text: content,
        }),
        Phase::CollectingDrawings => {
            let image_ref = content.trim();
            if image_ref.is_empty() {
                return Err(DomainError::Validation(
                    "drawing reference must not be empty".to_owned(),
                ));
            }
            SessionEventKind::DrawingSubmitted(DrawingSubmitted {
                identity: identity.to_owned(),
                chain,
                round,
                image_ref: image_ref.to_owned(),
            })
        }
    };
    session.record(kind, correlation_id, clock);

    let advanced = complete_round_if_filled(session, phase, round, correlation_id, clock);

    Ok(SubmissionReceipt {
        chain,
        round,
        advanced,
    })
}

/// Advances the session when every chain has a value for `round` in the
/// active phase's matrix.
fn complete_round_if_filled(
    session: &mut GameSession,
    phase: Phase,
    round: usize,
    correlation_id: Uuid,
    clock: &dyn Clock,
) -> bool {
    match phase {
        Phase::CollectingPrompts if session.prompts().round_complete(round) => {
            session.advance_phase(correlation_id, clock);
            true
        }
        Phase::CollectingDrawings if session.drawings().round_complete(round) => {
            session.advance_round(correlation_id, clock);
            true
        }
        _ => false,
    }
}
