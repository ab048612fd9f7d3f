//! The game session aggregate.
//!
//! A session moves `Lobby → CollectingPrompts(0) → CollectingDrawings(0) →
//! CollectingPrompts(1) → … → Ended`. Every state change is recorded as a
//! [`SessionEvent`], applied immediately and buffered until the application
//! layer drains it.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use sketchrelay_core::aggregate::AggregateRoot;
use sketchrelay_core::clock::Clock;
use sketchrelay_core::error::DomainError;
use sketchrelay_core::event::EventMetadata;
use uuid::Uuid;

use super::events::{
    Assignment, EndReason, ParticipantJoined, PhaseAdvanced, RoundAdvanced, SessionEnded,
    SessionEvent, SessionEventKind, SessionStarted, SpectatorJoined,
};
use super::rotation::chain_index;
use super::submission::ChainMatrix;

/// Longest accepted session name, in characters.
pub const MAX_SESSION_NAME_LEN: usize = 64;

/// Largest accepted explicit round count.
pub const MAX_TOTAL_ROUNDS: i64 = 64;

/// Sub-state within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Participants write prompts (or captions, after round 0).
    CollectingPrompts,
    /// Participants draw the prompt they were handed.
    CollectingDrawings,
}

impl Phase {
    pub(crate) fn describe(self) -> &'static str {
        match self {
            Self::CollectingPrompts => "collecting prompts",
            Self::CollectingDrawings => "collecting drawings",
        }
    }

    pub(crate) fn noun(self) -> &'static str {
        match self {
            Self::CollectingPrompts => "prompt",
            Self::CollectingDrawings => "drawing",
        }
    }
}

/// Coarse lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Accepting participants.
    Lobby,
    /// Collecting prompts and drawings.
    Running,
    /// Terminal; waiting to be archived.
    Ended,
}

/// How an identity ended up in a session after `join`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinRole {
    /// Joined before start and owns a chain.
    Participant,
    /// Joined after start; watches only.
    Spectator,
}

/// The aggregate root for one game.
#[derive(Debug)]
pub struct GameSession {
    /// Aggregate identifier.
    pub id: Uuid,
    name: String,
    requested_rounds: Option<i64>,
    total_rounds: usize,
    round_timer: Option<u32>,
    current_round: usize,
    phase: Phase,
    lifecycle: Lifecycle,
    participants: Vec<String>,
    spectators: Vec<String>,
    prompts: ChainMatrix,
    drawings: ChainMatrix,
    end_reason: Option<EndReason>,
    rounds_played: usize,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Events recorded since the last drain.
    uncommitted_events: Vec<SessionEvent>,
}

impl GameSession {
    /// Creates a session in the lobby.
    ///
    /// `requested_rounds` of `None` or `<= 0` means "one round per
    /// participant", resolved at start. `round_timer` is kept for clients
    /// but never enforced.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank or overlong name, a
    /// round count above [`MAX_TOTAL_ROUNDS`], or a zero round timer.
    pub fn new(
        id: Uuid,
        name: &str,
        requested_rounds: Option<i64>,
        round_timer: Option<u32>,
    ) -> Result<Self, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation(
                "session name must not be empty".to_owned(),
            ));
        }
        if name.chars().count() > MAX_SESSION_NAME_LEN {
            return Err(DomainError::Validation(format!(
                "session name must be at most {MAX_SESSION_NAME_LEN} characters"
            )));
        }
        if requested_rounds.is_some_and(|rounds| rounds > MAX_TOTAL_ROUNDS) {
            return Err(DomainError::Validation(format!(
                "total rounds must be at most {MAX_TOTAL_ROUNDS}"
            )));
        }
        if round_timer == Some(0) {
            return Err(DomainError::Validation(
                "round timer must be positive when given".to_owned(),
            ));
        }

        Ok(Self {
            id,
            name: name.to_owned(),
            requested_rounds,
            total_rounds: 0,
            round_timer,
            current_round: 0,
            phase: Phase::CollectingPrompts,
            lifecycle: Lifecycle::Lobby,
            participants: Vec::new(),
            spectators: Vec::new(),
            prompts: ChainMatrix::default(),
            drawings: ChainMatrix::default(),
            end_reason: None,
            rounds_played: 0,
            version: 0,
            uncommitted_events: Vec::new(),
        })
    }

    /// The session name (registry key).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Round count as requested at creation.
    #[must_use]
    pub fn requested_rounds(&self) -> Option<i64> {
        self.requested_rounds
    }

    /// Resolved round count; `0` until the session starts.
    #[must_use]
    pub fn total_rounds(&self) -> usize {
        self.total_rounds
    }

    /// Advisory per-round timer in seconds.
    #[must_use]
    pub fn round_timer(&self) -> Option<u32> {
        self.round_timer
    }

    /// Zero-based current round.
    #[must_use]
    pub fn current_round(&self) -> usize {
        self.current_round
    }

    /// Active phase within the current round.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Lobby, running or ended.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Whether the session has left the lobby. Never reverts to `false`.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.lifecycle != Lifecycle::Lobby
    }

    /// Whether the session reached its terminal state.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.lifecycle == Lifecycle::Ended
    }

    /// Why the session ended, once it has.
    #[must_use]
    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// Rounds that received any content, once ended.
    #[must_use]
    pub fn rounds_played(&self) -> usize {
        self.rounds_played
    }

    /// Participants in join order; index is the chain position.
    #[must_use]
    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    /// Identities that joined after start.
    #[must_use]
    pub fn spectators(&self) -> &[String] {
        &self.spectators
    }

    /// Number of participants, or `None` while the lobby is empty.
    #[must_use]
    pub fn participant_count(&self) -> Option<NonZeroUsize> {
        NonZeroUsize::new(self.participants.len())
    }

    /// The prompt matrix, `[chain][round]`.
    #[must_use]
    pub fn prompts(&self) -> &ChainMatrix {
        &self.prompts
    }

    /// The drawing matrix, `[chain][round]`.
    #[must_use]
    pub fn drawings(&self) -> &ChainMatrix {
        &self.drawings
    }

    /// Adds `identity` to the session.
    ///
    /// Before start the identity becomes a participant with a fixed chain
    /// position; afterwards it becomes a spectator. Joining again is a
    /// no-op that reports the existing role.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::State` if the session has ended.
    pub fn join(
        &mut self,
        identity: &str,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<JoinRole, DomainError> {
        if self.is_ended() {
            return Err(DomainError::State(format!(
                "session {} has ended",
                self.name
            )));
        }
        if self.participants.iter().any(|p| p == identity) {
            return Ok(JoinRole::Participant);
        }
        if self.spectators.iter().any(|s| s == identity) {
            return Ok(JoinRole::Spectator);
        }

        if self.is_started() {
            self.record(
                SessionEventKind::SpectatorJoined(SpectatorJoined {
                    identity: identity.to_owned(),
                }),
                correlation_id,
                clock,
            );
            Ok(JoinRole::Spectator)
        } else {
            self.record(
                SessionEventKind::ParticipantJoined(ParticipantJoined {
                    identity: identity.to_owned(),
                    position: self.participants.len(),
                }),
                correlation_id,
                clock,
            );
            Ok(JoinRole::Participant)
        }
    }

    /// Leaves the lobby and starts collecting round 0 prompts.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::State` if the session already started (or
    /// ended) or has no participants.
    pub fn start(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        if self.is_started() {
            return Err(DomainError::State(format!(
                "session {} has already started",
                self.name
            )));
        }
        if self.participants.is_empty() {
            return Err(DomainError::State(format!(
                "session {} has no participants",
                self.name
            )));
        }

        let total_rounds = match self.requested_rounds {
            Some(rounds) if rounds > 0 => usize::try_from(rounds).map_err(|_| {
                DomainError::Validation(format!("total rounds out of range: {rounds}"))
            })?,
            _ => self.participants.len(),
        };

        self.record(
            SessionEventKind::SessionStarted(SessionStarted {
                participants: self.participants.clone(),
                total_rounds,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Ends the session now, keeping whatever content exists.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::State` if the session already ended.
    pub fn end_explicitly(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.is_ended() {
            return Err(DomainError::State(format!(
                "session {} has already ended",
                self.name
            )));
        }

        let rounds_played = if self.is_started() {
            (self.current_round + 1).min(self.total_rounds)
        } else {
            0
        };
        self.record(
            SessionEventKind::SessionEnded(SessionEnded {
                reason: EndReason::Forced,
                rounds_played,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Moves from prompts to drawings within the current round, handing each
    /// participant the prompt of the chain they are assigned to.
    pub(crate) fn advance_phase(&mut self, correlation_id: Uuid, clock: &dyn Clock) {
        let round = self.current_round;
        let assignments = self.assignments(round, |session, chain| {
            session.prompts.get(chain, round).map(str::to_owned)
        });
        self.record(
            SessionEventKind::PhaseAdvanced(PhaseAdvanced { round, assignments }),
            correlation_id,
            clock,
        );
    }

    /// Closes the current round. Either moves to the next round's prompts,
    /// handing each participant the drawing they must caption, or ends the
    /// session after the final round.
    pub(crate) fn advance_round(&mut self, correlation_id: Uuid, clock: &dyn Clock) {
        let completed_round = self.current_round;
        let next_round = completed_round + 1;

        if next_round >= self.total_rounds {
            self.record(
                SessionEventKind::SessionEnded(SessionEnded {
                    reason: EndReason::Completed,
                    rounds_played: next_round,
                }),
                correlation_id,
                clock,
            );
            return;
        }

        let assignments = self.assignments(next_round, |session, chain| {
            session
                .drawings
                .get(chain, completed_round)
                .map(str::to_owned)
        });
        self.record(
            SessionEventKind::RoundAdvanced(RoundAdvanced {
                completed_round,
                next_round,
                assignments,
            }),
            correlation_id,
            clock,
        );
    }

    /// Builds one assignment per participant for the chain they work on in
    /// `round`, with `source` picking what they respond to.
    fn assignments(
        &self,
        round: usize,
        source: impl Fn(&Self, usize) -> Option<String>,
    ) -> Vec<Assignment> {
        let Some(count) = self.participant_count() else {
            return Vec::new();
        };
        self.participants
            .iter()
            .enumerate()
            .map(|(position, identity)| {
                let chain = chain_index(position, round, count);
                Assignment {
                    identity: identity.clone(),
                    chain,
                    source: source(self, chain),
                }
            })
            .collect()
    }

    /// Returns the next sequence number for a new event.
    fn next_sequence_number(&self) -> i64 {
        self.version + 1
    }

    /// Wraps `kind` in an envelope, applies it and buffers it.
    pub(crate) fn record(&mut self, kind: SessionEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let event = SessionEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                aggregate_id: self.id,
                sequence_number: self.next_sequence_number(),
                correlation_id,
                causation_id: correlation_id,
                occurred_at: clock.now(),
            },
            kind,
        };
        self.apply(&event);
        self.uncommitted_events.push(event);
    }

    /// Returns and clears the buffered events.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.uncommitted_events)
    }
}

impl AggregateRoot for GameSession {
    type Event = SessionEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            SessionEventKind::ParticipantJoined(e) => {
                self.participants.push(e.identity.clone());
            }
            SessionEventKind::SpectatorJoined(e) => {
                self.spectators.push(e.identity.clone());
            }
            SessionEventKind::SessionStarted(e) => {
                self.total_rounds = e.total_rounds;
                self.prompts = ChainMatrix::new(e.participants.len(), e.total_rounds);
                self.drawings = ChainMatrix::new(e.participants.len(), e.total_rounds);
                self.current_round = 0;
                self.phase = Phase::CollectingPrompts;
                self.lifecycle = Lifecycle::Running;
            }
            SessionEventKind::PromptSubmitted(e) => {
                self.prompts.fill(e.chain, e.round, e.text.clone());
            }
            SessionEventKind::DrawingSubmitted(e) => {
                self.drawings.fill(e.chain, e.round, e.image_ref.clone());
            }
            SessionEventKind::PhaseAdvanced(_) => {
                self.phase = Phase::CollectingDrawings;
            }
            SessionEventKind::RoundAdvanced(e) => {
                self.current_round = e.next_round;
                self.phase = Phase::CollectingPrompts;
            }
            SessionEventKind::SessionEnded(e) => {
                if e.reason == EndReason::Completed {
                    self.current_round = e.rounds_played;
                }
                self.rounds_played = e.rounds_played;
                self.end_reason = Some(e.reason);
                self.lifecycle = Lifecycle::Ended;
            }
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}
