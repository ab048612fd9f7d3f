//! Domain events for game sessions.

use serde::{Deserialize, Serialize};
use sketchrelay_core::event::{DomainEvent, EventMetadata};

/// Emitted when an identity joins a session before it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantJoined {
    /// The joining identity.
    pub identity: String,
    /// Join position, which fixes the identity's chain rotation.
    pub position: usize,
}

/// Emitted when an identity joins a session after it has started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectatorJoined {
    /// The joining identity.
    pub identity: String,
}

/// Emitted when a session leaves the lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStarted {
    /// Participants in join order.
    pub participants: Vec<String>,
    /// Resolved number of rounds.
    pub total_rounds: usize,
}

/// Emitted when a participant's prompt is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSubmitted {
    /// The submitting identity.
    pub identity: String,
    /// Chain the prompt was written into.
    pub chain: usize,
    /// Round the prompt belongs to.
    pub round: usize,
    /// The prompt text.
    pub text: String,
}

/// Emitted when a participant's drawing is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawingSubmitted {
    /// The submitting identity.
    pub identity: String,
    /// Chain the drawing was written into.
    pub chain: usize,
    /// Round the drawing belongs to.
    pub round: usize,
    /// Blob key of the uploaded drawing.
    pub image_ref: String,
}

/// What one participant has to work on next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// The participant.
    pub identity: String,
    /// Chain the participant contributes to next.
    pub chain: usize,
    /// The prompt text or drawing key they respond to.
    pub source: Option<String>,
}

/// Emitted when every chain has a prompt for the current round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseAdvanced {
    /// The round now collecting drawings.
    pub round: usize,
    /// Prompt each participant must draw.
    pub assignments: Vec<Assignment>,
}

/// Emitted when every chain has a drawing for the current round and more
/// rounds remain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundAdvanced {
    /// The round that just completed.
    pub completed_round: usize,
    /// The round now collecting prompts.
    pub next_round: usize,
    /// Drawing each participant must caption.
    pub assignments: Vec<Assignment>,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The final round's drawings were all submitted.
    Completed,
    /// The session was ended explicitly.
    Forced,
}

/// Emitted when a session reaches its terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEnded {
    /// Why the session ended.
    pub reason: EndReason,
    /// Number of rounds that received any content.
    pub rounds_played: usize,
}

/// Event type identifier for [`ParticipantJoined`].
pub const PARTICIPANT_JOINED_EVENT_TYPE: &str = "session.participant_joined";

/// Event type identifier for [`SpectatorJoined`].
pub const SPECTATOR_JOINED_EVENT_TYPE: &str = "session.spectator_joined";

/// Event type identifier for [`SessionStarted`].
pub const SESSION_STARTED_EVENT_TYPE: &str = "session.started";

/// Event type identifier for [`PromptSubmitted`].
pub const PROMPT_SUBMITTED_EVENT_TYPE: &str = "session.prompt_submitted";

/// Event type identifier for [`DrawingSubmitted`].
pub const DRAWING_SUBMITTED_EVENT_TYPE: &str = "session.drawing_submitted";

/// Event type identifier for [`PhaseAdvanced`].
pub const PHASE_ADVANCED_EVENT_TYPE: &str = "session.phase_advanced";

/// Event type identifier for [`RoundAdvanced`].
pub const ROUND_ADVANCED_EVENT_TYPE: &str = "session.round_advanced";

/// Event type identifier for [`SessionEnded`].
pub const SESSION_ENDED_EVENT_TYPE: &str = "session.ended";

/// Event payload variants for game sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEventKind {
    /// A participant joined the lobby.
    ParticipantJoined(ParticipantJoined),
    /// A spectator joined a running session.
    SpectatorJoined(SpectatorJoined),
    /// The session started.
    SessionStarted(SessionStarted),
    /// A prompt was accepted.
    PromptSubmitted(PromptSubmitted),
    /// A drawing was accepted.
    DrawingSubmitted(DrawingSubmitted),
    /// Prompts are complete; drawings are being collected.
    PhaseAdvanced(PhaseAdvanced),
    /// Drawings are complete; the next round's prompts are being collected.
    RoundAdvanced(RoundAdvanced),
    /// The session ended.
    SessionEnded(SessionEnded),
}

impl SessionEventKind {
    /// Returns the event type name for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ParticipantJoined(_) => PARTICIPANT_JOINED_EVENT_TYPE,
            Self::SpectatorJoined(_) => SPECTATOR_JOINED_EVENT_TYPE,
            Self::SessionStarted(_) => SESSION_STARTED_EVENT_TYPE,
            Self::PromptSubmitted(_) => PROMPT_SUBMITTED_EVENT_TYPE,
            Self::DrawingSubmitted(_) => DRAWING_SUBMITTED_EVENT_TYPE,
            Self::PhaseAdvanced(_) => PHASE_ADVANCED_EVENT_TYPE,
            Self::RoundAdvanced(_) => ROUND_ADVANCED_EVENT_TYPE,
            Self::SessionEnded(_) => SESSION_ENDED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for game sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: SessionEventKind,
}

impl DomainEvent for SessionEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("SessionEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
