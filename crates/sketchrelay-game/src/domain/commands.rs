//! Commands for game sessions.

use sketchrelay_core::command::Command;
use uuid::Uuid;

/// Command to create a new session in the lobby.
#[derive(Debug, Clone)]
pub struct CreateSession {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Unique session name.
    pub name: String,
    /// Requested round count; `None` or `<= 0` means one per participant.
    pub total_rounds: Option<i64>,
    /// Advisory per-round timer in seconds.
    pub round_timer: Option<u32>,
}

impl Command for CreateSession {
    fn command_type(&self) -> &'static str {
        "session.create"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to join a session as participant or spectator.
#[derive(Debug, Clone)]
pub struct JoinSession {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Session name.
    pub name: String,
    /// Joining identity.
    pub identity: String,
    /// Identity secret.
    pub secret: String,
}

impl Command for JoinSession {
    fn command_type(&self) -> &'static str {
        "session.join"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to start a session.
#[derive(Debug, Clone)]
pub struct StartSession {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Session name.
    pub name: String,
}

impl Command for StartSession {
    fn command_type(&self) -> &'static str {
        "session.start"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to submit a prompt (or caption) for the current round.
#[derive(Debug, Clone)]
pub struct SubmitPrompt {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Session name.
    pub name: String,
    /// Submitting identity.
    pub identity: String,
    /// Identity secret.
    pub secret: String,
    /// Prompt text; may be empty.
    pub text: String,
}

impl Command for SubmitPrompt {
    fn command_type(&self) -> &'static str {
        "session.submit_prompt"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to submit a drawing for the current round.
#[derive(Debug, Clone)]
pub struct SubmitDrawing {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Session name.
    pub name: String,
    /// Submitting identity.
    pub identity: String,
    /// Identity secret.
    pub secret: String,
    /// Blob key returned by an upload.
    pub image_ref: String,
}

impl Command for SubmitDrawing {
    fn command_type(&self) -> &'static str {
        "session.submit_drawing"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to end a session immediately and archive it.
#[derive(Debug, Clone)]
pub struct EndSession {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Session name.
    pub name: String,
}

impl Command for EndSession {
    fn command_type(&self) -> &'static str {
        "session.end"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
