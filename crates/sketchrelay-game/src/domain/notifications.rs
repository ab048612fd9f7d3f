//! Queued participant notifications.
//!
//! Each identity holds exactly one pending notification: the latest status
//! message produced for it. Clients poll for it; newer messages overwrite
//! older ones.

use serde::Serialize;

use super::events::{SessionEvent, SessionEventKind};

/// The latest status message for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// The identity was just registered.
    Welcome,
    /// Joined a lobby as a participant.
    Joined {
        /// Session name.
        session: String,
        /// Fixed chain position.
        position: usize,
    },
    /// Joined a running session as a spectator.
    Spectating {
        /// Session name.
        session: String,
    },
    /// The game started; write the first prompt.
    GameStarted {
        /// Session name.
        session: String,
        /// Resolved number of rounds.
        total_rounds: usize,
    },
    /// Draw the given prompt.
    DrawPrompt {
        /// Session name.
        session: String,
        /// Zero-based round.
        round: usize,
        /// The prompt to draw.
        prompt: Option<String>,
    },
    /// Write a caption for the given drawing.
    CaptionDrawing {
        /// Session name.
        session: String,
        /// Zero-based round the caption belongs to.
        round: usize,
        /// Blob key of the drawing to caption.
        drawing: Option<String>,
    },
    /// Submission accepted; wait for the others.
    Waiting {
        /// Session name.
        session: String,
        /// Zero-based round.
        round: usize,
    },
    /// The game finished and was archived.
    GameEnded {
        /// Session name.
        session: String,
        /// Archive id to fetch results from.
        archive_id: String,
    },
}

impl Notification {
    /// Human-readable one-line status.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Welcome => "Welcome! Join a game to get started.".to_owned(),
            Self::Joined { session, .. } => {
                format!("Joined {session}. Waiting for the game to start.")
            }
            Self::Spectating { session } => {
                format!("{session} is already underway. You are spectating.")
            }
            Self::GameStarted { session, .. } => {
                format!("{session} has started! Write a prompt.")
            }
            Self::DrawPrompt { round, .. } => format!("Round {}: draw this prompt.", round + 1),
            Self::CaptionDrawing { round, .. } => {
                format!("Round {}: write a caption for this drawing.", round + 1)
            }
            Self::Waiting { round, .. } => {
                format!("Round {}: waiting for the other players.", round + 1)
            }
            Self::GameEnded { session, .. } => {
                format!("{session} has ended. The results are ready.")
            }
        }
    }
}

/// Maps one session event to the notifications it produces, in order.
#[must_use]
pub fn notifications_for(session: &str, event: &SessionEvent) -> Vec<(String, Notification)> {
    let session = session.to_owned();
    match &event.kind {
        SessionEventKind::ParticipantJoined(e) => vec![(
            e.identity.clone(),
            Notification::Joined {
                session,
                position: e.position,
            },
        )],
        SessionEventKind::SpectatorJoined(e) => {
            vec![(e.identity.clone(), Notification::Spectating { session })]
        }
        SessionEventKind::SessionStarted(e) => e
            .participants
            .iter()
            .map(|identity| {
                (
                    identity.clone(),
                    Notification::GameStarted {
                        session: session.clone(),
                        total_rounds: e.total_rounds,
                    },
                )
            })
            .collect(),
        SessionEventKind::PromptSubmitted(e) => vec![(
            e.identity.clone(),
            Notification::Waiting {
                session,
                round: e.round,
            },
        )],
        SessionEventKind::DrawingSubmitted(e) => vec![(
            e.identity.clone(),
            Notification::Waiting {
                session,
                round: e.round,
            },
        )],
        SessionEventKind::PhaseAdvanced(e) => e
            .assignments
            .iter()
            .map(|a| {
                (
                    a.identity.clone(),
                    Notification::DrawPrompt {
                        session: session.clone(),
                        round: e.round,
                        prompt: a.source.clone(),
                    },
                )
            })
            .collect(),
        SessionEventKind::RoundAdvanced(e) => e
            .assignments
            .iter()
            .map(|a| {
                (
                    a.identity.clone(),
                    Notification::CaptionDrawing {
                        session: session.clone(),
                        round: e.next_round,
                        drawing: a.source.clone(),
                    },
                )
            })
            .collect(),
        // The archive id is only known once the session is archived.
        SessionEventKind::SessionEnded(_) => Vec::new(),
    }
}
