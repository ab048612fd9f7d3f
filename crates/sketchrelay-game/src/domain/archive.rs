//! Archived results of finished sessions.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sketchrelay_core::render::ChainContent;
use uuid::Uuid;

use super::events::EndReason;
use super::rotation::contributor;
use super::session::GameSession;
use super::submission::ChainMatrix;

/// Length of an archive id in hex characters.
pub const ARCHIVE_ID_LEN: usize = 32;

/// Content copied out of an ended session, before its chains are rendered.
#[derive(Debug, Clone)]
pub struct ArchiveDraft {
    /// Archive id the result will be stored under.
    pub archive_id: String,
    /// Id of the session that ended.
    pub session_id: Uuid,
    /// Name of the session that ended.
    pub session_name: String,
    /// Participants in join order.
    pub participants: Vec<String>,
    /// Resolved round count (0 if ended from the lobby).
    pub total_rounds: usize,
    /// Rounds that received any content.
    pub rounds_played: usize,
    /// Whether the session was ended explicitly.
    pub ended_early: bool,
    /// Final prompt matrix.
    pub prompts: ChainMatrix,
    /// Final drawing matrix.
    pub drawings: ChainMatrix,
    /// When the session ended.
    pub ended_at: DateTime<Utc>,
}

impl ArchiveDraft {
    /// Copies the content of an ended session. Returns `None` while the
    /// session is still running.
    #[must_use]
    pub fn from_session(session: &GameSession, ended_at: DateTime<Utc>) -> Option<Self> {
        if !session.is_ended() {
            return None;
        }
        Some(Self {
            archive_id: archive_id(session.id, session.name(), ended_at),
            session_id: session.id,
            session_name: session.name().to_owned(),
            participants: session.participants().to_vec(),
            total_rounds: session.total_rounds(),
            rounds_played: session.rounds_played(),
            ended_early: session.end_reason() == Some(EndReason::Forced),
            prompts: session.prompts().clone(),
            drawings: session.drawings().clone(),
            ended_at,
        })
    }

    /// One entry per chain, truncated to the rounds that were played.
    #[must_use]
    pub fn chains(&self) -> Vec<ChainContent> {
        (0..self.prompts.chain_count())
            .map(|chain| ChainContent {
                chain,
                prompts: played(self.prompts.chain(chain), self.rounds_played),
                drawings: played(self.drawings.chain(chain), self.rounds_played),
            })
            .collect()
    }

    /// Seals the draft with one rendered animation reference per chain.
    #[must_use]
    pub fn into_result(self, animations: Vec<Option<String>>) -> ArchivedResult {
        let contributors = match std::num::NonZeroUsize::new(self.participants.len()) {
            Some(count) => (0..self.prompts.chain_count())
                .map(|chain| {
                    (0..self.rounds_played)
                        .map(|round| self.participants[contributor(chain, round, count)].clone())
                        .collect()
                })
                .collect(),
            None => Vec::new(),
        };
        ArchivedResult {
            id: self.archive_id,
            session_id: self.session_id,
            session_name: self.session_name,
            participants: self.participants,
            total_rounds: self.total_rounds,
            rounds_played: self.rounds_played,
            ended_early: self.ended_early,
            prompts: self.prompts,
            drawings: self.drawings,
            contributors,
            animations,
            ended_at: self.ended_at,
        }
    }
}

fn played(cells: &[Option<String>], rounds: usize) -> Vec<Option<String>> {
    cells.iter().take(rounds).cloned().collect()
}

/// Immutable record of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchivedResult {
    /// Archive id.
    pub id: String,
    /// Id of the archived session.
    pub session_id: Uuid,
    /// Name of the archived session.
    pub session_name: String,
    /// Participants in join order.
    pub participants: Vec<String>,
    /// Resolved round count.
    pub total_rounds: usize,
    /// Rounds that received any content.
    pub rounds_played: usize,
    /// Whether the session was ended explicitly.
    pub ended_early: bool,
    /// Final prompt matrix, `[chain][round]`.
    pub prompts: ChainMatrix,
    /// Final drawing matrix, `[chain][round]`.
    pub drawings: ChainMatrix,
    /// Who contributed each played cell, `[chain][round]`.
    pub contributors: Vec<Vec<String>>,
    /// Rendered animation blob key per chain; `None` where rendering failed.
    pub animations: Vec<Option<String>>,
    /// When the session ended.
    pub ended_at: DateTime<Utc>,
}

/// Derives a 32-hex-character archive id from the session identity and end
/// time.
#[must_use]
pub fn archive_id(session_id: Uuid, name: &str, ended_at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    hasher.update(name.as_bytes());
    hasher.update(ended_at.to_rfc3339().as_bytes());
    let digest = hasher.finalize();

    let mut id = String::with_capacity(ARCHIVE_ID_LEN);
    for byte in &digest[..ARCHIVE_ID_LEN / 2] {
        let _ = write!(id, "{byte:02x}");
    }
    id
}
