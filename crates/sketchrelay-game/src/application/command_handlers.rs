//! Command handlers for game sessions.
//!
//! Each handler authenticates where required, locks the target session only
//! around the synchronous domain call, posts the resulting notifications
//! while still holding that lock, and, if the session ended, renders and
//! archives it on a detached task after the lock is released.

use std::sync::{Arc, MutexGuard};

use serde::Serialize;
use sketchrelay_core::blob::{BlobStore, DRAWING_PREFIX, validate_key};
use sketchrelay_core::clock::Clock;
use sketchrelay_core::error::DomainError;
use sketchrelay_core::event::DomainEvent;
use sketchrelay_core::render::AnimationRenderer;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::directory::ParticipantDirectory;
use crate::application::registry::{SessionHandle, SessionRegistry};
use crate::domain::archive::ArchiveDraft;
use crate::domain::commands::{
    CreateSession, EndSession, JoinSession, StartSession, SubmitDrawing, SubmitPrompt,
};
use crate::domain::events::SessionEventKind;
use crate::domain::notifications::{Notification, notifications_for};
use crate::domain::session::{GameSession, JoinRole, Phase};
use crate::domain::submission::submit;

/// Outcome of a session command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionCommandResult {
    /// Name of the session the command ran against.
    pub session_name: String,
    /// Ids of the events the command produced, in order.
    pub event_ids: Vec<Uuid>,
    /// Set when the command ended the session.
    pub archive_id: Option<String>,
}

/// Outcome of a join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinResult {
    /// Name of the joined session.
    pub session_name: String,
    /// Role the identity holds in the session.
    pub role: JoinRole,
    /// Ids of the events the join produced; empty for a re-join.
    pub event_ids: Vec<Uuid>,
}

/// Outcome of a prompt or drawing submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionResult {
    /// Name of the session.
    pub session_name: String,
    /// Chain the submission was written to.
    pub chain: usize,
    /// Round the submission was written to.
    pub round: usize,
    /// Whether the submission completed the round's phase.
    pub advanced: bool,
    /// Ids of the events the submission produced, in order.
    pub event_ids: Vec<Uuid>,
    /// Set when the submission finished the game.
    pub archive_id: Option<String>,
}

fn lock_session(handle: &SessionHandle) -> Result<MutexGuard<'_, GameSession>, DomainError> {
    handle
        .lock()
        .map_err(|e| DomainError::Infrastructure(format!("session mutex poisoned: {e}")))
}

/// Drains the session's events, posts their notifications and, if the
/// session just ended, copies it into an archive draft.
///
/// Runs under the session lock so every participant sees notifications in
/// event order.
fn publish(
    session: &mut GameSession,
    directory: &ParticipantDirectory,
    clock: &dyn Clock,
) -> Result<(Vec<Uuid>, Option<ArchiveDraft>), DomainError> {
    let events = session.drain_events();
    let mut ended = false;
    for event in &events {
        debug!(
            session = session.name(),
            event_type = event.event_type(),
            sequence_number = event.metadata().sequence_number,
            "session event"
        );
        if matches!(event.kind, SessionEventKind::SessionEnded(_)) {
            ended = true;
        }
        for (identity, notification) in notifications_for(session.name(), event) {
            directory.notify(&identity, notification)?;
        }
    }
    let event_ids = events.iter().map(|e| e.metadata().event_id).collect();
    let draft = if ended {
        ArchiveDraft::from_session(session, clock.now())
    } else {
        None
    };
    Ok((event_ids, draft))
}

/// Renders an ended session, moves it into the archive and tells every
/// participant where the results are. Returns the archive id.
///
/// Rendering never fails as a whole; chains that cannot be rendered are
/// archived without an animation.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the registry or directory lock
/// is poisoned.
pub async fn finalize_session(
    draft: ArchiveDraft,
    registry: &SessionRegistry,
    directory: &ParticipantDirectory,
    renderer: &dyn AnimationRenderer,
) -> Result<String, DomainError> {
    let session_name = draft.session_name.clone();
    let participants = draft.participants.clone();
    let chains = draft.chains();
    let chain_count = chains.len();

    let animations = renderer.render_chains(&draft.archive_id, chains).await;
    let rendered = animations.iter().filter(|a| a.is_some()).count();
    info!(
        session = %session_name,
        archive_id = %draft.archive_id,
        chains = chain_count,
        rendered,
        "rendered session animations"
    );

    let archived = registry.retire(&session_name, draft.into_result(animations))?;
    for identity in &participants {
        directory.notify(
            identity,
            Notification::GameEnded {
                session: session_name.clone(),
                archive_id: archived.id.clone(),
            },
        )?;
    }
    Ok(archived.id.clone())
}

/// Runs [`finalize_session`] on its own task and waits for it.
///
/// The session is already `Ended` in the registry; dropping the caller
/// (a disconnected client) must not leave it there unarchived.
async fn finish(
    draft: Option<ArchiveDraft>,
    services: &Services,
) -> Result<Option<String>, DomainError> {
    let Some(draft) = draft else {
        return Ok(None);
    };
    let registry = Arc::clone(&services.registry);
    let directory = Arc::clone(&services.directory);
    let renderer = Arc::clone(&services.renderer);
    let task = tokio::spawn(async move {
        finalize_session(draft, &registry, &directory, renderer.as_ref()).await
    });
    let archive_id = task
        .await
        .map_err(|e| DomainError::Infrastructure(format!("finalize task failed: {e}")))??;
    Ok(Some(archive_id))
}

/// Checks that `image_ref` names a drawing produced by an upload.
async fn require_uploaded_drawing(
    image_ref: &str,
    blobs: &dyn BlobStore,
) -> Result<(), DomainError> {
    let key = image_ref.trim();
    if key.is_empty() {
        return Err(DomainError::Validation(
            "drawing reference must not be empty".to_owned(),
        ));
    }
    validate_key(key)?;
    if !key.starts_with(DRAWING_PREFIX) {
        return Err(DomainError::Validation(format!(
            "drawing reference must name an uploaded drawing: {key}"
        )));
    }
    if !blobs.exists(key).await? {
        return Err(DomainError::not_found("drawing", key));
    }
    Ok(())
}

/// Handles the `CreateSession` command: validates the settings and
/// registers a new session in the lobby.
///
/// # Errors
///
/// Returns `DomainError::Validation` for invalid settings and
/// `DomainError::State` if the name is taken or the registry is shut down.
pub fn handle_create_session(
    command: &CreateSession,
    registry: &SessionRegistry,
) -> Result<SessionCommandResult, DomainError> {
    let session = GameSession::new(
        Uuid::new_v4(),
        &command.name,
        command.total_rounds,
        command.round_timer,
    )?;
    let session_name = session.name().to_owned();
    registry.create(session)?;
    info!(session = %session_name, "session created");
    Ok(SessionCommandResult {
        session_name,
        event_ids: Vec::new(),
        archive_id: None,
    })
}

/// Handles the `JoinSession` command: authenticates the identity and adds
/// it as a participant (lobby) or spectator (running).
///
/// # Errors
///
/// Returns `DomainError::Auth` on a secret mismatch,
/// `DomainError::NotFound` for an unknown session and `DomainError::State`
/// if the session has ended.
pub fn handle_join_session(
    command: &JoinSession,
    clock: &dyn Clock,
    registry: &SessionRegistry,
    directory: &ParticipantDirectory,
) -> Result<JoinResult, DomainError> {
    let identity = command.identity.trim();
    directory.require(identity, &command.secret)?;
    let handle = registry.get(&command.name)?;

    let mut session = lock_session(&handle)?;
    let role = session.join(identity, command.correlation_id, clock)?;
    let (event_ids, _) = publish(&mut session, directory, clock)?;
    Ok(JoinResult {
        session_name: session.name().to_owned(),
        role,
        event_ids,
    })
}

/// Handles the `StartSession` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for an unknown session and
/// `DomainError::State` if it already started or has no participants.
pub fn handle_start_session(
    command: &StartSession,
    clock: &dyn Clock,
    registry: &SessionRegistry,
    directory: &ParticipantDirectory,
) -> Result<SessionCommandResult, DomainError> {
    let handle = registry.get(&command.name)?;

    let mut session = lock_session(&handle)?;
    session.start(command.correlation_id, clock)?;
    let (event_ids, _) = publish(&mut session, directory, clock)?;
    info!(
        session = session.name(),
        participants = session.participants().len(),
        total_rounds = session.total_rounds(),
        "session started"
    );
    Ok(SessionCommandResult {
        session_name: session.name().to_owned(),
        event_ids,
        archive_id: None,
    })
}

async fn handle_submission(
    name: &str,
    identity: &str,
    secret: &str,
    phase: Phase,
    content: String,
    correlation_id: Uuid,
    services: &Services,
) -> Result<SubmissionResult, DomainError> {
    let identity = identity.trim();
    services.directory.require(identity, secret)?;
    let handle = services.registry.get(name)?;
    if matches!(phase, Phase::CollectingDrawings) {
        require_uploaded_drawing(&content, services.blobs.as_ref()).await?;
    }

    // Lock only for the synchronous domain call; never across an await.
    let (session_name, receipt, event_ids, draft) = {
        let mut session = lock_session(&handle)?;
        let receipt = submit(
            &mut session,
            identity,
            phase,
            content,
            correlation_id,
            services.clock.as_ref(),
        )?;
        let (event_ids, draft) =
            publish(&mut session, &services.directory, services.clock.as_ref())?;
        (session.name().to_owned(), receipt, event_ids, draft)
    };

    let archive_id = finish(draft, services).await?;
    Ok(SubmissionResult {
        session_name,
        chain: receipt.chain,
        round: receipt.round,
        advanced: receipt.advanced,
        event_ids,
        archive_id,
    })
}

/// Collaborators a submission or end-of-game needs.
#[derive(Clone)]
pub struct Services {
    /// Time source for event metadata and archive timestamps.
    pub clock: Arc<dyn Clock>,
    /// Active sessions and archives.
    pub registry: Arc<SessionRegistry>,
    /// Identities and their queued notifications.
    pub directory: Arc<ParticipantDirectory>,
    /// Renders finished chains.
    pub renderer: Arc<dyn AnimationRenderer>,
    /// Where uploaded drawings live.
    pub blobs: Arc<dyn BlobStore>,
}

/// Handles the `SubmitPrompt` command: writes the caller's prompt for the
/// current round and advances the phase once every chain has one.
///
/// # Errors
///
/// Returns `DomainError::Auth` on a secret mismatch,
/// `DomainError::NotFound` for an unknown session or non-member,
/// and `DomainError::State` for a wrong phase, a spectator or a duplicate.
pub async fn handle_submit_prompt(
    command: &SubmitPrompt,
    services: &Services,
) -> Result<SubmissionResult, DomainError> {
    handle_submission(
        &command.name,
        &command.identity,
        &command.secret,
        Phase::CollectingPrompts,
        command.text.clone(),
        command.correlation_id,
        services,
    )
    .await
}

/// Handles the `SubmitDrawing` command: records the caller's drawing
/// reference for the current round and, once every chain has one, advances
/// the round or finishes the game.
///
/// # Errors
///
/// Same as [`handle_submit_prompt`], plus `DomainError::Validation` for a
/// blank or malformed image reference or one outside the drawings area, and
/// `DomainError::NotFound` if no drawing is stored under it.
pub async fn handle_submit_drawing(
    command: &SubmitDrawing,
    services: &Services,
) -> Result<SubmissionResult, DomainError> {
    handle_submission(
        &command.name,
        &command.identity,
        &command.secret,
        Phase::CollectingDrawings,
        command.image_ref.clone(),
        command.correlation_id,
        services,
    )
    .await
}

/// Handles the `EndSession` command: ends the session immediately and
/// archives whatever content exists.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for an unknown session and
/// `DomainError::State` if it has already ended.
pub async fn handle_end_session(
    command: &EndSession,
    services: &Services,
) -> Result<SessionCommandResult, DomainError> {
    let handle = services.registry.get(&command.name)?;

    let (session_name, event_ids, draft) = {
        let mut session = lock_session(&handle)?;
        session.end_explicitly(command.correlation_id, services.clock.as_ref())?;
        let (event_ids, draft) =
            publish(&mut session, &services.directory, services.clock.as_ref())?;
        (session.name().to_owned(), event_ids, draft)
    };

    let archive_id = finish(draft, services).await?;
    Ok(SessionCommandResult {
        session_name,
        event_ids,
        archive_id,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use sketchrelay_test_support::{FixedClock, MemoryBlobStore, RecordingRenderer};

    use super::*;

    struct Fixture {
        clock: Arc<FixedClock>,
        registry: Arc<SessionRegistry>,
        directory: Arc<ParticipantDirectory>,
        renderer: Arc<RecordingRenderer>,
        blobs: Arc<MemoryBlobStore>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_renderer(RecordingRenderer::new())
        }

        fn with_renderer(renderer: RecordingRenderer) -> Self {
            Self {
                clock: Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())),
                registry: Arc::new(SessionRegistry::new()),
                directory: Arc::new(ParticipantDirectory::new()),
                renderer: Arc::new(renderer),
                blobs: Arc::new(MemoryBlobStore::new()),
            }
        }

        fn services(&self) -> Services {
            Services {
                clock: self.clock.clone(),
                registry: self.registry.clone(),
                directory: self.directory.clone(),
                renderer: self.renderer.clone(),
                blobs: self.blobs.clone(),
            }
        }

        /// Seeds `key` as if it had been uploaded.
        fn uploaded(&self, key: &str) -> String {
            self.blobs.insert(key, b"png".to_vec());
            key.to_owned()
        }

        fn create(&self, name: &str, rounds: Option<i64>) {
            handle_create_session(
                &CreateSession {
                    correlation_id: Uuid::new_v4(),
                    name: name.to_owned(),
                    total_rounds: rounds,
                    round_timer: None,
                },
                &self.registry,
            )
            .unwrap();
        }

        fn join(&self, name: &str, identity: &str) -> Result<JoinResult, DomainError> {
            handle_join_session(
                &JoinSession {
                    correlation_id: Uuid::new_v4(),
                    name: name.to_owned(),
                    identity: identity.to_owned(),
                    secret: format!("{identity}-pw"),
                },
                self.clock.as_ref(),
                &self.registry,
                &self.directory,
            )
        }

        fn start(&self, name: &str) -> Result<SessionCommandResult, DomainError> {
            handle_start_session(
                &StartSession {
                    correlation_id: Uuid::new_v4(),
                    name: name.to_owned(),
                },
                self.clock.as_ref(),
                &self.registry,
                &self.directory,
            )
        }

        async fn prompt(&self, name: &str, identity: &str, text: &str) -> SubmissionResult {
            handle_submit_prompt(
                &SubmitPrompt {
                    correlation_id: Uuid::new_v4(),
                    name: name.to_owned(),
                    identity: identity.to_owned(),
                    secret: format!("{identity}-pw"),
                    text: text.to_owned(),
                },
                &self.services(),
            )
            .await
            .unwrap()
        }

        fn drawing_command(&self, name: &str, identity: &str, image_ref: &str) -> SubmitDrawing {
            SubmitDrawing {
                correlation_id: Uuid::new_v4(),
                name: name.to_owned(),
                identity: identity.to_owned(),
                secret: format!("{identity}-pw"),
                image_ref: image_ref.to_owned(),
            }
        }

        async fn drawing(&self, name: &str, identity: &str, image_ref: &str) -> SubmissionResult {
            handle_submit_drawing(
                &self.drawing_command(name, identity, image_ref),
                &self.services(),
            )
            .await
            .unwrap()
        }

        async fn solo_game_awaiting_drawing(&self, name: &str) {
            self.create(name, None);
            self.join(name, "ada").unwrap();
            self.start(name).unwrap();
            self.prompt(name, "ada", "a lighthouse").await;
        }
    }

    #[test]
    fn test_create_duplicate_session_is_state_error() {
        let fixture = Fixture::new();
        fixture.create("party", None);

        let result = handle_create_session(
            &CreateSession {
                correlation_id: Uuid::new_v4(),
                name: "party".to_owned(),
                total_rounds: None,
                round_timer: None,
            },
            &fixture.registry,
        );

        assert!(matches!(result, Err(DomainError::State(_))));
    }

    #[test]
    fn test_join_with_wrong_secret_is_auth_error() {
        // Arrange
        let fixture = Fixture::new();
        fixture.create("party", None);
        fixture.join("party", "ada").unwrap();

        // Act
        let result = handle_join_session(
            &JoinSession {
                correlation_id: Uuid::new_v4(),
                name: "party".to_owned(),
                identity: "ada".to_owned(),
                secret: "not-the-secret".to_owned(),
            },
            fixture.clock.as_ref(),
            &fixture.registry,
            &fixture.directory,
        );

        // Assert
        assert!(matches!(result, Err(DomainError::Auth(_))));
    }

    #[test]
    fn test_join_posts_joined_notification() {
        let fixture = Fixture::new();
        fixture.create("party", None);

        let result = fixture.join("party", "ada").unwrap();

        assert_eq!(result.role, JoinRole::Participant);
        assert_eq!(result.event_ids.len(), 1);
        assert_eq!(
            fixture.directory.notification("ada").unwrap().notification,
            Notification::Joined {
                session: "party".to_owned(),
                position: 0
            }
        );
    }

    #[test]
    fn test_rejoin_produces_no_events() {
        let fixture = Fixture::new();
        fixture.create("party", None);
        fixture.join("party", "ada").unwrap();

        let again = fixture.join("party", "ada").unwrap();

        assert_eq!(again.role, JoinRole::Participant);
        assert!(again.event_ids.is_empty());
    }

    #[test]
    fn test_join_after_start_is_spectator() {
        let fixture = Fixture::new();
        fixture.create("party", None);
        fixture.join("party", "ada").unwrap();
        fixture.start("party").unwrap();

        let late = fixture.join("party", "eve").unwrap();

        assert_eq!(late.role, JoinRole::Spectator);
        assert!(matches!(
            fixture.directory.notification("eve").unwrap().notification,
            Notification::Spectating { .. }
        ));
    }

    #[test]
    fn test_start_without_participants_is_state_error() {
        let fixture = Fixture::new();
        fixture.create("party", None);

        let result = fixture.start("party");

        assert!(matches!(result, Err(DomainError::State(_))));
    }

    #[tokio::test]
    async fn test_prompt_round_hands_out_draw_prompts() {
        // Arrange
        let fixture = Fixture::new();
        fixture.create("party", Some(2));
        fixture.join("party", "ada").unwrap();
        fixture.join("party", "bob").unwrap();
        fixture.start("party").unwrap();

        // Act
        let first = fixture.prompt("party", "ada", "a cat").await;
        let second = fixture.prompt("party", "bob", "a dog").await;

        // Assert
        assert!(!first.advanced);
        assert!(second.advanced);
        // Round 0 prompts are drawn by the owner of the same chain.
        assert_eq!(
            fixture.directory.notification("ada").unwrap().notification,
            Notification::DrawPrompt {
                session: "party".to_owned(),
                round: 0,
                prompt: Some("a cat".to_owned()),
            }
        );
    }

    #[tokio::test]
    async fn test_final_drawing_archives_session() {
        // Arrange
        let fixture = Fixture::new();
        fixture.solo_game_awaiting_drawing("solo").await;
        let image_ref = fixture.uploaded("drawings/one.png");

        // Act
        let result = fixture.drawing("solo", "ada", &image_ref).await;

        // Assert
        let archive_id = result.archive_id.expect("game should be archived");
        assert!(fixture.registry.active_names().unwrap().is_empty());
        let archived = fixture.registry.archived(&archive_id).unwrap();
        assert_eq!(
            archived.animations,
            vec![Some(format!("animations/{archive_id}/chain-0.gif"))]
        );
        assert_eq!(
            fixture.directory.notification("ada").unwrap().notification,
            Notification::GameEnded {
                session: "solo".to_owned(),
                archive_id,
            }
        );
    }

    #[tokio::test]
    async fn test_end_from_lobby_archives_zero_chains() {
        let fixture = Fixture::new();
        fixture.create("party", None);

        let result = handle_end_session(
            &EndSession {
                correlation_id: Uuid::new_v4(),
                name: "party".to_owned(),
            },
            &fixture.services(),
        )
        .await
        .unwrap();

        let archived = fixture
            .registry
            .archived(result.archive_id.as_deref().unwrap())
            .unwrap();
        assert!(archived.animations.is_empty());
        assert!(archived.ended_early);
        let calls = fixture.renderer.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.is_empty());
    }

    #[tokio::test]
    async fn test_end_unknown_session_is_not_found() {
        let fixture = Fixture::new();

        let result = handle_end_session(
            &EndSession {
                correlation_id: Uuid::new_v4(),
                name: "ghost".to_owned(),
            },
            &fixture.services(),
        )
        .await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_drawing_that_was_never_uploaded_is_not_found() {
        // Arrange
        let fixture = Fixture::new();
        fixture.solo_game_awaiting_drawing("solo").await;

        // Act
        let result = handle_submit_drawing(
            &fixture.drawing_command("solo", "ada", "drawings/missing.png"),
            &fixture.services(),
        )
        .await;

        // Assert
        assert!(matches!(result, Err(DomainError::NotFound { entity: "drawing", .. })));
        let handle = fixture.registry.get("solo").unwrap();
        let session = handle.lock().unwrap();
        assert_eq!(session.phase(), Phase::CollectingDrawings);
        assert!(fixture.renderer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_drawing_outside_drawings_area_is_validation_error() {
        let fixture = Fixture::new();
        fixture.solo_game_awaiting_drawing("solo").await;
        let animation = fixture.uploaded("animations/other/chain-0.gif");

        for image_ref in [animation.as_str(), "../drawings/x.png", "   "] {
            let result = handle_submit_drawing(
                &fixture.drawing_command("solo", "ada", image_ref),
                &fixture.services(),
            )
            .await;

            assert!(
                matches!(result, Err(DomainError::Validation(_))),
                "expected {image_ref:?} to be rejected"
            );
        }
        assert!(fixture.registry.archive_ids().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_final_submission_still_archives_session() {
        // Arrange
        let renderer = RecordingRenderer::delayed(Duration::from_millis(200));
        let fixture = Fixture::with_renderer(renderer);
        fixture.solo_game_awaiting_drawing("solo").await;
        let image_ref = fixture.uploaded("drawings/one.png");
        let command = fixture.drawing_command("solo", "ada", &image_ref);
        let services = fixture.services();

        // Act: give up on the request while the animation is still rendering.
        let outcome = tokio::time::timeout(
            Duration::from_millis(20),
            handle_submit_drawing(&command, &services),
        )
        .await;

        // Assert
        assert!(outcome.is_err());
        let mut archive_ids = Vec::new();
        for _ in 0..100 {
            archive_ids = fixture.registry.archive_ids().unwrap();
            if !archive_ids.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(archive_ids.len(), 1);
        assert!(fixture.registry.active_names().unwrap().is_empty());
        assert_eq!(
            fixture.directory.notification("ada").unwrap().notification,
            Notification::GameEnded {
                session: "solo".to_owned(),
                archive_id: archive_ids[0].clone(),
            }
        );
    }
}
