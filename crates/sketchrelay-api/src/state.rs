//! Shared application state.

use std::sync::Arc;

use sketchrelay_core::blob::BlobStore;
use sketchrelay_core::clock::Clock;
use sketchrelay_core::render::AnimationRenderer;
use sketchrelay_game::application::command_handlers::Services;
use sketchrelay_game::application::directory::ParticipantDirectory;
use sketchrelay_game::application::registry::SessionRegistry;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock for deterministic time.
    pub clock: Arc<dyn Clock>,
    /// Active sessions and archived results.
    pub registry: Arc<SessionRegistry>,
    /// Identities, secrets and queued notifications.
    pub directory: Arc<ParticipantDirectory>,
    /// Renders finished games.
    pub renderer: Arc<dyn AnimationRenderer>,
    /// Uploaded drawings and rendered animations.
    pub blobs: Arc<dyn BlobStore>,
    /// Edge length uploads are normalized to.
    pub upload_size: u32,
}

impl AppState {
    /// Create new application state with an empty registry and directory.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        renderer: Arc<dyn AnimationRenderer>,
        blobs: Arc<dyn BlobStore>,
        upload_size: u32,
    ) -> Self {
        Self {
            clock,
            registry: Arc::new(SessionRegistry::new()),
            directory: Arc::new(ParticipantDirectory::new()),
            renderer,
            blobs,
            upload_size,
        }
    }

    /// Shares the collaborators the game handlers need.
    #[must_use]
    pub fn services(&self) -> Services {
        Services {
            clock: Arc::clone(&self.clock),
            registry: Arc::clone(&self.registry),
            directory: Arc::clone(&self.directory),
            renderer: Arc::clone(&self.renderer),
            blobs: Arc::clone(&self.blobs),
        }
    }
}
