//! Participant directory.
//!
//! Process-wide registry of identities: first-use-binds-secret
//! authentication plus each identity's queued notification. A single mutex
//! serializes authentication, so two concurrent first uses of one name
//! cannot bind different secrets.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use sha2::{Digest, Sha256};
use sketchrelay_core::error::DomainError;
use sketchrelay_core::identity::IdentityService;
use tracing::{debug, warn};

use crate::domain::notifications::Notification;

/// Longest accepted identity name, in characters.
pub const MAX_IDENTITY_LEN: usize = 64;

#[derive(Debug)]
struct Participant {
    secret_digest: [u8; 32],
    notification: Notification,
}

/// Read-only view of an identity's queued notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationView {
    /// The identity the notification is for.
    pub identity: String,
    /// Human-readable status line.
    pub message: String,
    /// Structured notification.
    pub notification: Notification,
}

/// Identities known to this process.
#[derive(Debug, Default)]
pub struct ParticipantDirectory {
    participants: Mutex<HashMap<String, Participant>>,
}

impl ParticipantDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Participant>>, DomainError> {
        self.participants
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("directory mutex poisoned: {e}")))
    }

    /// Authenticates and fails with `DomainError::Auth` on a mismatch.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Auth` if the secret does not match, plus any
    /// error from [`IdentityService::authenticate`].
    pub fn require(&self, name: &str, secret: &str) -> Result<(), DomainError> {
        if self.authenticate(name, secret)? {
            Ok(())
        } else {
            Err(DomainError::Auth(format!("secret mismatch for {name}")))
        }
    }

    /// Replaces the queued notification of `identity`. Unknown identities
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the directory lock is
    /// poisoned.
    pub fn notify(&self, identity: &str, notification: Notification) -> Result<(), DomainError> {
        let mut participants = self.lock()?;
        if let Some(participant) = participants.get_mut(identity) {
            debug!(identity, kind = ?notification, "queued notification");
            participant.notification = notification;
        } else {
            warn!(identity, "dropping notification for unknown identity");
        }
        Ok(())
    }

    /// Returns the queued notification of `identity`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` for an unknown identity.
    pub fn notification(&self, identity: &str) -> Result<NotificationView, DomainError> {
        let participants = self.lock()?;
        let participant = participants
            .get(identity)
            .ok_or_else(|| DomainError::not_found("participant", identity))?;
        Ok(NotificationView {
            identity: identity.to_owned(),
            message: participant.notification.message(),
            notification: participant.notification.clone(),
        })
    }
}

impl IdentityService for ParticipantDirectory {
    fn authenticate(&self, name: &str, secret: &str) -> Result<bool, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation(
                "identity name must not be empty".to_owned(),
            ));
        }
        if name.chars().count() > MAX_IDENTITY_LEN {
            return Err(DomainError::Validation(format!(
                "identity name must be at most {MAX_IDENTITY_LEN} characters"
            )));
        }
        if secret.is_empty() {
            return Err(DomainError::Validation(
                "identity secret must not be empty".to_owned(),
            ));
        }

        let digest = secret_digest(name, secret);
        let mut participants = self.lock()?;
        match participants.get(name) {
            Some(existing) => Ok(existing.secret_digest == digest),
            None => {
                debug!(identity = name, "binding secret on first use");
                participants.insert(
                    name.to_owned(),
                    Participant {
                        secret_digest: digest,
                        notification: Notification::Welcome,
                    },
                );
                Ok(true)
            }
        }
    }
}

fn secret_digest(name: &str, secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update([0]);
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}
