//! Session registry.
//!
//! Owns the active sessions (by name) and the archived results (by id).
//! The registry lock is held only long enough to look up, insert or swap a
//! map entry; session work happens under each session's own mutex after
//! the registry lock is released.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use sketchrelay_core::error::DomainError;
use tracing::{info, warn};

use crate::domain::archive::ArchivedResult;
use crate::domain::session::GameSession;

/// Shared handle to one live session.
pub type SessionHandle = Arc<Mutex<GameSession>>;

#[derive(Debug)]
struct RegistryInner {
    accepting: bool,
    active: HashMap<String, SessionHandle>,
    archived: HashMap<String, Arc<ArchivedResult>>,
}

/// Process-wide collection of active sessions and archived results.
#[derive(Debug)]
pub struct SessionRegistry {
    inner: RwLock<RegistryInner>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    /// Creates an empty registry that accepts new sessions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                accepting: true,
                active: HashMap::new(),
                archived: HashMap::new(),
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RegistryInner>, DomainError> {
        self.inner
            .read()
            .map_err(|e| DomainError::Infrastructure(format!("registry lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RegistryInner>, DomainError> {
        self.inner
            .write()
            .map_err(|e| DomainError::Infrastructure(format!("registry lock poisoned: {e}")))
    }

    /// Registers a freshly created session under its name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::State` if the name is already active or the
    /// registry has been shut down.
    pub fn create(&self, session: GameSession) -> Result<SessionHandle, DomainError> {
        let mut inner = self.write()?;
        if !inner.accepting {
            return Err(DomainError::State(
                "server is shutting down; no new sessions".to_owned(),
            ));
        }
        let name = session.name().to_owned();
        if inner.active.contains_key(&name) {
            return Err(DomainError::State(format!(
                "session {name} already exists"
            )));
        }
        let handle = Arc::new(Mutex::new(session));
        inner.active.insert(name, Arc::clone(&handle));
        Ok(handle)
    }

    /// Looks up an active session by name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if no active session has that name.
    pub fn get(&self, name: &str) -> Result<SessionHandle, DomainError> {
        self.read()?
            .active
            .get(name)
            .cloned()
            .ok_or_else(|| DomainError::not_found("session", name))
    }

    /// Names of all active sessions, sorted.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the registry lock is
    /// poisoned.
    pub fn active_names(&self) -> Result<Vec<String>, DomainError> {
        let mut names: Vec<String> = self.read()?.active.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Ids of all archived results, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the registry lock is
    /// poisoned.
    pub fn archive_ids(&self) -> Result<Vec<String>, DomainError> {
        let inner = self.read()?;
        let mut entries: Vec<&Arc<ArchivedResult>> = inner.archived.values().collect();
        entries.sort_by(|a, b| a.ended_at.cmp(&b.ended_at).then_with(|| a.id.cmp(&b.id)));
        Ok(entries.into_iter().map(|a| a.id.clone()).collect())
    }

    /// Looks up an archived result by id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if no archive has that id.
    pub fn archived(&self, id: &str) -> Result<Arc<ArchivedResult>, DomainError> {
        self.read()?
            .archived
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("archive", id))
    }

    /// Removes the session `name` from the active set and stores its
    /// archived result, in one step.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the registry lock is
    /// poisoned.
    pub fn retire(
        &self,
        name: &str,
        result: ArchivedResult,
    ) -> Result<Arc<ArchivedResult>, DomainError> {
        let result = Arc::new(result);
        let mut inner = self.write()?;
        if inner.active.remove(name).is_none() {
            warn!(session = name, "retiring a session that was not active");
        }
        inner.archived.insert(result.id.clone(), Arc::clone(&result));
        info!(
            session = name,
            archive_id = %result.id,
            "session archived"
        );
        Ok(result)
    }

    /// Stops accepting new sessions. Returns the number of sessions that
    /// were still active.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the registry lock is
    /// poisoned.
    pub fn shutdown(&self) -> Result<usize, DomainError> {
        let mut inner = self.write()?;
        inner.accepting = false;
        Ok(inner.active.len())
    }
}
