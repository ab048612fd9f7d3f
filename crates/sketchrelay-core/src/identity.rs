//! Identity service abstraction.

use crate::error::DomainError;

/// First-use-binds-secret authentication.
///
/// The first successful call for a name binds `secret` to it; every later
/// call must present the same secret.
pub trait IdentityService: Send + Sync {
    /// Returns `Ok(true)` when the secret matches (or was just bound) and
    /// `Ok(false)` on a mismatch.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank name or secret, and
    /// `DomainError::Infrastructure` if the backing store is unavailable.
    fn authenticate(&self, name: &str, secret: &str) -> Result<bool, DomainError>;
}
