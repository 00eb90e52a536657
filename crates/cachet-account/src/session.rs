//! Active-identity session state.
//!
//! The identity slot is held behind an `Arc<Mutex<Option<ActiveIdentity>>>`:
//! - `None` before any successful unseal and after [`SessionContext::clear`]
//! - `Some(identity)` from the moment a flow unseals a profile
//!
//! The context is an explicit, owned handle rather than an ambient global:
//! whoever guards the authenticated surface holds a clone and decides when
//! to clear it. The slot is single-writer per flow completion; if two login
//! attempts race, the last successful unseal wins — an accepted,
//! non-critical race in a single-user client. Identities live only in this
//! process memory and are never persisted.

use crate::profile::ProfileRecord;
use std::sync::{Arc, Mutex};

/// The identity a successful unseal produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveIdentity {
    /// The decrypted profile record.
    pub profile: ProfileRecord,
}

/// Shared handle to the process-wide active-identity slot.
///
/// Cheap to clone; all clones observe the same slot.
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    inner: Arc<Mutex<Option<ActiveIdentity>>>,
}

impl SessionContext {
    /// A context with no active identity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a freshly unsealed profile as the active identity,
    /// replacing any previous one.
    pub fn replace(&self, profile: ProfileRecord) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = Some(ActiveIdentity { profile });
        }
    }

    /// Clear the active identity (logout, navigation away).
    pub fn clear(&self) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = None;
        }
    }

    /// A snapshot of the current identity, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<ActiveIdentity> {
        self.inner.lock().ok().and_then(|slot| slot.clone())
    }

    /// Whether an identity is currently set.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.lock().is_ok_and(|slot| slot.is_some())
    }
}
