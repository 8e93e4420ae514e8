use std::sync::Arc;

use arc_swap::ArcSwap;

use super::decoder;
use super::identity::Identity;
use super::store::{CredentialStore, StoreError, TOKEN_KEY};

/// Point-in-time view of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    pub loading: bool,
}

impl SessionSnapshot {
    pub fn signed_out() -> Self {
        Self {
            identity: None,
            loading: false,
        }
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            loading: false,
        }
    }

    pub fn loading() -> Self {
        Self {
            identity: None,
            loading: true,
        }
    }
}

/// Session context shared by the controller, guards and screens.
///
/// Built once at startup and handed out as `Arc<Session>`. Readers take
/// lock-free snapshots; only the controller and the decoder write.
pub struct Session {
    state: ArcSwap<SessionSnapshot>,
    store: Arc<dyn CredentialStore>,
}

impl Session {
    /// Starts in the loading state until [`Session::restore`] runs.
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            state: ArcSwap::from_pointee(SessionSnapshot::loading()),
            store,
        }
    }

    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.state.load_full()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.load().identity.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.load().loading
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Stored credential, if any. Read failures count as "none".
    pub fn credential(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Failed to read stored credential: {}", e);
                None
            }
        }
    }

    /// Decode the stored credential and publish the result.
    pub fn restore(&self) -> SessionSnapshot {
        self.begin_loading();
        let snapshot = decoder::resolve(self.store.as_ref());
        self.state.store(Arc::new(snapshot.clone()));
        snapshot
    }

    pub(crate) fn begin_loading(&self) {
        let identity = self.identity();
        self.state.store(Arc::new(SessionSnapshot {
            identity,
            loading: true,
        }));
    }

    /// Publish `identity` and clear the loading flag.
    pub(crate) fn set_identity(&self, identity: Option<Identity>) {
        self.state.store(Arc::new(SessionSnapshot {
            identity,
            loading: false,
        }));
    }

    pub(crate) fn persist_credential(&self, token: &str) -> Result<(), StoreError> {
        self.store.set(TOKEN_KEY, token)
    }

    /// Drop the identity and purge the stored credential.
    pub(crate) fn clear(&self) -> Result<(), StoreError> {
        self.set_identity(None);
        self.store.remove(TOKEN_KEY)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemoryStore;

    #[test]
    fn test_new_session_is_loading() {
        let session = Session::new(Arc::new(MemoryStore::new()));
        assert!(session.is_loading());
        assert!(session.identity().is_none());
    }

    #[test]
    fn test_restore_without_credential() {
        let session = Session::new(Arc::new(MemoryStore::new()));
        let snapshot = session.restore();

        assert_eq!(snapshot, SessionSnapshot::signed_out());
        assert!(!session.is_loading());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = Arc::new(MemoryStore::with_token("x.y.z"));
        let session = Session::new(store.clone());

        session.clear().unwrap();
        session.clear().unwrap();

        assert!(session.identity().is_none());
        assert!(!session.is_loading());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }
}
