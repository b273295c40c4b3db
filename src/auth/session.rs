use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::storage::KeyValueStore;
use crate::error::{ClientError, ClientResult};

/// Default key the token is persisted under.
pub const DEFAULT_STORAGE_KEY: &str = "@SafeClass:token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    token: Option<String>,
    loading: bool,
}

impl SessionState {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_signed(&self) -> bool {
        self.token.is_some()
    }

    /// True until the persisted token has been restored.
    pub fn is_loading(&self) -> bool {
        self.loading
    }
}

/// Holds the current bearer token in memory and mirrors it to persistent
/// storage.
///
/// Observers call [`SessionStore::subscribe`] and are notified on every state
/// transition. A sign-out is a single transition no matter how many times
/// [`SessionStore::sign_out`] runs.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    key: String,
    state: watch::Sender<SessionState>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let (state, _) = watch::channel(SessionState {
            token: None,
            loading: true,
        });
        Self {
            storage,
            key: key.into(),
            state,
        }
    }

    /// Load the persisted token, if any, and end the loading phase.
    ///
    /// Returns whether a session was restored. An unreadable store is logged
    /// and treated as signed out.
    pub async fn restore(&self) -> bool {
        let stored = match self.storage.get(&self.key).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!("Could not read persisted session: {}", e);
                None
            }
        };

        let restored = stored.is_some();
        self.state.send_modify(|state| {
            if stored.is_some() {
                state.token = stored;
            }
            state.loading = false;
        });

        if restored {
            tracing::info!("Restored persisted session");
        } else {
            tracing::debug!("No persisted session found");
        }
        restored
    }

    /// Wait until [`SessionStore::restore`] has completed.
    pub async fn ready(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so this only returns once loading ends.
        let _ = rx.wait_for(|state| !state.loading).await;
    }

    /// Persist `token` and make it the active token.
    ///
    /// On a storage failure the in-memory state is left untouched.
    pub async fn sign_in(&self, token: &str) -> ClientResult<()> {
        self.storage
            .set(&self.key, token)
            .await
            .map_err(ClientError::StorageWrite)?;

        self.state.send_modify(|state| {
            state.token = Some(token.to_string());
            state.loading = false;
        });
        tracing::info!("Signed in");
        Ok(())
    }

    /// Forget the token in memory and in storage. Safe to call repeatedly.
    pub async fn sign_out(&self) {
        let changed = self.state.send_if_modified(|state| state.token.take().is_some());

        if let Err(e) = self.storage.remove(&self.key).await {
            tracing::warn!("Could not remove persisted session: {}", e);
        }
        if changed {
            tracing::info!("Signed out");
        }
    }

    /// Sign out only if `token` is still the active token.
    ///
    /// Returns whether the session ended. A token replaced by a later
    /// `sign_in` is left alone.
    pub async fn expire(&self, token: &str) -> bool {
        let expired = self.state.send_if_modified(|state| {
            if state.token.as_deref() == Some(token) {
                state.token = None;
                true
            } else {
                false
            }
        });

        if expired {
            if let Err(e) = self.storage.remove(&self.key).await {
                tracing::warn!("Could not remove persisted session: {}", e);
            }
            tracing::info!("Session expired");
        }
        expired
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    pub fn is_signed(&self) -> bool {
        self.state.borrow().is_signed()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::storage::{FileStore, MemoryStore};

    fn store_with(storage: Arc<dyn KeyValueStore>) -> SessionStore {
        SessionStore::new(storage, DEFAULT_STORAGE_KEY)
    }

    #[tokio::test]
    async fn starts_loading_and_signed_out() {
        let session = store_with(Arc::new(MemoryStore::new()));
        assert!(session.is_loading());
        assert!(!session.is_signed());

        assert!(!session.restore().await);
        assert!(!session.is_loading());
        assert!(!session.is_signed());
    }

    #[tokio::test]
    async fn sign_in_persists_token() {
        let storage = Arc::new(MemoryStore::new());
        let session = store_with(storage.clone());

        session.sign_in("abc").await.unwrap();
        assert!(session.is_signed());
        assert_eq!(session.token().as_deref(), Some("abc"));
        assert_eq!(
            storage.get(DEFAULT_STORAGE_KEY).await.unwrap().as_deref(),
            Some("abc")
        );
    }

    #[tokio::test]
    async fn sign_out_clears_memory_and_storage_and_is_idempotent() {
        let storage = Arc::new(MemoryStore::new());
        let session = store_with(storage.clone());
        session.sign_in("abc").await.unwrap();

        session.sign_out().await;
        assert!(!session.is_signed());
        assert_eq!(storage.get(DEFAULT_STORAGE_KEY).await.unwrap(), None);

        session.sign_out().await;
        assert!(!session.is_signed());
    }

    #[tokio::test]
    async fn restore_picks_up_token_from_previous_process() {
        let tmp = tempfile::tempdir().unwrap();

        let first = store_with(Arc::new(FileStore::in_dir(tmp.path())));
        first.sign_in("persisted").await.unwrap();
        drop(first);

        let second = store_with(Arc::new(FileStore::in_dir(tmp.path())));
        assert!(second.restore().await);
        assert_eq!(second.token().as_deref(), Some("persisted"));
    }

    #[tokio::test]
    async fn failed_write_leaves_session_signed_out() {
        let tmp = tempfile::tempdir().unwrap();
        // The parent of the storage file is a regular file, so writes fail.
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let session = store_with(Arc::new(FileStore::new(blocker.join("storage.json"))));

        let err = session.sign_in("abc").await.unwrap_err();
        assert!(matches!(err, ClientError::StorageWrite(_)));
        assert!(!session.is_signed());
    }

    #[tokio::test]
    async fn sign_in_recovers_from_corrupt_storage_file() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = FileStore::in_dir(tmp.path());
        std::fs::write(storage.path(), "{garbage").unwrap();
        let session = store_with(Arc::new(storage));

        assert!(!session.restore().await);
        session.sign_in("abc").await.unwrap();
        assert!(session.is_signed());

        let reopened = store_with(Arc::new(FileStore::in_dir(tmp.path())));
        assert!(reopened.restore().await);
        assert_eq!(reopened.token().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn expire_ignores_replaced_token() {
        let storage = Arc::new(MemoryStore::new());
        let session = store_with(storage.clone());
        session.sign_in("old").await.unwrap();
        session.sign_in("new").await.unwrap();

        assert!(!session.expire("old").await);
        assert_eq!(session.token().as_deref(), Some("new"));
        assert_eq!(
            storage.get(DEFAULT_STORAGE_KEY).await.unwrap().as_deref(),
            Some("new")
        );

        assert!(session.expire("new").await);
        assert!(!session.is_signed());
        assert_eq!(storage.get(DEFAULT_STORAGE_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn observers_see_sign_out_once() {
        let session = store_with(Arc::new(MemoryStore::new()));
        session.sign_in("abc").await.unwrap();

        let mut rx = session.subscribe();
        assert!(rx.borrow_and_update().is_signed());

        session.sign_out().await;
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().is_signed());

        session.sign_out().await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn ready_resolves_after_restore() {
        let session = Arc::new(store_with(Arc::new(MemoryStore::new())));
        let waiter = {
            let session = session.clone();
            tokio::spawn(async move { session.ready().await })
        };
        session.restore().await;
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("ready() did not resolve")
            .unwrap();
    }
}
