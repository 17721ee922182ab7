//! Persisted sign-in session.
//!
//! The session holder owns the signed-in user's record and the login form's
//! inline error message. The record lives in two places with different
//! lifetimes: in memory for the current page, and under [`SESSION_KEY`] in
//! a client-side key-value store across restarts. The store is read once at
//! construction and written on successful sign-in; sign-out clears memory
//! only, so a restart resurrects the session until the stored entry is
//! removed explicitly.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::instrument;

use crate::api::{ApiError, SignInOutcome, StoreClient};
use crate::models::{Credentials, SessionRecord, UserProfile};

/// Store key holding the serialized [`SessionRecord`].
pub const SESSION_KEY: &str = "vitrine:session";

// =============================================================================
// Key-value store
// =============================================================================

/// Errors from the persisted key-value store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure reading or writing the store file.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store file exists but could not be parsed as a JSON object.
    #[error("store file corrupt: {0}")]
    Corrupt(String),
}

/// Client-side persisted key-value store.
///
/// The narrow surface the session holder needs: string keys to string
/// values, synchronous, no schema. [`FileStore`] persists to a single JSON
/// object file; [`MemoryStore`] backs tests and ephemeral embedders.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value under `key`, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying storage cannot be written.
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Deletes the value under `key`. Absent keys are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// [`KeyValueStore`] backed by a single JSON object file.
///
/// The whole store is one `{ "key": "value" }` object. Writes go through a
/// temp file and a rename, so a crash mid-write cannot leave a truncated
/// store behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store over `path`. The file and its parent directories are
    /// created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> Result<serde_json::Map<String, serde_json::Value>, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(serde_json::Map::new());
            }
            Err(e) => return Err(StoreError::Io(e)),
        };
        let value: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        match value {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(StoreError::Corrupt(
                "expected a top-level JSON object".to_owned(),
            )),
        }
    }

    fn write_map(&self, map: &serde_json::Map<String, serde_json::Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let bytes = serde_json::to_vec_pretty(map).map_err(std::io::Error::from)?;
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, &bytes)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let map = self.read_map()?;
        Ok(map
            .get(key)
            .and_then(serde_json::Value::as_str)
            .map(ToOwned::to_owned))
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        // A corrupt store file is overwritten, not preserved.
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(StoreError::Corrupt(_)) => serde_json::Map::new(),
            Err(e) => return Err(e),
        };
        map.insert(key.to_owned(), serde_json::Value::String(value.to_owned()));
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

/// In-memory [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock_entries().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock_entries().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock_entries().remove(key);
        Ok(())
    }
}

// =============================================================================
// Session holder
// =============================================================================

/// Errors surfaced by [`Session::sign_in`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The request never produced a usable response.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The backend rejected the credentials; the message is what the login
    /// form displays inline.
    #[error("sign-in rejected: {0}")]
    Rejected(String),
}

/// Holder of the signed-in user's session.
///
/// Cheaply cloneable; all clones share one state. The persisted record is
/// loaded once at construction and written back on every successful
/// sign-in. [`Session::sign_out`] clears memory only: the stored record
/// deliberately survives, so the next construction over the same store
/// starts signed in again. Embedders that want a full sign-out remove
/// [`SESSION_KEY`] from the store themselves.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: StoreClient,
    store: Box<dyn KeyValueStore>,
    persist_rejected_sign_in: bool,
    state: Mutex<SessionState>,
    user_tx: watch::Sender<Option<UserProfile>>,
}

#[derive(Default)]
struct SessionState {
    record: Option<SessionRecord>,
    /// Inline error shown by the login form. Set on rejection, replaced by
    /// later rejections, cleared only by a successful sign-in.
    last_error: Option<String>,
}

impl Session {
    /// Creates the holder, loading any persisted record from `store`.
    ///
    /// A missing entry means signed out. An unreadable or undeserializable
    /// entry is logged and treated as absent rather than failing startup.
    #[must_use]
    pub fn new(
        client: StoreClient,
        store: Box<dyn KeyValueStore>,
        persist_rejected_sign_in: bool,
    ) -> Self {
        let record = load_record(store.as_ref());
        let user = record.as_ref().map(|r| r.user.clone());
        let (user_tx, _) = watch::channel(user);

        Self {
            inner: Arc::new(SessionInner {
                client,
                store,
                persist_rejected_sign_in,
                state: Mutex::new(SessionState {
                    record,
                    last_error: None,
                }),
                user_tx,
            }),
        }
    }

    /// Signs in against the backend.
    ///
    /// On success the record is persisted, held in memory, and the inline
    /// error is cleared. On rejection the inline error is set and the
    /// session is otherwise untouched, unless `persist_rejected_sign_in`
    /// was enabled at construction, in which case the raw response body
    /// still overwrites the stored entry. Transport failures change
    /// nothing.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Rejected`] when the backend answered with an
    ///   `error` body.
    /// - [`SessionError::Api`] when the request itself failed.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<SessionRecord, SessionError> {
        match self.inner.client.create_session(credentials).await? {
            SignInOutcome::Accepted(record) => {
                self.persist_record(&record);

                let mut state = self.lock_state();
                state.record = Some(record.clone());
                state.last_error = None;
                self.inner.user_tx.send_replace(Some(record.user.clone()));
                drop(state);

                Ok(record)
            }
            SignInOutcome::Rejected { message, body } => {
                if self.inner.persist_rejected_sign_in {
                    // Legacy mode: the rejected body overwrites the stored
                    // record, even though it will not load as one.
                    if let Err(error) = self.inner.store.put(SESSION_KEY, &body.to_string()) {
                        tracing::warn!(%error, "failed to persist rejected sign-in body");
                    }
                }

                self.lock_state().last_error = Some(message.clone());
                Err(SessionError::Rejected(message))
            }
        }
    }

    /// Signs out in memory only.
    ///
    /// The persisted record is kept; see the type-level docs.
    pub fn sign_out(&self) {
        let mut state = self.lock_state();
        state.record = None;
        self.inner.user_tx.send_replace(None);
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.lock_state().record.as_ref().map(|r| r.user.clone())
    }

    /// The full session record, if signed in.
    #[must_use]
    pub fn record(&self) -> Option<SessionRecord> {
        self.lock_state().record.clone()
    }

    /// The inline sign-in error currently displayed, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.lock_state().last_error.clone()
    }

    /// Subscribes to sign-in state changes.
    ///
    /// The receiver starts at the current user and is notified on sign-in
    /// and sign-out.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<UserProfile>> {
        self.inner.user_tx.subscribe()
    }

    fn persist_record(&self, record: &SessionRecord) {
        match serde_json::to_string(record) {
            Ok(raw) => {
                if let Err(error) = self.inner.store.put(SESSION_KEY, &raw) {
                    tracing::warn!(%error, "failed to persist session record");
                }
            }
            Err(error) => {
                tracing::warn!(%error, "failed to serialize session record");
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Reads and parses the persisted record, treating every failure as
/// signed out.
fn load_record(store: &dyn KeyValueStore) -> Option<SessionRecord> {
    let raw = match store.get(SESSION_KEY) {
        Ok(raw) => raw?,
        Err(error) => {
            tracing::warn!(%error, "failed to read persisted session, starting signed out");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(record) => Some(record),
        Err(error) => {
            tracing::warn!(%error, "persisted session is not a valid record, starting signed out");
            None
        }
    }
}
