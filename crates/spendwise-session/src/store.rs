//! Session persistence.
//!
//! A [`TokenStore`] is a small synchronous key-value store holding at most
//! one [`Session`]. Two implementations ship with the crate:
//!
//! - [`MemoryTokenStore`]: process memory only; tests and throwaway clients.
//! - [`FileTokenStore`]: a JSON document on disk with the keys
//!   `accessToken`, `refreshToken` and `user`, so a login survives restarts.
//!
//! # Atomicity
//!
//! Stores never hand out half a session. `set` and `clear` replace all three
//! keys together; `set_access_token` is the only partial write and it
//! refuses to run when no session exists.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use spendwise_protocol::UserRecord;

use crate::{Session, StoreError};

/// Persisted key for the access token.
const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Persisted key for the refresh token.
const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Persisted key for the serialized user.
const USER_KEY: &str = "user";

/// Durable storage for the current session.
///
/// All methods are synchronous and never touch the network. Read-modify-write
/// sequences are serialized inside each implementation; callers never need
/// their own lock.
pub trait TokenStore: Send + Sync + 'static {
    /// Returns the stored session, or `None` if there isn't a complete one.
    fn get(&self) -> Result<Option<Session>, StoreError>;

    /// Replaces the stored session as a unit.
    fn set(&self, session: &Session) -> Result<(), StoreError>;

    /// Removes the stored session. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), StoreError>;

    /// Replaces only the access token of the existing session.
    ///
    /// # Errors
    /// Returns [`StoreError::NoSession`] if nothing is stored.
    fn set_access_token(&self, token: &str) -> Result<(), StoreError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic mid-write cannot leave a partial session in either store, so
    // the data behind a poisoned lock is still consistent.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// MemoryTokenStore
// ---------------------------------------------------------------------------

/// A [`TokenStore`] that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    session: Mutex<Option<Session>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `session`.
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<Session>, StoreError> {
        Ok(lock(&self.session).clone())
    }

    fn set(&self, session: &Session) -> Result<(), StoreError> {
        *lock(&self.session) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *lock(&self.session) = None;
        Ok(())
    }

    fn set_access_token(&self, token: &str) -> Result<(), StoreError> {
        let mut slot = lock(&self.session);
        let session = slot.as_mut().ok_or(StoreError::NoSession)?;
        session.access_token = token.to_string();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileTokenStore
// ---------------------------------------------------------------------------

/// A [`TokenStore`] backed by a JSON document on disk.
///
/// The document is a flat string-to-string map, mirroring a browser's
/// local storage:
///
/// ```json
/// {
///   "accessToken": "eyJ...",
///   "refreshToken": "eyJ...",
///   "user": "{\"id\":1,\"username\":\"alice\"}"
/// }
/// ```
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash mid-write leaves either the old document or the new one. On
/// Unix the file is created with mode `0600`.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    /// Serializes read-modify-write within this process.
    guard: Mutex<()>,
}

type Document = BTreeMap<String, String>;

impl FileTokenStore {
    /// Creates a store at `path`. Nothing is read or written until the
    /// first operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// `<config dir>/spendwise/session.json`, falling back to the working
    /// directory when the platform has no config dir.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("spendwise")
            .join("session.json")
    }

    /// The file this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, err: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            message: err.to_string(),
        }
    }

    fn read_document(&self) -> Result<Option<Document>, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };
        let doc = serde_json::from_slice::<Document>(&bytes)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(Some(doc))
    }

    fn write_document(&self, doc: &Document) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| self.io_error(e))?;
            }
        }

        let bytes = serde_json::to_vec_pretty(doc)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        let mut file = open_private(&tmp).map_err(|e| self.io_error(e))?;
        file.write_all(&bytes).map_err(|e| self.io_error(e))?;
        file.sync_all().map_err(|e| self.io_error(e))?;
        drop(file);

        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }

    /// Turns a raw document into a session, or `None` if any key is
    /// missing.
    fn session_from(&self, doc: &Document) -> Result<Option<Session>, StoreError> {
        let access = doc.get(ACCESS_TOKEN_KEY);
        let refresh = doc.get(REFRESH_TOKEN_KEY);
        let user = doc.get(USER_KEY);

        match (access, refresh, user) {
            (Some(access), Some(refresh), Some(user)) => {
                let user: UserRecord = serde_json::from_str(user)
                    .map_err(|e| StoreError::Corrupt(format!("user: {e}")))?;
                Ok(Some(Session {
                    access_token: access.clone(),
                    refresh_token: refresh.clone(),
                    user,
                }))
            }
            (None, None, None) => Ok(None),
            _ => {
                tracing::warn!(
                    path = %self.path.display(),
                    "ignoring partial session document"
                );
                Ok(None)
            }
        }
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<std::fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<std::fs::File> {
    std::fs::File::create(path)
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<Session>, StoreError> {
        let _guard = lock(&self.guard);
        match self.read_document()? {
            Some(doc) => self.session_from(&doc),
            None => Ok(None),
        }
    }

    fn set(&self, session: &Session) -> Result<(), StoreError> {
        let _guard = lock(&self.guard);
        let user = serde_json::to_string(&session.user)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let mut doc = Document::new();
        doc.insert(ACCESS_TOKEN_KEY.into(), session.access_token.clone());
        doc.insert(REFRESH_TOKEN_KEY.into(), session.refresh_token.clone());
        doc.insert(USER_KEY.into(), user);
        self.write_document(&doc)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = lock(&self.guard);
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn set_access_token(&self, token: &str) -> Result<(), StoreError> {
        let _guard = lock(&self.guard);
        let mut doc = self.read_document()?.ok_or(StoreError::NoSession)?;
        if self.session_from(&doc)?.is_none() {
            return Err(StoreError::NoSession);
        }
        doc.insert(ACCESS_TOKEN_KEY.into(), token.to_string());
        self.write_document(&doc)
    }
}
