//! Persisted login session (token, role, username).
//!
//! Front-ends hold a [`Session`] value and hand a [`SessionStore`] to the
//! dashboard so the persistence strategy can be swapped out in tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use onesid_core::Role;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::StoreError;

const SESSION_DIR: &str = "onesid";
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub username: Option<String>,
}

impl Session {
    /// A session counts as present once the backend has told us the role.
    pub fn is_authenticated(&self) -> bool {
        self.role.is_some()
    }

    pub fn role(&self) -> Role {
        self.role.unwrap_or_default()
    }
}

/// Load/save strategy for the session.
pub trait SessionStore: Send + Sync {
    /// `Ok(None)` when nothing was saved yet.
    fn load(&self) -> Result<Option<Session>, StoreError>;
    fn save(&self, session: &Session) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// JSON file on disk, by default `<config dir>/onesid/session.json`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Result<Self, StoreError> {
        let dir = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
        Ok(Self::new(dir.join(SESSION_DIR).join(SESSION_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no saved session");
                return Ok(None);
            }
            Err(e) => return Err(self.io_err(e)),
        };
        let session: Session = serde_json::from_slice(&bytes)?;
        Ok(Some(session))
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let json = serde_json::to_vec_pretty(session)?;
        std::fs::write(&self.path, json).map_err(|e| self.io_err(e))?;
        info!(path = %self.path.display(), "session saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

/// Process-local store, used by tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            inner: Mutex::new(Some(session)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<Session>>, StoreError> {
        self.inner
            .lock()
            .map_err(|e| StoreError::Other(format!("mutex poisoned: {e}")))
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        *self.lock()? = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.lock()? = None;
        Ok(())
    }
}
