//! JSON-file session store.
//!
//! Plays the role browser local storage plays for a web storefront: the
//! session outlives the process. Writes go to a temp file in the same
//! directory and are renamed over the target, so a crash never leaves a
//! half-written session behind.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tempfile::NamedTempFile;
use tracing::debug;

use super::{Session, SessionStore, SessionStoreError, StoredSession};

/// Session file permissions on unix (owner read/write only).
#[cfg(unix)]
const SESSION_FILE_MODE: u32 = 0o600;

/// Persists the session as JSON at a fixed path.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    /// Serializes writers within this process.
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    /// A store backed by `path`. Nothing is touched until the first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, SessionStoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let stored: StoredSession = serde_json::from_slice(&bytes)?;
        Ok(Some(stored.into()))
    }

    fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let parent = self.parent_dir();
        std::fs::create_dir_all(parent)?;

        let bytes = serde_json::to_vec_pretty(&StoredSession::from(session))?;
        let mut tmp = NamedTempFile::new_in(parent)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(
                tmp.path(),
                std::fs::Permissions::from_mode(SESSION_FILE_MODE),
            )?;
        }
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| err.error)?;

        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session cleared");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
