use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::StorageError;
use crate::model::UserId;

/// On-disk session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredSession {
    user_id: UserId,
}

/// Remembers the logged-in user id between runs.
///
/// Only the id is kept; authentication itself rides on the HTTP client's
/// cookies and is never written here.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Creates a store backed by the JSON file at `path`.
    ///
    /// The parent directory is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the remembered user id, or `None` if nobody is logged in.
    pub fn load(&self) -> Result<Option<UserId>, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let session: StoredSession = serde_json::from_str(&text)?;
        Ok(Some(session.user_id))
    }

    /// Persists `user_id` as the logged-in user.
    pub fn save(&self, user_id: &UserId) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let session = StoredSession {
            user_id: user_id.clone(),
        };
        fs::write(&self.path, serde_json::to_vec(&session)?)?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Forgets the logged-in user. Clearing an absent session is not an error.
    pub fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
