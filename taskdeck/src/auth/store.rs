//! On-disk cache of the signed-in user and bearer token.
//!
//! Credentials are stored as a single JSON document. A missing file means
//! signed out; a file that fails to parse is treated the same way by
//! [`super::AuthProvider::hydrate`].

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use taskdeck_proto::auth::User;

/// Errors that can occur while reading or writing the credential file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The file exists but could not be read.
    #[error("failed to read credentials from {path}: {source}")]
    Read {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file or its directory could not be written.
    #[error("failed to write credentials to {path}: {source}")]
    Write {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file contents are not valid credentials.
    #[error("corrupt credentials file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Persisted user identity and bearer token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Signed-in user.
    pub user: User,
    /// Bearer token.
    pub token: String,
}

impl std::fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// File-backed credential cache.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Creates a store backed by `path`. Nothing is touched until the
    /// first read or write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the credential file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads stored credentials; `Ok(None)` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] on I/O failure or
    /// [`StoreError::Corrupt`] if the file does not parse.
    pub fn load(&self) -> Result<Option<StoredCredentials>, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        if contents.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Writes credentials, creating the parent directory if needed.
    ///
    /// On unix the file is created with owner-only permissions.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] if the directory or file cannot be
    /// written.
    pub fn save(&self, credentials: &StoredCredentials) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let json = serde_json::to_vec_pretty(credentials)?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(write_err)?;
        file.write_all(&json).map_err(write_err)?;
        tracing::debug!(path = %self.path.display(), "credentials saved");
        Ok(())
    }

    /// Removes stored credentials. Removing a missing file succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Write {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}
