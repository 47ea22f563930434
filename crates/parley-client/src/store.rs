//! Credential persistence.
//!
//! The store holds at most one [`Credential`]. Reads are served from memory;
//! writes update memory first and then the backing medium, so a failed write
//! still leaves the in-process view correct for the rest of the run.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use parley_core::Credential;
use thiserror::Error;

/// File name of the persisted credential inside the config directory.
const CREDENTIAL_FILE: &str = "credentials.json";

/// Errors from the backing medium.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// Medium could not be read or written
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    /// Stored data could not be decoded
    #[error("credential store corrupt: {0}")]
    Corrupt(String),

    /// Credential with an empty token or username offered for storage
    #[error("refusing to store a credential with an empty token or username")]
    Blank,
}

impl From<io::Error> for PersistenceError {
    fn from(err: io::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Corrupt(err.to_string())
    }
}

/// Durable storage for the signed-in identity.
///
/// Synchronous: the credential is a few bytes and is written only on login
/// and logout.
pub trait CredentialStore: Send {
    /// Stored credential. `None` if nothing is stored or the stored value is
    /// unusable.
    fn get(&self) -> Option<Credential>;

    /// Replace the stored credential.
    ///
    /// # Errors
    ///
    /// - `PersistenceError::Blank` if the credential is blank. Nothing changes.
    /// - `PersistenceError::Unavailable` if the medium rejects the write. The
    ///   value is still returned by subsequent [`Self::get`] calls.
    fn set(&mut self, credential: Credential) -> Result<(), PersistenceError>;

    /// Remove the stored credential.
    ///
    /// # Errors
    ///
    /// - `PersistenceError::Unavailable` if the medium rejects the removal
    fn clear(&mut self) -> Result<(), PersistenceError>;
}

/// In-memory store.
///
/// Used by tests and the simulation harness. [`MemoryCredentialStore::unavailable`]
/// builds a store whose medium rejects every write, for exercising the
/// persistence error paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    credential: Option<Credential>,
    fail_writes: bool,
}

impl MemoryCredentialStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `credential`, as if persisted by an earlier run.
    pub fn with_credential(credential: Credential) -> Self {
        let credential = (!credential.is_blank()).then_some(credential);
        Self { credential, fail_writes: false }
    }

    /// Store whose writes always fail.
    pub fn unavailable() -> Self {
        Self { credential: None, fail_writes: true }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.credential.clone()
    }

    fn set(&mut self, credential: Credential) -> Result<(), PersistenceError> {
        if credential.is_blank() {
            return Err(PersistenceError::Blank);
        }
        self.credential = Some(credential);
        if self.fail_writes {
            return Err(PersistenceError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        self.credential = None;
        if self.fail_writes {
            return Err(PersistenceError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

/// JSON file store.
///
/// The file holds a single object `{"token": "...", "username": "..."}`.
/// Writes go to a sibling temporary file that is then renamed over the
/// original, so a crash never leaves a half-written credential behind.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
    cached: Option<Credential>,
}

impl FileCredentialStore {
    /// Open the store at `path`, loading any existing credential.
    ///
    /// A missing file is an empty store. An unreadable or malformed file is
    /// logged and treated as empty; it is overwritten by the next `set`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cached = match load(&path) {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring stored credential");
                None
            },
        };

        Self { path, cached }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.cached.clone()
    }

    fn set(&mut self, credential: Credential) -> Result<(), PersistenceError> {
        if credential.is_blank() {
            return Err(PersistenceError::Blank);
        }
        let encoded = serde_json::to_vec_pretty(&credential)?;
        self.cached = Some(credential);

        write_atomic(&self.path, &encoded)?;
        tracing::debug!(path = %self.path.display(), "credential saved");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        self.cached = None;

        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "credential removed");
                Ok(())
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Default credential location: `<config dir>/parley/credentials.json`.
///
/// `None` on platforms without a per-user config directory.
pub fn default_credential_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("parley").join(CREDENTIAL_FILE))
}

fn load(path: &Path) -> Result<Option<Credential>, PersistenceError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let credential: Credential = serde_json::from_slice(&bytes)?;
    if credential.is_blank() {
        return Err(PersistenceError::Corrupt("token or username is empty".to_string()));
    }

    Ok(Some(credential))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
