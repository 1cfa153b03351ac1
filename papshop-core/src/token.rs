//! Persistent bearer token storage
//!
//! The console keeps exactly one piece of durable session data: the raw
//! token string. Nothing is cached in memory by the file store, so every
//! read goes back to disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

/// File name of the persisted token inside the data directory
pub const TOKEN_FILE: &str = "token";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Token storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data directory not found")]
    NoDirFound,
}

/// Single-slot token storage
pub trait TokenStore: Send + Sync {
    /// Persisted token, or `None` if absent
    fn get(&self) -> Result<Option<String>, StoreError>;

    /// Persist `token`, replacing any previous value
    fn set(&self, token: &str) -> Result<(), StoreError>;

    /// Remove the token. Clearing an absent token is not an error.
    fn clear(&self) -> Result<(), StoreError>;

    /// Whether a token is present. Read failures count as absent.
    fn has_token(&self) -> bool {
        match self.get() {
            Ok(token) => token.is_some(),
            Err(e) => {
                tracing::warn!("Failed to read token: {}", e);
                false
            }
        }
    }
}

/// Token stored in a file under the platform data directory
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<data dir>/papshop/token`
    pub fn default_location() -> Result<Self, StoreError> {
        let dir = dirs::data_dir()
            .map(|p| p.join("papshop"))
            .ok_or(StoreError::NoDirFound)?;
        Ok(Self::new(dir.join(TOKEN_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                let found = !token.is_empty();
                tracing::debug!("Checking token: {}", if found { "exists" } else { "not found" });
                Ok(found.then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Checking token: not found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local store, for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // The slot is a plain value, so a poisoned lock still holds valid data.
        self.token.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<String>, StoreError> {
        Ok(self.slot().clone())
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        *self.slot() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join(TOKEN_FILE));

        assert_eq!(store.get().unwrap(), None);

        store.set("abc.def.ghi").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("abc.def.ghi"));

        // A second handle sees the same value: nothing is cached
        let other = FileTokenStore::new(store.path());
        assert_eq!(other.get().unwrap().as_deref(), Some("abc.def.ghi"));

        other.set("new.token.value").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("new.token.value"));
    }

    #[test]
    fn test_file_store_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join(TOKEN_FILE));

        store.set("abc.def.ghi").unwrap();
        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);

        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_blank_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TOKEN_FILE);
        std::fs::write(&path, "  \n").unwrap();

        let store = FileTokenStore::new(path);
        assert_eq!(store.get().unwrap(), None);
        assert!(!store.has_token());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::new();
        assert!(!store.has_token());

        store.set("t.o.k").unwrap();
        assert!(store.has_token());

        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);
    }
}
