//! Persistent storage for document text.
//!
//! The core only ever hands a store the text produced by
//! [`to_document_text`](crate::schema::to_document_text) and parses whatever
//! text it returns; where the bytes live is up to the store.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::StoreError;

/// Save and load one document's text.
pub trait DocumentStore {
    /// The stored text, or `None` if nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn load(&self) -> Result<Option<String>, StoreError>;

    /// Replace the stored text.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, text: &str) -> Result<(), StoreError>;
}

/// In-memory store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<RwLock<Option<String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given text.
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(text.into()))),
        }
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        Ok(slot.clone())
    }

    fn save(&self, text: &str) -> Result<(), StoreError> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(text.to_string());
        Ok(())
    }
}

/// One JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store backed by an explicit file path.
    #[must_use]
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for a named document under a data directory, creating the
    /// directory if needed. The file name is the sanitised name plus
    /// `.json`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoDataDirectory`] when no directory is given,
    /// or an I/O error if it cannot be created.
    pub fn in_data_dir(data_dir: Option<&Path>, name: &str) -> Result<Self, StoreError> {
        let data_dir = data_dir.ok_or(StoreError::NoDataDirectory)?;
        std::fs::create_dir_all(data_dir)?;
        Ok(Self::at_path(
            data_dir.join(format!("{}.json", sanitize_filename(name))),
        ))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for FileStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, text: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, text)?;
        tracing::debug!("Saved document to {}", self.path.display());
        Ok(())
    }
}

/// Replace characters unsafe in file names with `_`.
pub(crate) fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
