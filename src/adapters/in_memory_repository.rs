//! In-memory Q-table repository for testing.
//!
//! This adapter provides a pure in-memory implementation of QTableRepository,
//! enabling fast tests without any file system I/O.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{
    Result,
    error::Error,
    ports::QTableRepository,
    q_learning::{QTable, SavedQTable, TableMetadata},
};

/// In-memory repository for testing.
///
/// Stores encoded tables in a shared HashMap keyed by path. Clones share the
/// same storage, so a test can hand one clone to the training loop and
/// inspect saves through another.
///
/// # Examples
///
/// ```
/// use jointq::adapters::InMemoryRepository;
/// use jointq::ports::QTableRepository;
/// use jointq::q_learning::{QTable, TableMetadata};
/// use std::path::Path;
///
/// let repo = InMemoryRepository::new();
/// repo.save(&QTable::zeros(10, 3), &TableMetadata::default(), Path::new("q"))?;
///
/// let loaded = repo.load(Path::new("q"))?;
/// assert_eq!((loaded.n_states, loaded.n_actions), (10, 3));
/// # Ok::<(), jointq::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    saves: Arc<Mutex<usize>>,
}

impl InMemoryRepository {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn storage(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A poisoned lock only means another test thread panicked mid-save.
        self.storage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get the number of tables currently stored.
    pub fn count(&self) -> usize {
        self.storage().len()
    }

    /// Total number of successful `save` calls, across all keys.
    pub fn save_count(&self) -> usize {
        *self
            .saves
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Clear all stored tables.
    pub fn clear(&self) {
        self.storage().clear();
    }

    /// Store an arbitrary envelope, e.g. one with the wrong shape.
    pub fn insert_saved(&self, path: &Path, saved: &SavedQTable) -> Result<()> {
        let bytes = rmp_serde::to_vec(saved).map_err(|e| Error::SerializationContext {
            operation: "serialize Q-table for in-memory storage".to_string(),
            message: e.to_string(),
        })?;
        self.storage()
            .insert(path.to_string_lossy().to_string(), bytes);
        Ok(())
    }
}

impl QTableRepository for InMemoryRepository {
    fn save(&self, table: &QTable, metadata: &TableMetadata, path: &Path) -> Result<()> {
        self.insert_saved(path, &SavedQTable::from_table(table, metadata.clone()))?;
        *self
            .saves
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) += 1;
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedQTable> {
        let key = path.to_string_lossy().to_string();
        let storage = self.storage();

        let bytes = storage.get(&key).ok_or_else(|| Error::Io {
            operation: format!("load Q-table from in-memory storage at {path:?}"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "key not found in memory"),
        })?;

        rmp_serde::from_slice(bytes).map_err(|e| Error::SerializationContext {
            operation: "deserialize Q-table from in-memory storage".to_string(),
            message: e.to_string(),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.storage()
            .contains_key(path.to_string_lossy().as_ref())
    }
}
