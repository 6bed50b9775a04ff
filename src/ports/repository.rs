//! Repository port for Q-table persistence.
//!
//! This module defines the trait boundary between the learning core and the
//! storage format, plus the load-or-initialize recovery rule every caller
//! shares.

use std::{path::Path, sync::Arc};

use log::{info, warn};

use crate::{
    Error, Result,
    q_learning::{QTable, SavedQTable, TableMetadata},
};

/// Port for persisting and loading Q-tables.
///
/// # Examples
///
/// ```no_run
/// use jointq::ports::QTableRepository;
/// use jointq::q_learning::{QTable, TableMetadata};
/// use std::path::Path;
///
/// fn checkpoint<R: QTableRepository>(repo: &R, table: &QTable) -> jointq::Result<()> {
///     repo.save(table, &TableMetadata::default(), Path::new("qtable.msgpack"))
/// }
/// ```
pub trait QTableRepository: Send {
    /// Save a table and its metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be written or the table
    /// cannot be encoded.
    fn save(&self, table: &QTable, metadata: &TableMetadata, path: &Path) -> Result<()>;

    /// Load a saved table.
    ///
    /// # Errors
    ///
    /// Returns an error if the location does not exist, cannot be read, or
    /// holds an invalid table.
    fn load(&self, path: &Path) -> Result<SavedQTable>;

    /// Whether something is stored at `path`.
    fn exists(&self, path: &Path) -> bool;
}

impl<R: QTableRepository + Sync + ?Sized> QTableRepository for Arc<R> {
    fn save(&self, table: &QTable, metadata: &TableMetadata, path: &Path) -> Result<()> {
        (**self).save(table, metadata, path)
    }

    fn load(&self, path: &Path) -> Result<SavedQTable> {
        (**self).load(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }
}

/// Result of [`load_or_init`]
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: QTable,
    /// Metadata of the stored table, when one was actually reused
    pub metadata: Option<TableMetadata>,
}

/// Load the table at `path`, falling back to zeros when there is none or it
/// has the wrong shape.
///
/// Any other failure (unreadable or corrupt file) is propagated.
pub fn load_or_init(
    repo: &dyn QTableRepository,
    path: &Path,
    n_states: usize,
    n_actions: usize,
) -> Result<LoadedTable> {
    if !repo.exists(path) {
        info!(
            "No Q-table found at {}; initializing a new ({n_states}, {n_actions}) table",
            path.display()
        );
        return Ok(LoadedTable {
            table: QTable::zeros(n_states, n_actions),
            metadata: None,
        });
    }

    let saved = repo.load(path)?;
    // Checked on the stored dimensions so an empty file counts as a (0, 0) table.
    if (saved.n_states, saved.n_actions) != (n_states, n_actions) {
        let err = Error::ShapeMismatch {
            expected_states: n_states,
            expected_actions: n_actions,
            found_states: saved.n_states,
            found_actions: saved.n_actions,
        };
        warn!("{err} in {}; initializing a new table", path.display());
        return Ok(LoadedTable {
            table: QTable::zeros(n_states, n_actions),
            metadata: None,
        });
    }

    let table = saved.to_table()?;
    info!(
        "Loaded Q-table from {} ({} visited states)",
        path.display(),
        table.visited_states().len()
    );
    Ok(LoadedTable {
        table,
        metadata: Some(saved.metadata),
    })
}
