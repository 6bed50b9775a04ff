//! MessagePack implementation of the Q-table repository.
//!
//! This adapter implements the QTableRepository port using rmp_serde for
//! compact binary serialization.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use crate::{
    Result,
    adapters::scratch_path,
    error::Error,
    ports::QTableRepository,
    q_learning::{QTable, SavedQTable, TableMetadata},
};

/// MessagePack-based Q-table repository.
///
/// Saves go through a sibling `<name>.tmp` file that is renamed into place, so an
/// interrupted save leaves the previous table intact.
///
/// # Examples
///
/// ```no_run
/// use jointq::adapters::MsgPackRepository;
/// use jointq::ports::QTableRepository;
/// use jointq::q_learning::{QTable, TableMetadata};
/// use std::path::Path;
///
/// let repo = MsgPackRepository;
/// let table = QTable::zeros(100, 5);
///
/// repo.save(&table, &TableMetadata::default(), Path::new("qtable.msgpack"))?;
/// let loaded = repo.load(Path::new("qtable.msgpack"))?;
/// # Ok::<(), jointq::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackRepository;

impl MsgPackRepository {
    /// Create a new MessagePack repository.
    pub fn new() -> Self {
        Self
    }
}

impl QTableRepository for MsgPackRepository {
    fn save(&self, table: &QTable, metadata: &TableMetadata, path: &Path) -> Result<()> {
        let saved = SavedQTable::from_table(table, metadata.clone());
        let tmp_path = scratch_path(path);

        let file = File::create(&tmp_path).map_err(|source| Error::Io {
            operation: format!("create file {tmp_path:?}"),
            source,
        })?;
        let mut writer = BufWriter::new(file);

        rmp_serde::encode::write(&mut writer, &saved).map_err(|e| {
            Error::SerializationContext {
                operation: "serialize Q-table to MessagePack".to_string(),
                message: e.to_string(),
            }
        })?;
        writer.flush().map_err(|source| Error::Io {
            operation: format!("flush file {tmp_path:?}"),
            source,
        })?;

        fs::rename(&tmp_path, path).map_err(|source| Error::Io {
            operation: format!("move {tmp_path:?} to {path:?}"),
            source,
        })?;

        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedQTable> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;

        let saved = rmp_serde::decode::from_read(BufReader::new(file)).map_err(|e| {
            Error::SerializationContext {
                operation: "deserialize Q-table from MessagePack".to_string(),
                message: e.to_string(),
            }
        })?;

        Ok(saved)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
