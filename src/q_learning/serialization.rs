//! Persisted envelope for a learned Q-table.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, q_learning::q_table::QTable};

/// Training context stored alongside the table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Episodes completed across every run that contributed to the table
    pub episodes_trained: Option<usize>,
    /// Exploration rate at save time
    pub epsilon: Option<f64>,
    /// Target angle the table was trained toward
    pub target_degrees: Option<f64>,
    /// RFC 3339 timestamp when saved
    pub saved_at: Option<String>,
}

impl TableMetadata {
    /// Stamp `saved_at` with the current UTC time.
    pub fn stamped(mut self) -> Self {
        self.saved_at = Some(chrono::Utc::now().to_rfc3339());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedQTable {
    pub version: u32,
    pub n_states: usize,
    pub n_actions: usize,
    pub values: Vec<f64>,
    pub metadata: TableMetadata,
}

impl SavedQTable {
    pub const VERSION: u32 = 1;

    pub fn from_table(table: &QTable, metadata: TableMetadata) -> Self {
        Self {
            version: Self::VERSION,
            n_states: table.n_states(),
            n_actions: table.n_actions(),
            values: table.values().to_vec(),
            metadata,
        }
    }

    pub fn to_table(&self) -> Result<QTable> {
        if self.version != Self::VERSION {
            return Err(Error::SerializationContext {
                operation: "decode saved Q-table".to_string(),
                message: format!(
                    "unsupported format version {}, expected {}",
                    self.version,
                    Self::VERSION
                ),
            });
        }
        QTable::from_values(self.n_states, self.n_actions, self.values.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msgpack_envelope_roundtrip() -> Result<()> {
        let mut table = QTable::zeros(10, 3);
        table.update(5, 2, -0.4, 6, 0.2, 0.9);
        table.update(6, 0, -0.1, 5, 0.2, 0.9);

        let metadata = TableMetadata {
            episodes_trained: Some(12),
            epsilon: Some(0.18),
            target_degrees: Some(45.0),
            saved_at: None,
        }
        .stamped();
        let saved = SavedQTable::from_table(&table, metadata.clone());

        let bytes = rmp_serde::to_vec(&saved).map_err(|e| Error::SerializationContext {
            operation: "encode".to_string(),
            message: e.to_string(),
        })?;
        let loaded: SavedQTable =
            rmp_serde::from_slice(&bytes).map_err(|e| Error::SerializationContext {
                operation: "decode".to_string(),
                message: e.to_string(),
            })?;

        assert_eq!(loaded.metadata, metadata);
        assert_eq!(loaded.to_table()?, table);
        Ok(())
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut saved = SavedQTable::from_table(&QTable::zeros(2, 2), TableMetadata::default());
        saved.version = 7;
        assert!(saved.to_table().is_err());
    }

    #[test]
    fn test_rejects_inconsistent_value_count() {
        let mut saved = SavedQTable::from_table(&QTable::zeros(2, 2), TableMetadata::default());
        saved.values.pop();
        assert!(saved.to_table().is_err());
    }
}
