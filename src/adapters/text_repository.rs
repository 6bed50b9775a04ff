//! Tab-delimited text implementation of the Q-table repository.
//!
//! One row per state, one column per action, in the layout numpy's
//! `savetxt` produces. Values are written with Rust's shortest round-trip
//! float formatting, so a save/load cycle reproduces the table exactly.
//! Metadata travels in a `#`-prefixed JSON comment line.

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use crate::{
    Result,
    adapters::scratch_path,
    error::Error,
    ports::QTableRepository,
    q_learning::{QTable, SavedQTable, TableMetadata},
};

const METADATA_PREFIX: &str = "# metadata ";

#[derive(Debug, Clone, Copy, Default)]
pub struct TextRepository;

impl TextRepository {
    pub fn new() -> Self {
        Self
    }

    fn parse(contents: &str) -> Result<SavedQTable> {
        let mut metadata = TableMetadata::default();
        for line in contents.lines() {
            if let Some(json) = line.strip_prefix(METADATA_PREFIX) {
                metadata = serde_json::from_str(json)?;
            }
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .from_reader(contents.as_bytes());

        let mut values = Vec::new();
        let mut n_states = 0;
        let mut n_actions = 0;
        for record in reader.records() {
            let record = record?;
            n_actions = record.len();
            for field in record.iter() {
                let value = field
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| Error::SerializationContext {
                        operation: format!("parse Q-value '{field}' in row {n_states}"),
                        message: e.to_string(),
                    })?;
                values.push(value);
            }
            n_states += 1;
        }

        Ok(SavedQTable {
            version: SavedQTable::VERSION,
            n_states,
            n_actions,
            values,
            metadata,
        })
    }
}

impl QTableRepository for TextRepository {
    fn save(&self, table: &QTable, metadata: &TableMetadata, path: &Path) -> Result<()> {
        let tmp_path = scratch_path(path);
        let file = File::create(&tmp_path).map_err(|source| Error::Io {
            operation: format!("create file {tmp_path:?}"),
            source,
        })?;
        let mut writer = BufWriter::new(file);

        writeln!(
            writer,
            "# jointq q-table v{} shape=({}, {})",
            SavedQTable::VERSION,
            table.n_states(),
            table.n_actions()
        )?;
        writeln!(writer, "{METADATA_PREFIX}{}", serde_json::to_string(metadata)?)?;

        {
            let mut csv_writer = csv::WriterBuilder::new()
                .delimiter(b'\t')
                .has_headers(false)
                .from_writer(&mut writer);
            for state in 0..table.n_states() {
                csv_writer.write_record(table.row(state).iter().map(|v| v.to_string()))?;
            }
            csv_writer.flush()?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp_path, path).map_err(|source| Error::Io {
            operation: format!("move {tmp_path:?} to {path:?}"),
            source,
        })?;
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedQTable> {
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read file {path:?}"),
            source,
        })?;
        Self::parse(&contents)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_text_roundtrip_is_exact() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("qtable.txt");

        let mut table = QTable::zeros(10, 3);
        table.update(5, 2, -0.1234567890123, 6, 0.2, 0.9);
        table.update(6, 1, -1.0 / 3.0, 5, 0.2, 0.9);
        let metadata = TableMetadata {
            episodes_trained: Some(3),
            ..TableMetadata::default()
        };

        TextRepository.save(&table, &metadata, &path).unwrap();
        let loaded = TextRepository.load(&path).unwrap();

        assert_eq!(loaded.n_states, 10);
        assert_eq!(loaded.n_actions, 3);
        assert_eq!(loaded.metadata, metadata);
        assert_eq!(loaded.to_table().unwrap(), table);
    }

    #[test]
    fn test_reads_numpy_style_rows() {
        let contents = "0.0000\t-0.1000\t0.2500\n-1.5\t0\t3e-2\n";
        let saved = TextRepository::parse(contents).unwrap();

        assert_eq!((saved.n_states, saved.n_actions), (2, 3));
        let table = saved.to_table().unwrap();
        assert_eq!(table.get(0, 2), 0.25);
        assert_eq!(table.get(1, 2), 0.03);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        assert!(TextRepository::parse("0\t0\t0\n0\t0\n").is_err());
    }

    #[test]
    fn test_non_numeric_rejected() {
        assert!(TextRepository::parse("0\tabc\n").is_err());
    }
}
