//! JSON-file implementation of `HistoryRepository`.
//!
//! The whole history lives in one document (`history.json`), rewritten as a
//! full snapshot on every change. Stored responses are re-validated on load;
//! one invalid record discards the whole document.

use std::path::{Path, PathBuf};

use axiom_core::error::{AxiomError, Result};
use axiom_core::history::HistoryRepository;
use axiom_core::schema::CalculationRecord;

use crate::paths::AxiomPaths;
use crate::storage::AtomicJsonFile;

/// History repository backed by a single JSON file.
pub struct JsonHistoryRepository {
    file: AtomicJsonFile<Vec<CalculationRecord>>,
}

impl JsonHistoryRepository {
    /// Creates a repository at the default location (`~/.config/axiom/history.json`).
    pub fn new() -> Result<Self> {
        let path = AxiomPaths::history_file().map_err(|e| AxiomError::config(e.to_string()))?;
        Ok(Self::with_path(path))
    }

    /// Creates a repository at a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            file: AtomicJsonFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl HistoryRepository for JsonHistoryRepository {
    fn load(&self) -> Vec<CalculationRecord> {
        match self.file.load() {
            Ok(Some(records)) => {
                tracing::debug!(count = records.len(), path = %self.path().display(), "loaded history");
                records
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path().display(),
                    error = %e,
                    "discarding unreadable history"
                );
                Vec::new()
            }
        }
    }

    fn save(&self, history: &[CalculationRecord]) -> Result<()> {
        self.file.save(&history.to_vec())?;
        tracing::debug!(count = history.len(), path = %self.path().display(), "saved history");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.file.remove()?;
        tracing::info!(path = %self.path().display(), "history cleared");
        Ok(())
    }
}
