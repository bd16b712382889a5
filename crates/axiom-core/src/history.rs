//! History persistence contract.

use std::sync::Mutex;

use crate::error::{AxiomError, Result};
use crate::schema::CalculationRecord;

/// Durable storage for the calculation history.
///
/// The repository only serializes and deserializes; the ordered list itself is
/// owned by the application controller. Calls are synchronous and come from a
/// single writer.
pub trait HistoryRepository: Send + Sync {
    /// Reads the stored history, newest first.
    ///
    /// Never fails: absent or unreadable data yields an empty list.
    fn load(&self) -> Vec<CalculationRecord>;

    /// Replaces the stored history with a full snapshot.
    fn save(&self, history: &[CalculationRecord]) -> Result<()>;

    /// Removes the stored history entirely.
    fn clear(&self) -> Result<()>;
}

/// Process-local repository; nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryHistoryRepository {
    records: Mutex<Option<Vec<CalculationRecord>>>,
}

impl InMemoryHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the repository with existing records.
    pub fn with_records(records: Vec<CalculationRecord>) -> Self {
        Self {
            records: Mutex::new(Some(records)),
        }
    }

    /// Returns true when a snapshot is currently stored.
    pub fn is_persisted(&self) -> bool {
        self.records
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}

impl HistoryRepository for InMemoryHistoryRepository {
    fn load(&self) -> Vec<CalculationRecord> {
        match self.records.lock() {
            Ok(guard) => guard.clone().unwrap_or_default(),
            Err(_) => {
                tracing::warn!("in-memory history lock poisoned, starting empty");
                Vec::new()
            }
        }
    }

    fn save(&self, history: &[CalculationRecord]) -> Result<()> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| AxiomError::internal("history lock poisoned"))?;
        *guard = Some(history.to_vec());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| AxiomError::internal("history lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{MathResponse, MathStep};

    fn record(id: &str) -> CalculationRecord {
        CalculationRecord {
            id: id.to_string(),
            timestamp: 1,
            problem: format!("problem {id}"),
            response: MathResponse {
                domain: "Arithmetic".to_string(),
                problem: "1 + 1".to_string(),
                assumptions: None,
                steps: vec![MathStep {
                    title: "Add".to_string(),
                    explanation: "Add the numbers".to_string(),
                    formula: None,
                }],
                alternative_methods: None,
                final_answer: "2".to_string(),
                latex_answer: "2".to_string(),
            },
        }
    }

    #[test]
    fn test_empty_repository_loads_nothing() {
        let repo = InMemoryHistoryRepository::new();
        assert!(repo.load().is_empty());
        assert!(!repo.is_persisted());
    }

    #[test]
    fn test_save_replaces_snapshot() {
        let repo = InMemoryHistoryRepository::new();
        repo.save(&[record("a")]).unwrap();
        repo.save(&[record("b"), record("a")]).unwrap();

        let loaded = repo.load();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "b");
    }

    #[test]
    fn test_clear_removes_snapshot() {
        let repo = InMemoryHistoryRepository::with_records(vec![record("a")]);
        repo.clear().unwrap();
        assert!(repo.load().is_empty());
        assert!(!repo.is_persisted());
    }
}
