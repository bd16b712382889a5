//! Wiring of configuration, storage and the solver for one process run.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use axiom_core::config::AxiomConfig;
use axiom_core::error::AxiomError;
use axiom_core::history::{HistoryRepository, InMemoryHistoryRepository};
use axiom_core::schema::MathResponse;
use axiom_core::solver::MathSolver;
use axiom_infrastructure::{ConfigService, JsonHistoryRepository};
use axiom_interaction::GeminiSolver;

use crate::GlobalArgs;

pub struct AppContext {
    config: AxiomConfig,
    config_service: ConfigService,
    history_file: Option<PathBuf>,
    ephemeral: bool,
    model: Option<String>,
}

impl AppContext {
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let mut config_service = ConfigService::new();
        if let Some(path) = &args.config {
            config_service = config_service.with_config_path(path);
        }
        let config = config_service
            .load_config()
            .context("Failed to load configuration")?;

        Ok(Self {
            config,
            config_service,
            history_file: args.history_file.clone(),
            ephemeral: args.ephemeral,
            model: args.model.clone().filter(|model| !model.trim().is_empty()),
        })
    }

    /// History store chosen by `--ephemeral`, `--history-file` or the config file.
    pub fn repository(&self) -> Result<Arc<dyn HistoryRepository>> {
        if self.ephemeral {
            tracing::debug!("[AppContext] Using in-memory history");
            return Ok(Arc::new(InMemoryHistoryRepository::new()));
        }

        let path = self
            .history_file
            .clone()
            .or_else(|| self.config.storage.history_file.clone());
        let repository = match path {
            Some(path) => JsonHistoryRepository::with_path(path),
            None => JsonHistoryRepository::new()
                .context("Failed to locate the history file")?,
        };
        tracing::debug!("[AppContext] History file: {}", repository.path().display());
        Ok(Arc::new(repository))
    }

    /// Builds the Gemini solver. Fails when no API key is configured.
    pub fn solver(&self) -> axiom_core::error::Result<Arc<dyn MathSolver>> {
        let credentials = self.config_service.resolve_credentials()?;

        let mut solver_config = self.config.solver.clone();
        if let Some(model) = self.model.clone().or(credentials.model_name) {
            solver_config.model = model;
        }

        let solver = GeminiSolver::from_config(&solver_config, credentials.api_key)?;
        tracing::debug!("[AppContext] Using model {}", solver.model());
        Ok(Arc::new(solver))
    }

    /// Like [`solver`](Self::solver), but a missing key only surfaces when a
    /// solve is attempted.
    pub fn solver_or_unconfigured(&self) -> Arc<dyn MathSolver> {
        match self.solver() {
            Ok(solver) => solver,
            Err(e) => {
                tracing::warn!("[AppContext] Solver unavailable: {}", e);
                Arc::new(UnconfiguredSolver { reason: e })
            }
        }
    }
}

/// Stands in for the real solver when it could not be built.
struct UnconfiguredSolver {
    reason: AxiomError,
}

#[async_trait]
impl MathSolver for UnconfiguredSolver {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn solve(&self, _problem_text: &str) -> axiom_core::error::Result<MathResponse> {
        Err(self.reason.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(history_file: Option<PathBuf>, ephemeral: bool) -> GlobalArgs {
        GlobalArgs {
            config: Some(PathBuf::from("/nonexistent/axiom/config.toml")),
            history_file,
            model: None,
            ephemeral,
            verbose: false,
        }
    }

    #[test]
    fn test_history_file_flag_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        let context = AppContext::load(&args(Some(path.clone()), false)).unwrap();

        let repository = context.repository().unwrap();
        assert!(repository.load().is_empty());
        repository.save(&[]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_ephemeral_does_not_touch_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let context = AppContext::load(&args(Some(path.clone()), true)).unwrap();

        context.repository().unwrap().save(&[]).unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unconfigured_solver_reports_reason() {
        let solver = UnconfiguredSolver {
            reason: AxiomError::config("No Gemini API key found"),
        };
        let err = solver.solve("1 + 1").await.unwrap_err();
        assert_eq!(err, AxiomError::config("No Gemini API key found"));
    }
}
