//! Application state machine: input, history and the view state.
//!
//! The controller is the single owner of mutable application state. A solve is
//! split into three phases so callers can release any lock around the
//! controller while the network call runs:
//!
//! 1. [`AppController::begin_solve`] moves to `Loading` and hands out a
//!    [`PendingSolve`].
//! 2. [`PendingSolve::run`] performs the one request.
//! 3. [`AppController::finish_solve`] applies the [`SolveOutcome`].

use std::sync::Arc;

use axiom_core::error::{AxiomError, Result};
use axiom_core::history::HistoryRepository;
use axiom_core::schema::{CalculationRecord, MathResponse};
use axiom_core::solver::MathSolver;
use tokio::sync::watch;
use uuid::Uuid;

/// What the main panel currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Error(String),
    Showing(CalculationRecord),
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }
}

/// A solve that has been accepted but not yet sent.
pub struct PendingSolve {
    problem: String,
    solver: Arc<dyn MathSolver>,
}

impl PendingSolve {
    pub fn problem(&self) -> &str {
        &self.problem
    }

    /// Performs the single request. Never retries.
    pub async fn run(self) -> SolveOutcome {
        tracing::debug!(
            "[PendingSolve] Sending problem to {} ({} chars)",
            self.solver.name(),
            self.problem.chars().count()
        );
        let result = self.solver.solve(&self.problem).await;
        SolveOutcome {
            problem: self.problem,
            result,
        }
    }
}

/// Result of a [`PendingSolve`], to be applied with [`AppController::finish_solve`].
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub problem: String,
    pub result: Result<MathResponse>,
}

pub struct AppController {
    solver: Arc<dyn MathSolver>,
    repository: Arc<dyn HistoryRepository>,
    input: String,
    history: Vec<CalculationRecord>,
    state_tx: watch::Sender<ViewState>,
}

impl AppController {
    /// Creates a controller, loading the stored history once.
    pub fn new(solver: Arc<dyn MathSolver>, repository: Arc<dyn HistoryRepository>) -> Self {
        let history = repository.load();
        tracing::info!(
            "[AppController] Loaded {} history records (solver: {})",
            history.len(),
            solver.name()
        );
        let (state_tx, _) = watch::channel(ViewState::Idle);
        Self {
            solver,
            repository,
            input: String::new(),
            history,
            state_tx,
        }
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn state(&self) -> ViewState {
        self.state_tx.borrow().clone()
    }

    /// Newest first.
    pub fn history(&self) -> &[CalculationRecord] {
        &self.history
    }

    pub fn is_loading(&self) -> bool {
        self.state_tx.borrow().is_loading()
    }

    /// Receives every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state_tx.subscribe()
    }

    /// Id of the record on display, if any.
    pub fn active_id(&self) -> Option<String> {
        match &*self.state_tx.borrow() {
            ViewState::Showing(record) => Some(record.id.clone()),
            _ => None,
        }
    }

    /// Accepts the current input for solving.
    ///
    /// Returns `None` without changing anything when the input is blank or a
    /// solve is already in flight.
    pub fn begin_solve(&mut self) -> Option<PendingSolve> {
        if self.input.trim().is_empty() {
            tracing::debug!("[AppController] Ignoring blank submission");
            return None;
        }
        if self.is_loading() {
            tracing::debug!("[AppController] Solve already in flight, ignoring submission");
            return None;
        }

        self.set_state(ViewState::Loading);
        Some(PendingSolve {
            problem: self.input.clone(),
            solver: Arc::clone(&self.solver),
        })
    }

    /// Applies the outcome of a solve started with [`begin_solve`](Self::begin_solve).
    pub fn finish_solve(&mut self, outcome: SolveOutcome) {
        match outcome.result {
            Ok(response) => {
                let record = CalculationRecord {
                    id: Uuid::new_v4().to_string(),
                    timestamp: chrono::Utc::now().timestamp_millis(),
                    problem: outcome.problem,
                    response,
                };
                tracing::info!(
                    "[AppController] Solved {} ({}, {} steps)",
                    record.id,
                    record.response.domain,
                    record.response.steps.len()
                );

                self.history.insert(0, record.clone());
                if let Err(e) = self.repository.save(&self.history) {
                    tracing::warn!("[AppController] Failed to persist history: {}", e);
                }
                self.input.clear();
                self.set_state(ViewState::Showing(record));
            }
            Err(e) => {
                tracing::warn!("[AppController] Solve failed: {}", e);
                self.set_state(ViewState::Error(e.user_message()));
            }
        }
    }

    /// Replaces the input with `text` and runs a full solve cycle.
    ///
    /// Returns `false` when the submission was ignored. While a solve is in
    /// flight the input is left untouched.
    pub async fn submit(&mut self, text: impl Into<String>) -> bool {
        if self.is_loading() {
            tracing::debug!("[AppController] Solve already in flight, ignoring submission");
            return false;
        }
        self.set_input(text);
        let Some(pending) = self.begin_solve() else {
            return false;
        };
        let outcome = pending.run().await;
        self.finish_solve(outcome);
        true
    }

    /// Shows a stored record.
    pub fn select_history_entry(&mut self, id: &str) -> Result<()> {
        if self.is_loading() {
            return Err(AxiomError::Busy);
        }
        let record = self
            .history
            .iter()
            .find(|record| record.id == id)
            .cloned()
            .ok_or_else(|| AxiomError::not_found("CalculationRecord", id))?;

        tracing::debug!("[AppController] Showing history entry {}", record.id);
        self.set_state(ViewState::Showing(record));
        Ok(())
    }

    /// Purges all history when `confirmed`.
    ///
    /// The record on display, if any, stays visible.
    pub fn clear_history(&mut self, confirmed: bool) -> Result<()> {
        if !confirmed {
            tracing::debug!("[AppController] History clear not confirmed");
            return Ok(());
        }
        let purged = self.history.len();
        self.repository.clear()?;
        self.history.clear();
        tracing::info!("[AppController] Cleared {} history records", purged);
        Ok(())
    }

    fn set_state(&self, state: ViewState) {
        self.state_tx.send_replace(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axiom_core::history::InMemoryHistoryRepository;
    use axiom_core::schema::MathStep;

    struct FixedSolver(Result<MathResponse>);

    #[async_trait]
    impl MathSolver for FixedSolver {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn solve(&self, _problem_text: &str) -> Result<MathResponse> {
            self.0.clone()
        }
    }

    /// Accepts writes but refuses to be cleared.
    struct UndeletableRepository;

    impl HistoryRepository for UndeletableRepository {
        fn load(&self) -> Vec<CalculationRecord> {
            Vec::new()
        }

        fn save(&self, _history: &[CalculationRecord]) -> Result<()> {
            Ok(())
        }

        fn clear(&self) -> Result<()> {
            Err(AxiomError::Io {
                message: "permission denied".to_string(),
            })
        }
    }

    fn response() -> MathResponse {
        MathResponse {
            domain: "Arithmetic".to_string(),
            problem: "1 + 1".to_string(),
            assumptions: None,
            steps: vec![MathStep {
                title: "Add".to_string(),
                explanation: "One plus one".to_string(),
                formula: Some("1 + 1 = 2".to_string()),
            }],
            alternative_methods: None,
            final_answer: "2".to_string(),
            latex_answer: "2".to_string(),
        }
    }

    fn controller(result: Result<MathResponse>) -> AppController {
        AppController::new(
            Arc::new(FixedSolver(result)),
            Arc::new(InMemoryHistoryRepository::new()),
        )
    }

    #[test]
    fn test_starts_idle() {
        let controller = controller(Ok(response()));
        assert_eq!(controller.state(), ViewState::Idle);
        assert!(controller.history().is_empty());
        assert_eq!(controller.active_id(), None);
    }

    #[test]
    fn test_blank_input_does_not_start_solve() {
        let mut controller = controller(Ok(response()));
        controller.set_input("   \n");
        assert!(controller.begin_solve().is_none());
        assert_eq!(controller.state(), ViewState::Idle);
    }

    #[test]
    fn test_begin_solve_twice_is_rejected() {
        let mut controller = controller(Ok(response()));
        controller.set_input("1 + 1");
        let pending = controller.begin_solve().unwrap();
        assert_eq!(pending.problem(), "1 + 1");
        assert!(controller.is_loading());
        assert!(controller.begin_solve().is_none());
    }

    #[tokio::test]
    async fn test_success_shows_record_and_clears_input() {
        let mut controller = controller(Ok(response()));
        assert!(controller.submit("1 + 1").await);

        let ViewState::Showing(record) = controller.state() else {
            panic!("expected Showing, got {:?}", controller.state());
        };
        assert_eq!(record.problem, "1 + 1");
        assert_eq!(controller.input(), "");
        assert_eq!(controller.active_id(), Some(record.id.clone()));
        assert_eq!(controller.history(), &[record]);
    }

    #[tokio::test]
    async fn test_failure_keeps_input_and_history() {
        let mut controller = controller(Err(AxiomError::api("Quota exceeded")));
        controller.submit("1 + 1").await;

        assert_eq!(controller.state(), ViewState::Error("Quota exceeded".to_string()));
        assert_eq!(controller.input(), "1 + 1");
        assert!(controller.history().is_empty());
    }

    #[tokio::test]
    async fn test_blank_error_message_uses_default() {
        let mut controller = controller(Err(AxiomError::api("")));
        controller.submit("1 + 1").await;

        assert_eq!(
            controller.state(),
            ViewState::Error(axiom_core::error::DEFAULT_SOLVE_FAILURE.to_string())
        );
    }

    #[test]
    fn test_select_unknown_entry_is_not_found() {
        let mut controller = controller(Ok(response()));
        let err = controller.select_history_entry("missing").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_select_while_loading_is_busy() {
        let mut controller = controller(Ok(response()));
        controller.set_input("1 + 1");
        let _pending = controller.begin_solve().unwrap();
        assert_eq!(controller.select_history_entry("any"), Err(AxiomError::Busy));
    }

    #[tokio::test]
    async fn test_unconfirmed_clear_keeps_history() {
        let mut controller = controller(Ok(response()));
        controller.submit("1 + 1").await;
        controller.clear_history(false).unwrap();
        assert_eq!(controller.history().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_clear_keeps_history() {
        let mut controller = AppController::new(
            Arc::new(FixedSolver(Ok(response()))),
            Arc::new(UndeletableRepository),
        );
        controller.submit("1 + 1").await;
        assert_eq!(controller.history().len(), 1);

        let err = controller.clear_history(true).unwrap_err();
        assert!(matches!(err, AxiomError::Io { .. }));
        assert_eq!(controller.history().len(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_observe_transitions() {
        let mut controller = controller(Ok(response()));
        let mut rx = controller.subscribe();

        controller.set_input("1 + 1");
        let pending = controller.begin_solve().unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_loading());

        controller.finish_solve(pending.run().await);
        assert!(matches!(*rx.borrow_and_update(), ViewState::Showing(_)));
    }
}
