pub mod config;
pub mod error;
pub mod history;
pub mod schema;
pub mod solver;

// Re-export common error type
pub use error::{AxiomError, Result};
pub use history::{HistoryRepository, InMemoryHistoryRepository};
pub use schema::{CalculationRecord, MathDomain, MathResponse, MathStep};
pub use solver::MathSolver;
