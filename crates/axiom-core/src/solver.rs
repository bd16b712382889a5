//! Solve adapter contract.

use async_trait::async_trait;

use crate::error::Result;
use crate::schema::MathResponse;

/// A reasoning backend that turns a problem statement into a derivation.
///
/// One call is one request/response cycle. Implementations must not retry,
/// must not mutate local state, and must return either a fully validated
/// [`MathResponse`] or an error. No partial result is ever produced.
#[async_trait]
pub trait MathSolver: Send + Sync {
    /// Short name of the backend, used in logs.
    fn name(&self) -> &str;

    /// Solves `problem_text`.
    ///
    /// Callers pass non-blank text; implementations reject blank input with
    /// [`AxiomError::EmptyInput`](crate::error::AxiomError::EmptyInput)
    /// without contacting the backend.
    async fn solve(&self, problem_text: &str) -> Result<MathResponse>;
}
