pub mod gemini_solver;
pub mod prompt;

pub use gemini_solver::GeminiSolver;
