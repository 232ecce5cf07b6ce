pub mod process;
pub mod types;

use anyhow::Result;
use std::path::Path;

pub use types::{EvalReport, ImproveRequest, SolverStatus};

use crate::report::Score;

/// Scores a solution file against its problem description.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, problem_path: &Path, solution_path: &Path) -> Result<Score>;
}

/// Local-search improvement of a solution, in place.
pub trait LocalSearchSolver: Send + Sync {
    fn improve(&self, req: &ImproveRequest) -> Result<SolverStatus>;
}
