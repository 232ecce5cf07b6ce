use crate::{problem::ProblemId, report::Score};
use serde::Deserialize;
use std::path::PathBuf;

/// The evaluator prints more than this; only `dislikes` is read.
#[derive(Debug, Clone, Deserialize)]
pub struct EvalReport {
    pub dislikes: Score,
}

#[derive(Debug, Clone)]
pub struct ImproveRequest {
    pub glucose_path: PathBuf,
    pub problem_path: PathBuf,
    /// Read as the starting point and overwritten by the solver.
    pub solution_path: PathBuf,
    pub work_dir: PathBuf,
    pub max_neighbor: u32,
    pub globalist: Vec<ProblemId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    Succeeded,
    Failed { code: Option<i32> },
}

impl SolverStatus {
    pub fn succeeded(self) -> bool {
        matches!(self, SolverStatus::Succeeded)
    }
}
