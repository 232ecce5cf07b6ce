use std::path::PathBuf;

/// Errors raised while turning problem descriptions into units of work.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("not a problem path (expected leading digits): {}", path.display())]
    InvalidProblemPath { path: PathBuf },

    #[error("problem {problem_id} not found: {}", path.display())]
    NotFound { problem_id: u32, path: PathBuf },

    #[error("problem {problem_id} is malformed: {message}")]
    Malformed { problem_id: u32, message: String },

    #[error("problem {problem_id} has {count} GLOBALIST bonuses; at most 63 can be enumerated")]
    SearchSpaceTooLarge { problem_id: u32, count: usize },

    #[error(transparent)]
    Pattern(#[from] regex::Error),
}
