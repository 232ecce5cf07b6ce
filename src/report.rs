use crate::{
    problem::ProblemId,
    search::{UnitOfWork, join_ids},
};
use serde::Serialize;
use std::fmt;

/// Evaluator "dislikes"; lower is better.
pub type Score = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    EvaluateBaseline,
    Improve,
    EvaluateImproved,
    Submit,
    /// The runner itself panicked; no stage reported back.
    Panic,
}

impl Stage {
    pub fn tag(self) -> &'static str {
        match self {
            Stage::Fetch => "FETCH",
            Stage::EvaluateBaseline => "EVAL",
            Stage::Improve => "IMPROVE",
            Stage::EvaluateImproved => "EVAL IMPROVED",
            Stage::Submit => "SUBMIT",
            Stage::Panic => "PANIC",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Fetch => "fetch baseline",
            Stage::EvaluateBaseline => "evaluate baseline",
            Stage::Improve => "improve",
            Stage::EvaluateImproved => "evaluate improved",
            Stage::Submit => "submit",
            Stage::Panic => "run unit",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeKind {
    NoInput,
    Fail {
        baseline: Score,
    },
    Improved {
        baseline: Score,
        improved: Score,
    },
    Error {
        stage: Stage,
        baseline: Option<Score>,
        improved: Option<Score>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub problem_id: ProblemId,
    pub source_ids: Vec<ProblemId>,
    pub kind: OutcomeKind,
}

impl Outcome {
    pub fn new(unit: &UnitOfWork, kind: OutcomeKind) -> Self {
        Self {
            problem_id: unit.problem_id,
            source_ids: unit.source_ids(),
            kind,
        }
    }
}

/// `<problem>\t<ids>\t<tag-or-scores>`, the results log line.
impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t", self.problem_id, join_ids(&self.source_ids))?;
        match &self.kind {
            OutcomeKind::NoInput => f.write_str("NO INPUT"),
            OutcomeKind::Fail { baseline } => write!(f, "{baseline}\tFAIL"),
            OutcomeKind::Improved { baseline, improved } => write!(f, "{baseline}\t{improved}"),
            OutcomeKind::Error {
                stage,
                baseline,
                improved,
            } => {
                for score in [baseline, improved].into_iter().flatten() {
                    write!(f, "{score}\t")?;
                }
                write!(f, "{} ERROR", stage.tag())
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub no_input: usize,
    pub failed: usize,
    pub improved: usize,
    /// Improved units whose new score beat the fetched baseline.
    pub strictly_better: usize,
    pub errors: usize,
    pub sink_errors: usize,
}

impl RunSummary {
    pub fn tally(&mut self, outcome: &Outcome) {
        self.total += 1;
        match outcome.kind {
            OutcomeKind::NoInput => self.no_input += 1,
            OutcomeKind::Fail { .. } => self.failed += 1,
            OutcomeKind::Improved { baseline, improved } => {
                self.improved += 1;
                if improved < baseline {
                    self.strictly_better += 1;
                }
            }
            OutcomeKind::Error { .. } => self.errors += 1,
        }
    }
}
