use crate::{
    error::SweepError,
    problem::{Bonus, Problem, ProblemId},
};
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

/// One (problem, GLOBALIST subset) pair. Never mutated after generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitOfWork {
    pub problem_id: ProblemId,
    pub bonuses: Vec<Bonus>,
    /// Bit i set when the i-th GLOBALIST bonus of the problem is selected.
    pub selection: u64,
    /// Two GLOBALIST bonuses of this problem share a source problem, so the
    /// joined source ids alone do not identify the subset.
    pub ambiguous_ids: bool,
}

impl UnitOfWork {
    pub fn source_ids(&self) -> Vec<ProblemId> {
        self.bonuses.iter().map(|b| b.problem).collect()
    }

    pub fn source_ids_joined(&self) -> String {
        join_ids(&self.source_ids())
    }

    /// Filesystem namespace for this unit; distinct for distinct subsets.
    pub fn key(&self) -> String {
        let base = format!("{}_{}", self.problem_id, self.source_ids_joined());
        if self.ambiguous_ids {
            format!("{base}_m{:x}", self.selection)
        } else {
            base
        }
    }

    pub fn planned(&self) -> PlannedUnit<'_> {
        PlannedUnit {
            key: self.key(),
            unit: self,
        }
    }
}

/// One line of `plan` output: the unit plus its key.
#[derive(Debug, Serialize)]
pub struct PlannedUnit<'a> {
    pub key: String,
    #[serde(flatten)]
    pub unit: &'a UnitOfWork,
}

pub fn join_ids(ids: &[ProblemId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Power set of a problem's GLOBALIST bonuses, ordered by subset size and
/// then lexicographically by catalog index. A fresh clone replays the same
/// sequence.
#[derive(Debug, Clone)]
pub struct SearchSpace {
    problem_id: ProblemId,
    globalists: Vec<Bonus>,
    ambiguous_ids: bool,
    size: usize,
    indices: Vec<usize>,
}

impl SearchSpace {
    pub fn for_problem(problem: &Problem, warn_over: usize) -> Result<Self, SweepError> {
        let globalists = problem.globalist_bonuses();
        if globalists.len() > 63 {
            return Err(SweepError::SearchSpaceTooLarge {
                problem_id: problem.id,
                count: globalists.len(),
            });
        }
        if globalists.len() > warn_over {
            warn!(
                "problem {} has {} GLOBALIST bonuses; enumerating {} subsets",
                problem.id,
                globalists.len(),
                1u64 << globalists.len()
            );
        }

        let mut seen = HashSet::new();
        let ambiguous_ids = !globalists.iter().all(|b| seen.insert(b.problem));

        Ok(Self {
            problem_id: problem.id,
            globalists,
            ambiguous_ids,
            size: 0,
            indices: Vec::new(),
        })
    }

    /// 2^k for k GLOBALIST bonuses.
    pub fn total(&self) -> u64 {
        1u64 << self.globalists.len()
    }

    fn advance(&mut self) {
        let k = self.globalists.len();
        let r = self.size;
        let pivot = (0..r).rev().find(|&i| self.indices[i] != i + k - r);
        match pivot {
            Some(i) => {
                self.indices[i] += 1;
                for j in i + 1..r {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
            }
            None => {
                self.size += 1;
                self.indices = (0..self.size).collect();
            }
        }
    }
}

impl Iterator for SearchSpace {
    type Item = UnitOfWork;

    fn next(&mut self) -> Option<UnitOfWork> {
        if self.size > self.globalists.len() {
            return None;
        }

        let bonuses = self
            .indices
            .iter()
            .map(|&i| self.globalists[i].clone())
            .collect();
        let selection = self.indices.iter().fold(0u64, |m, &i| m | (1 << i));
        let unit = UnitOfWork {
            problem_id: self.problem_id,
            bonuses,
            selection,
            ambiguous_ids: self.ambiguous_ids,
        };

        self.advance();
        Some(unit)
    }
}
