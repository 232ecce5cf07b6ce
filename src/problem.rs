use crate::error::SweepError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub type ProblemId = u32;

/// `problems/42.json` -> 42. The base name must start with digits.
pub fn problem_id_from_path(path: &Path) -> Result<ProblemId, SweepError> {
    let invalid = || SweepError::InvalidProblemPath {
        path: path.to_path_buf(),
    };
    let name = path.file_name().and_then(|s| s.to_str()).ok_or_else(invalid)?;
    let leading_id = Regex::new(r"^(\d+)")?;
    let caps = leading_id.captures(name).ok_or_else(invalid)?;
    caps[1].parse::<ProblemId>().map_err(|_| invalid())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BonusKind {
    #[serde(rename = "GLOBALIST")]
    Globalist,
    #[serde(rename = "BREAK_A_LEG")]
    BreakALeg,
    #[serde(rename = "WALLHACK")]
    WallHack,
    #[serde(rename = "SUPERFLEX")]
    SuperFlex,
    #[serde(rename = "OTHER", other)]
    Other,
}

/// Bonus location as the catalog writes it: a bare index or an `[x, y]` point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Position {
    Index(i64),
    Point(i64, i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bonus {
    #[serde(rename = "bonus", alias = "type")]
    pub kind: BonusKind,
    pub position: Position,
    /// Problem the bonus was unlocked from, not the problem carrying it.
    pub problem: ProblemId,
}

impl Bonus {
    pub fn is_globalist(&self) -> bool {
        self.kind == BonusKind::Globalist
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ProblemFile {
    #[serde(default)]
    bonuses: Vec<Bonus>,
}

#[derive(Debug, Clone)]
pub struct Problem {
    pub id: ProblemId,
    pub bonuses: Vec<Bonus>,
}

impl Problem {
    pub fn from_json(id: ProblemId, raw: &str) -> Result<Self, SweepError> {
        let file: ProblemFile =
            serde_json::from_str(raw).map_err(|e| SweepError::Malformed {
                problem_id: id,
                message: e.to_string(),
            })?;
        Ok(Self {
            id,
            bonuses: file.bonuses,
        })
    }

    pub fn globalist_bonuses(&self) -> Vec<Bonus> {
        self.bonuses
            .iter()
            .filter(|b| b.is_globalist())
            .cloned()
            .collect()
    }
}

/// Directory of `<id>.json` problem descriptions.
#[derive(Debug, Clone)]
pub struct ProblemCatalog {
    dir: PathBuf,
}

impl ProblemCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: ProblemId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    pub fn load(&self, id: ProblemId) -> Result<Problem, SweepError> {
        let path = self.path_for(id);
        let raw = std::fs::read_to_string(&path).map_err(|_| SweepError::NotFound {
            problem_id: id,
            path: path.clone(),
        })?;
        let problem = Problem::from_json(id, &raw)?;
        debug!(
            "loaded problem {} bonuses={} path={}",
            id,
            problem.bonuses.len(),
            path.display()
        );
        Ok(problem)
    }

    pub fn discover(&self) -> anyhow::Result<Vec<ProblemId>> {
        use anyhow::Context;

        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("read_dir {}", self.dir.display()))?;

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match problem_id_from_path(&path) {
                Ok(id) => ids.push(id),
                Err(err) => warn!("skipping {err}"),
            }
        }
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}
