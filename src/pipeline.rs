use crate::{
    config::Config,
    dispatch::UnitRunner,
    engine::{Evaluator, ImproveRequest, LocalSearchSolver},
    report::{Outcome, OutcomeKind, Score, Stage},
    search::UnitOfWork,
    service::{BaselineStore, Submitter},
    util::ensure_parent_dir,
};
use anyhow::Context;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// A hard failure of one unit. Carries whatever scores were already known.
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {source:#}")]
pub struct UnitError {
    pub stage: Stage,
    pub baseline: Option<Score>,
    pub improved: Option<Score>,
    pub source: anyhow::Error,
}

impl UnitError {
    fn at(
        stage: Stage,
        baseline: Option<Score>,
        improved: Option<Score>,
    ) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| Self {
            stage,
            baseline,
            improved,
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub problems_dir: PathBuf,
    pub best_solutions_dir: PathBuf,
    pub work_root: PathBuf,
    pub glucose_path: PathBuf,
    pub max_neighbor: u32,
    pub final_solution_file: String,
}

impl PipelineSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            problems_dir: PathBuf::from(&cfg.paths.problems_dir),
            best_solutions_dir: PathBuf::from(&cfg.paths.best_solutions_dir),
            work_root: PathBuf::from(&cfg.paths.work_root),
            glucose_path: PathBuf::from(&cfg.solver.glucose_path),
            max_neighbor: cfg.solver.max_neighbor,
            final_solution_file: cfg.solver.final_solution_file.clone(),
        }
    }

    pub fn paths_for(&self, unit: &UnitOfWork) -> UnitPaths {
        let key = unit.key();
        let work_dir = self.work_root.join(&key);
        UnitPaths {
            problem: self.problems_dir.join(format!("{}.json", unit.problem_id)),
            baseline: self.best_solutions_dir.join(format!("{key}.json")),
            improved: work_dir.join(&self.final_solution_file),
            work_dir,
        }
    }
}

/// Every path one unit touches. Disjoint across units because `key` is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPaths {
    pub problem: PathBuf,
    pub work_dir: PathBuf,
    pub baseline: PathBuf,
    pub improved: PathBuf,
}

pub struct Pipeline {
    settings: PipelineSettings,
    evaluator: Box<dyn Evaluator>,
    solver: Box<dyn LocalSearchSolver>,
    store: Box<dyn BaselineStore>,
    submitter: Box<dyn Submitter>,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        evaluator: Box<dyn Evaluator>,
        solver: Box<dyn LocalSearchSolver>,
        store: Box<dyn BaselineStore>,
        submitter: Box<dyn Submitter>,
    ) -> Self {
        Self {
            settings,
            evaluator,
            solver,
            store,
            submitter,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// fetch baseline -> evaluate -> improve -> evaluate -> submit.
    ///
    /// An empty baseline yields `NoInput` and a nonzero solver exit yields
    /// `Fail`; both stop the unit early. Anything else that goes wrong is a
    /// `UnitError`.
    pub fn run_unit(&self, unit: &UnitOfWork) -> Result<Outcome, UnitError> {
        let started = Instant::now();
        let paths = self.settings.paths_for(unit);
        info!(
            "unit {} start globalist=[{}]",
            unit.key(),
            unit.source_ids_joined()
        );

        let body = self
            .store
            .fetch(unit.problem_id, &unit.bonuses)
            .map_err(UnitError::at(Stage::Fetch, None, None))?;
        persist(&paths.baseline, body.as_bytes())
            .map_err(UnitError::at(Stage::Fetch, None, None))?;

        let persisted = std::fs::read_to_string(&paths.baseline)
            .with_context(|| format!("reading back {}", paths.baseline.display()))
            .map_err(UnitError::at(Stage::Fetch, None, None))?;
        if persisted.trim().is_empty() {
            info!("unit {} has no stored baseline", unit.key());
            return Ok(Outcome::new(unit, OutcomeKind::NoInput));
        }

        let baseline = self
            .evaluator
            .evaluate(&paths.problem, &paths.baseline)
            .map_err(UnitError::at(Stage::EvaluateBaseline, None, None))?;
        debug!("unit {} baseline dislikes={}", unit.key(), baseline);

        let req = ImproveRequest {
            glucose_path: self.settings.glucose_path.clone(),
            problem_path: paths.problem.clone(),
            solution_path: paths.baseline.clone(),
            work_dir: paths.work_dir.clone(),
            max_neighbor: self.settings.max_neighbor,
            globalist: unit.source_ids(),
        };
        let status = self
            .solver
            .improve(&req)
            .map_err(UnitError::at(Stage::Improve, Some(baseline), None))?;

        if !status.succeeded() {
            warn!("unit {} solver failed: {:?}", unit.key(), status);
            return Ok(Outcome::new(unit, OutcomeKind::Fail { baseline }));
        }

        let improved = self
            .evaluator
            .evaluate(&paths.problem, &paths.improved)
            .map_err(UnitError::at(Stage::EvaluateImproved, Some(baseline), None))?;

        let solution = std::fs::read(&paths.improved)
            .with_context(|| format!("reading {}", paths.improved.display()))
            .map_err(UnitError::at(Stage::Submit, Some(baseline), Some(improved)))?;
        self.submitter
            .submit(unit.problem_id, &solution)
            .map_err(UnitError::at(Stage::Submit, Some(baseline), Some(improved)))?;

        info!(
            "unit {} done dislikes {} -> {} in {:.1}s",
            unit.key(),
            baseline,
            improved,
            started.elapsed().as_secs_f64()
        );
        Ok(Outcome::new(unit, OutcomeKind::Improved { baseline, improved }))
    }
}

impl UnitRunner for Pipeline {
    fn run(&self, unit: &UnitOfWork) -> Outcome {
        match self.run_unit(unit) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("unit {}: {}", unit.key(), err);
                Outcome::new(
                    unit,
                    OutcomeKind::Error {
                        stage: err.stage,
                        baseline: err.baseline,
                        improved: err.improved,
                    },
                )
            }
        }
    }
}

fn persist(path: &std::path::Path, bytes: &[u8]) -> anyhow::Result<()> {
    ensure_parent_dir(path)?;
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}
