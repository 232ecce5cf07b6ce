#![allow(dead_code)]

use anyhow::{Result, anyhow};
use globalist_sweep::{
    engine::{Evaluator, ImproveRequest, LocalSearchSolver, SolverStatus},
    pipeline::{Pipeline, PipelineSettings},
    problem::{Bonus, Problem, ProblemId},
    report::Score,
    search::{SearchSpace, UnitOfWork},
    service::{BaselineStore, Submitter},
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const FINAL_FILE: &str = "sol999999.json";
pub const IMPROVED_BODY: &str = r#"{"vertices":[[1,2],[3,4]],"bonuses":[]}"#;

pub type CallLog = Arc<Mutex<Vec<String>>>;
pub type Submissions = Arc<Mutex<Vec<(ProblemId, Vec<u8>)>>>;

/// Problem 42: one GLOBALIST bonus from problem 7 and one unrelated bonus.
pub fn problem_42() -> Problem {
    Problem::from_json(
        42,
        r#"{
            "hole": [[0, 0], [10, 0], [10, 10]],
            "epsilon": 150000,
            "bonuses": [
                {"type": "GLOBALIST", "position": 3, "problem": 7},
                {"type": "OTHER", "position": 1, "problem": 7}
            ]
        }"#,
    )
    .expect("problem 42 parses")
}

pub fn units_of(problem: &Problem) -> Vec<UnitOfWork> {
    SearchSpace::for_problem(problem, 10)
        .expect("search space")
        .collect()
}

/// `problem_42` with the GLOBALIST bonus selected.
pub fn unit_42_7() -> UnitOfWork {
    units_of(&problem_42())
        .into_iter()
        .find(|u| !u.bonuses.is_empty())
        .expect("non-empty subset")
}

pub fn unit_42_empty() -> UnitOfWork {
    units_of(&problem_42())
        .into_iter()
        .find(|u| u.bonuses.is_empty())
        .expect("empty subset")
}

#[derive(Debug, Clone)]
pub struct Script {
    pub baseline_body: String,
    pub baseline: Score,
    pub improved: Score,
    pub fail_baseline_eval: bool,
    pub solver_ok: bool,
    pub submit_ok: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            baseline_body: r#"{"vertices":[[0,0],[1,1]]}"#.into(),
            baseline: 30,
            improved: 18,
            fail_baseline_eval: false,
            solver_ok: true,
            submit_ok: true,
        }
    }
}

pub struct Harness {
    pub dir: tempfile::TempDir,
    pub calls: CallLog,
    pub submissions: Submissions,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
            calls: Arc::default(),
            submissions: Arc::default(),
        }
    }

    pub fn settings(&self) -> PipelineSettings {
        let root = self.dir.path();
        PipelineSettings {
            problems_dir: root.join("problems"),
            best_solutions_dir: root.join("best_solutions"),
            work_root: root.join("rsapg"),
            glucose_path: PathBuf::from("/opt/glucose"),
            max_neighbor: 15,
            final_solution_file: FINAL_FILE.into(),
        }
    }

    pub fn pipeline(&self, script: Script) -> Pipeline {
        Pipeline::new(
            self.settings(),
            Box::new(ScriptedEvaluator {
                script: script.clone(),
                calls: self.calls.clone(),
            }),
            Box::new(ScriptedSolver {
                ok: script.solver_ok,
                calls: self.calls.clone(),
            }),
            Box::new(FixedStore {
                body: script.baseline_body.clone(),
                calls: self.calls.clone(),
            }),
            Box::new(RecordingSubmitter {
                ok: script.submit_ok,
                calls: self.calls.clone(),
                submissions: self.submissions.clone(),
            }),
        )
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> Vec<(ProblemId, Vec<u8>)> {
        self.submissions.lock().unwrap().clone()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub struct FixedStore {
    body: String,
    calls: CallLog,
}

impl BaselineStore for FixedStore {
    fn fetch(&self, problem_id: ProblemId, bonuses: &[Bonus]) -> Result<String> {
        let ids: Vec<String> = bonuses.iter().map(|b| b.problem.to_string()).collect();
        self.calls
            .lock()
            .unwrap()
            .push(format!("fetch:{problem_id}:{}", ids.join(",")));
        Ok(self.body.clone())
    }
}

/// Scores the solver's final file as `improved`, anything else as `baseline`.
pub struct ScriptedEvaluator {
    script: Script,
    calls: CallLog,
}

impl Evaluator for ScriptedEvaluator {
    fn evaluate(&self, _problem_path: &Path, solution_path: &Path) -> Result<Score> {
        let name = file_name(solution_path);
        self.calls.lock().unwrap().push(format!("evaluate:{name}"));
        if name == FINAL_FILE {
            return Ok(self.script.improved);
        }
        if self.script.fail_baseline_eval {
            return Err(anyhow!("evaluator exited with status 101"));
        }
        Ok(self.script.baseline)
    }
}

/// Writes `IMPROVED_BODY` as the final iteration when told to succeed.
pub struct ScriptedSolver {
    ok: bool,
    calls: CallLog,
}

impl LocalSearchSolver for ScriptedSolver {
    fn improve(&self, req: &ImproveRequest) -> Result<SolverStatus> {
        let ids: Vec<String> = req.globalist.iter().map(|id| id.to_string()).collect();
        self.calls
            .lock()
            .unwrap()
            .push(format!("improve:{}", ids.join(",")));
        if !self.ok {
            return Ok(SolverStatus::Failed { code: Some(1) });
        }
        std::fs::create_dir_all(&req.work_dir)?;
        std::fs::write(req.work_dir.join(FINAL_FILE), IMPROVED_BODY)?;
        Ok(SolverStatus::Succeeded)
    }
}

pub struct RecordingSubmitter {
    ok: bool,
    calls: CallLog,
    submissions: Submissions,
}

impl Submitter for RecordingSubmitter {
    fn submit(&self, problem_id: ProblemId, solution: &[u8]) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("submit:{problem_id}"));
        if !self.ok {
            return Err(anyhow!("POST returned 500 Internal Server Error"));
        }
        self.submissions
            .lock()
            .unwrap()
            .push((problem_id, solution.to_vec()));
        Ok(())
    }
}
