use super::{EvalReport, Evaluator, ImproveRequest, LocalSearchSolver, SolverStatus};
use crate::{config::Config, report::Score, search::join_ids, util::ensure_dir};
use anyhow::{Context, Result, anyhow};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tracing::{debug, warn};

const STDERR_TAIL_LINES: usize = 20;

/// Runs the `evaluate` binary and reads `dislikes` from its JSON stdout.
pub struct ProcessEvaluator {
    cmd: Vec<String>,
}

impl ProcessEvaluator {
    pub fn new(cfg: &Config) -> Result<Self> {
        split_cmd(&cfg.solver.evaluate_cmd).with_context(|| "solver.evaluate_cmd")?;
        Ok(Self {
            cmd: cfg.solver.evaluate_cmd.clone(),
        })
    }
}

impl Evaluator for ProcessEvaluator {
    fn evaluate(&self, problem_path: &Path, solution_path: &Path) -> Result<Score> {
        let (exe, args) = split_cmd(&self.cmd)?;
        debug!(
            "evaluate problem={} solution={}",
            problem_path.display(),
            solution_path.display()
        );

        let output = Command::new(exe)
            .args(args)
            .arg(problem_path)
            .arg(solution_path)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("spawning evaluator: {exe}"))?;

        if !output.status.success() {
            return Err(anyhow!(
                "evaluator failed ({}) on {}\n{}",
                output.status,
                solution_path.display(),
                stderr_tail(&output)
            ));
        }

        parse_dislikes(&output.stdout)
            .with_context(|| format!("evaluating {}", solution_path.display()))
    }
}

pub fn parse_dislikes(stdout: &[u8]) -> Result<Score> {
    let report: EvalReport =
        serde_json::from_slice(stdout).with_context(|| "parsing evaluator JSON output")?;
    Ok(report.dislikes)
}

/// Runs the SAT-backed hill climber. A nonzero exit is reported, not raised.
pub struct ProcessSolver {
    cmd: Vec<String>,
}

impl ProcessSolver {
    pub fn new(cfg: &Config) -> Result<Self> {
        split_cmd(&cfg.solver.hillclimber_cmd).with_context(|| "solver.hillclimber_cmd")?;
        Ok(Self {
            cmd: cfg.solver.hillclimber_cmd.clone(),
        })
    }
}

impl LocalSearchSolver for ProcessSolver {
    fn improve(&self, req: &ImproveRequest) -> Result<SolverStatus> {
        let (exe, args) = split_cmd(&self.cmd)?;
        ensure_dir(&req.work_dir)?;

        let solver_args = solver_args(req);
        debug!("hill climber {} {:?}", exe, solver_args);

        let output = Command::new(exe)
            .args(args)
            .args(&solver_args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("spawning hill climber: {exe}"))?;

        if output.status.success() {
            return Ok(SolverStatus::Succeeded);
        }

        warn!(
            "hill climber exited with {} for {}\n{}",
            output.status,
            req.work_dir.display(),
            stderr_tail(&output)
        );
        Ok(SolverStatus::Failed {
            code: output.status.code(),
        })
    }
}

/// Flags passed after the configured hill-climber command.
pub fn solver_args(req: &ImproveRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--glucose-path".into(),
        req.glucose_path.clone().into(),
        "--input-path".into(),
        req.problem_path.clone().into(),
        "--output-path".into(),
        req.solution_path.clone().into(),
        "--work-dir".into(),
        req.work_dir.clone().into(),
        "--max-neighbor".into(),
        req.max_neighbor.to_string().into(),
    ];
    if !req.globalist.is_empty() {
        args.push("--globalist".into());
        args.push(join_ids(&req.globalist).into());
    }
    args
}

fn split_cmd(cmd: &[String]) -> Result<(&str, &[String])> {
    match cmd.split_first() {
        Some((exe, args)) if !exe.trim().is_empty() => Ok((exe.as_str(), args)),
        _ => Err(anyhow!("empty command line")),
    }
}

fn stderr_tail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
