use crate::{
    config::Config,
    dispatch::{PlanOptions, RunPlan, dispatch as dispatch_units},
    engine::process::{ProcessEvaluator, ProcessSolver},
    pipeline::{Pipeline, PipelineSettings},
    problem::{ProblemCatalog, ProblemId},
    service::HttpService,
    sink::ResultLog,
    util::{ensure_dir, now_rfc3339},
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "globalist-sweep")]
#[command(about = "Hill-climb every GLOBALIST bonus combination of every problem")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./globalist-sweep.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch, improve, evaluate and submit every unit of work.
    Run {
        /// Only this problem; otherwise every problem in paths.problems_dir.
        #[arg(long)]
        problem: Option<ProblemId>,
        #[arg(long)]
        glucose_path: Option<PathBuf>,
        #[arg(long)]
        n_threads: Option<usize>,
        /// Run only the first few units on a single worker.
        #[arg(long)]
        dryrun: bool,
    },
    /// Print the units of work as JSON lines without running them.
    Plan {
        #[arg(long)]
        problem: Option<ProblemId>,
        #[arg(long)]
        dryrun: bool,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let mut cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    match &args.cmd {
        Command::Run {
            problem,
            glucose_path,
            n_threads,
            dryrun,
        } => {
            if let Some(p) = glucose_path {
                cfg.solver.glucose_path = p.display().to_string();
            }
            if let Some(n) = n_threads {
                cfg.run.n_threads = *n;
            }
            let log_path = resolve_log_path(&cfg);
            let _guard = init_logging(&args, &cfg, log_path.as_deref())?;
            run(&cfg, *problem, *dryrun)
        }
        Command::Plan { problem, dryrun } => {
            let _guard = init_logging(&args, &cfg, None)?;
            plan(&cfg, *problem, *dryrun)
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    ["globalist-sweep.toml", "globalist-sweep.example.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

fn init_logging(
    args: &Args,
    cfg: &Config,
    file_path: Option<&Path>,
) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_names(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_names(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_thread_names(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn select_problems(
    catalog: &ProblemCatalog,
    problem: Option<ProblemId>,
) -> Result<Vec<ProblemId>> {
    match problem {
        Some(id) => Ok(vec![id]),
        None => {
            let ids = catalog.discover()?;
            if ids.is_empty() {
                return Err(anyhow!(
                    "no problem descriptions found in {}",
                    catalog.dir().display()
                ));
            }
            Ok(ids)
        }
    }
}

fn build_plan(cfg: &Config, problem: Option<ProblemId>, dryrun: bool) -> Result<RunPlan> {
    let catalog = ProblemCatalog::new(&cfg.paths.problems_dir);
    let problem_ids = select_problems(&catalog, problem)?;
    let opts = PlanOptions {
        workers: cfg.run.n_threads,
        dryrun,
        dryrun_limit: cfg.run.dryrun_limit,
        warn_globalist_over: cfg.search.warn_globalist_over,
    };
    RunPlan::build(&catalog, &problem_ids, &opts)
}

fn plan(cfg: &Config, problem: Option<ProblemId>, dryrun: bool) -> Result<()> {
    let plan = build_plan(cfg, problem, dryrun)?;
    for unit in &plan.units {
        println!("{}", serde_json::to_string(&unit.planned())?);
    }
    Ok(())
}

fn run(cfg: &Config, problem: Option<ProblemId>, dryrun: bool) -> Result<()> {
    let plan = build_plan(cfg, problem, dryrun)?;

    let http = HttpService::new(cfg)?;
    let pipeline = Pipeline::new(
        PipelineSettings::from_config(cfg),
        Box::new(ProcessEvaluator::new(cfg)?),
        Box::new(ProcessSolver::new(cfg)?),
        Box::new(http.clone()),
        Box::new(http),
    );

    ensure_dir(Path::new(&cfg.paths.best_solutions_dir))?;
    ensure_dir(Path::new(&cfg.paths.work_root))?;

    let mut results = ResultLog::open(Path::new(&cfg.paths.results_log))?;
    results.banner(if dryrun { "dryrun" } else { "run" })?;
    info!(
        "results -> {} units={} workers={}",
        results.path().display(),
        plan.units.len(),
        plan.workers
    );

    let started = now_rfc3339();
    let summary = dispatch_units(&pipeline, plan.units, plan.workers, &mut results)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "started": started,
            "finished": now_rfc3339(),
            "results_log": results.path(),
            "skipped_problems": plan.skipped,
            "summary": summary,
        }))?
    );

    Ok(())
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file || cfg.logging.file_path.is_empty() {
        return None;
    }
    Some(PathBuf::from(&cfg.logging.file_path))
}
