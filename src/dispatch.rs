use crate::{
    problem::{ProblemCatalog, ProblemId},
    report::{Outcome, OutcomeKind, RunSummary, Stage},
    search::{SearchSpace, UnitOfWork},
    sink::ResultSink,
};
use anyhow::{Context, Result, anyhow};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, PoisonError, mpsc};
use tracing::{debug, error, info, warn};

/// Runs one unit to completion. Shared by every worker thread.
pub trait UnitRunner: Sync {
    fn run(&self, unit: &UnitOfWork) -> Outcome;
}

#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub workers: usize,
    pub dryrun: bool,
    pub dryrun_limit: usize,
    pub warn_globalist_over: usize,
}

/// The full, ordered list of units for one run and the pool size to run it on.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub units: Vec<UnitOfWork>,
    pub workers: usize,
    /// Problems whose description could not be expanded.
    pub skipped: Vec<ProblemId>,
}

impl RunPlan {
    pub fn build(
        catalog: &ProblemCatalog,
        problem_ids: &[ProblemId],
        opts: &PlanOptions,
    ) -> Result<Self> {
        let mut units = Vec::new();
        let mut skipped = Vec::new();

        for &id in problem_ids {
            let expanded = catalog.load(id).and_then(|problem| {
                SearchSpace::for_problem(&problem, opts.warn_globalist_over)
            });
            match expanded {
                Ok(space) => {
                    debug!("problem {} expands to {} units", id, space.total());
                    units.extend(space);
                }
                Err(err) if problem_ids.len() > 1 => {
                    error!("skipping problem {id}: {err}");
                    skipped.push(id);
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("expanding problem {id}"));
                }
            }
        }

        let mut workers = opts.workers.max(1);
        if opts.dryrun {
            units.truncate(opts.dryrun_limit);
            workers = 1;
        }

        info!(
            "plan units={} problems={} skipped={} workers={}",
            units.len(),
            problem_ids.len() - skipped.len(),
            skipped.len(),
            workers
        );

        Ok(Self {
            units,
            workers,
            skipped,
        })
    }
}

/// A panicking runner still yields an outcome, so the worker keeps pulling.
fn run_guarded<R>(runner: &R, unit: &UnitOfWork) -> Outcome
where
    R: UnitRunner + ?Sized,
{
    catch_unwind(AssertUnwindSafe(|| runner.run(unit))).unwrap_or_else(|payload| {
        error!("unit {} panicked: {}", unit.key(), panic_message(&*payload));
        Outcome::new(
            unit,
            OutcomeKind::Error {
                stage: Stage::Panic,
                baseline: None,
                improved: None,
            },
        )
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

/// Runs every unit exactly once on a pool of `workers` threads pulling from
/// one shared queue. Outcomes are recorded on the calling thread in the order
/// they finish.
pub fn dispatch<R>(
    runner: &R,
    units: Vec<UnitOfWork>,
    workers: usize,
    sink: &mut dyn ResultSink,
) -> Result<RunSummary>
where
    R: UnitRunner + ?Sized,
{
    let total = units.len();
    let workers = workers.max(1).min(total.max(1));
    let queue = Mutex::new(units.into_iter().enumerate());
    let (tx, rx) = mpsc::channel::<Outcome>();
    let mut summary = RunSummary::default();

    info!("dispatch units={} workers={}", total, workers);

    let panicked = std::thread::scope(|scope| -> Result<usize> {
        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let tx = tx.clone();
            let queue = &queue;
            let handle = std::thread::Builder::new()
                .name(format!("sweep-worker-{worker}"))
                .spawn_scoped(scope, move || {
                    loop {
                        let next = queue
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .next();
                        let Some((index, unit)) = next else {
                            break;
                        };
                        debug!(worker, index, "picked {}", unit.key());
                        if tx.send(run_guarded(runner, &unit)).is_err() {
                            break;
                        }
                    }
                })
                .with_context(|| format!("spawning worker {worker}"))?;
            handles.push(handle);
        }
        drop(tx);

        for outcome in rx {
            summary.tally(&outcome);
            if let Err(err) = sink.record(&outcome) {
                summary.sink_errors += 1;
                error!("failed to record `{outcome}`: {err:#}");
            }
            debug!("recorded {}/{}", summary.total, total);
        }

        Ok(handles.into_iter().filter_map(|h| h.join().err()).count())
    })?;

    if panicked > 0 {
        return Err(anyhow!(
            "{panicked} worker(s) panicked; recorded {} of {} units",
            summary.total,
            total
        ));
    }
    if summary.sink_errors > 0 {
        warn!(
            "{} outcome(s) could not be written to the results log",
            summary.sink_errors
        );
    }

    Ok(summary)
}
