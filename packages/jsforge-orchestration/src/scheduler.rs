//! Concurrent build driver.
//!
//! Submits one blocking unit of work per (artifact, step) to the externally
//! supplied executor, honouring DAG ordering: an artifact is submitted once
//! every direct dependency has finished its terminal step, and its own steps
//! run strictly in sequence. Before running a worker the unit consults the
//! slot marker, so finished work is reused and two writers never share a
//! slot. The first failure cancels the build; in-flight units observe the
//! cancellation at their next suspension point and drain without touching
//! markers.

use crate::step::StepKind;
use crate::workers;
use jsforge_core::{
    Artifact, ArtifactCoords, ArtifactGraph, BuildError, BuildRequest, CacheLayout, Result,
    StepResult, StepSlot, TaskLog,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// How a unit of work ended.
enum UnitOutcome {
    /// The step recorded a result; `executed` distinguishes a fresh worker
    /// run from a cache reuse. Once a step executes, the artifact's
    /// remaining steps ignore stale markers and re-run.
    Completed { result: StepResult, executed: bool },
    /// The unit observed cancellation and stopped without touching the slot.
    Cancelled,
}

impl UnitOutcome {
    fn reused(result: StepResult) -> Self {
        Self::Completed {
            result,
            executed: false,
        }
    }
}

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(25);

pub struct Scheduler {
    layout: CacheLayout,
}

impl Scheduler {
    pub fn new(layout: CacheLayout) -> Self {
        Self { layout }
    }

    pub fn for_request(request: &BuildRequest) -> Result<Self> {
        Ok(Self::new(CacheLayout::new(request.base())?))
    }

    /// Drives every artifact in the graph through the pipeline. Returns when
    /// the root records its terminal step, or surfaces the first failure
    /// after all in-flight work drains.
    pub async fn execute(&self, graph: &ArtifactGraph) -> Result<()> {
        let request = graph.root().request().clone();
        let parallelism = request.parallelism();

        struct Entry {
            artifact: Arc<Artifact>,
            next: Option<StepKind>,
            running: bool,
            stopped: bool,
            force: bool,
        }

        let mut entries: BTreeMap<ArtifactCoords, Entry> = graph
            .artifacts()
            .iter()
            .map(|artifact| {
                (
                    artifact.coords().clone(),
                    Entry {
                        artifact: artifact.clone(),
                        next: Some(StepKind::FIRST),
                        running: false,
                        stopped: false,
                        force: false,
                    },
                )
            })
            .collect();
        let direct_deps: BTreeMap<ArtifactCoords, Vec<ArtifactCoords>> = graph
            .artifacts()
            .iter()
            .map(|artifact| {
                (
                    artifact.coords().clone(),
                    artifact
                        .direct_deps()
                        .iter()
                        .map(|dep| dep.coords().clone())
                        .collect(),
                )
            })
            .collect();

        let mut completed: BTreeSet<ArtifactCoords> = BTreeSet::new();
        let mut first_error: Option<BuildError> = None;
        let mut in_flight = 0usize;
        let (tx, mut rx) = mpsc::unbounded_channel();

        loop {
            if first_error.is_none() && !request.is_cancelled() {
                let ready: Vec<ArtifactCoords> = entries
                    .iter()
                    .filter(|(coords, entry)| {
                        !entry.running
                            && !entry.stopped
                            && entry.next.is_some()
                            && direct_deps[*coords].iter().all(|dep| completed.contains(dep))
                    })
                    .map(|(coords, _)| coords.clone())
                    .collect();

                for coords in ready {
                    if in_flight >= parallelism {
                        break;
                    }
                    let entry = entries.get_mut(&coords).expect("known artifact");
                    let step = entry.next.expect("ready entries have a next step");
                    entry.running = true;
                    in_flight += 1;

                    debug!("submitting {coords} {step}");
                    let artifact = entry.artifact.clone();
                    let layout = self.layout.clone();
                    let tx = tx.clone();
                    let force = entry.force;
                    request.executor().spawn_blocking(move || {
                        let outcome = run_unit(&artifact, step, &layout, force);
                        let _ = tx.send((artifact.coords().clone(), step, outcome));
                    });
                }
            }

            if in_flight == 0 {
                break;
            }

            let Some((coords, step, outcome)) = rx.recv().await else {
                break;
            };
            in_flight -= 1;
            let entry = entries.get_mut(&coords).expect("known artifact");
            entry.running = false;

            match outcome {
                Ok(UnitOutcome::Completed { result, executed }) if result.advances() => {
                    if executed {
                        entry.force = true;
                    }
                    entry.next = step.next();
                    if entry.next.is_none() {
                        info!("{coords} complete");
                        completed.insert(coords);
                    }
                }
                Ok(UnitOutcome::Completed { .. }) => {
                    entry.stopped = true;
                    if first_error.is_none() {
                        let cause = request
                            .cancellation_cause()
                            .unwrap_or_else(|| format!("{coords} {step} failed"));
                        first_error = Some(BuildError::tool(step.as_str(), cause));
                    }
                }
                Ok(UnitOutcome::Cancelled) => {
                    entry.stopped = true;
                }
                Err(error) => {
                    entry.stopped = true;
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
            }
        }

        if let Some(error) = first_error {
            return Err(error);
        }
        if request.is_cancelled() {
            return Err(BuildError::Cancelled(
                request
                    .cancellation_cause()
                    .unwrap_or_else(|| "cancelled".to_string()),
            ));
        }
        if !completed.contains(graph.root().coords()) {
            return Err(BuildError::internal(
                "root artifact did not reach the terminal step",
            ));
        }
        Ok(())
    }
}

/// Runs one (artifact, step) unit: predicate skips, marker reuse, exclusive
/// slot locking, worker execution, marker and log writes. With `force` the
/// unit ignores existing markers because an earlier step of the same
/// artifact already re-ran.
fn run_unit(
    artifact: &Arc<Artifact>,
    step: StepKind,
    layout: &CacheLayout,
    force: bool,
) -> Result<UnitOutcome> {
    let request = artifact.request().clone();

    // Predicate skips record success without touching disk.
    if (artifact.is_bootstrap_or_jre() && step.skip_for_bootstrap_or_jre())
        || (!artifact.is_root() && step.skip_for_non_root())
    {
        return Ok(UnitOutcome::reused(StepResult::Success));
    }
    if request.is_cancelled() {
        return Ok(UnitOutcome::Cancelled);
    }

    let mut log = TaskLog::new(format!("{}-{step}", artifact.coords()));

    let slot = match layout.slot(artifact, step.directory_name()) {
        Ok(slot) => slot,
        Err(error) => {
            // Hashing failed, so the slot directory cannot exist yet; the
            // log goes to a timestamped file under the base directory.
            log.line(format!("{error}"));
            write_hash_failure_log(layout, artifact, &log);
            log.echo_failure();
            request.cancel(error.to_string());
            return Err(error);
        }
    };

    if !force {
        if let Some(result) = reusable_marker(&slot, step)? {
            debug!("{} {step} cache hit: {result:?}", artifact.coords());
            return Ok(UnitOutcome::reused(result));
        }
    }

    let _lock = loop {
        match slot.try_lock()? {
            Some(lock) => break lock,
            None => {
                // Another writer (possibly another process) holds the slot.
                // Await its completion and reuse whatever it records.
                std::thread::sleep(LOCK_POLL_INTERVAL);
                if request.is_cancelled() {
                    return Ok(UnitOutcome::Cancelled);
                }
                if !force {
                    if let Some(result) = reusable_marker(&slot, step)? {
                        return Ok(UnitOutcome::reused(result));
                    }
                }
            }
        }
    };

    // Lost a race to another writer between the marker check and the lock.
    if !force {
        if let Some(result) = reusable_marker(&slot, step)? {
            return Ok(UnitOutcome::reused(result));
        }
    }

    log.line("executing");
    match workers::execute(artifact, step, &slot, layout, &mut log) {
        Ok(result) => {
            slot.write_log(&log)?;
            slot.write_marker(result)?;
            if result == StepResult::Failed {
                log.echo_failure();
                let detail = log.lines().last().cloned().unwrap_or_default();
                request.cancel(format!("{} {step} failed: {detail}", artifact.coords()));
            }
            Ok(UnitOutcome::Completed {
                result,
                executed: true,
            })
        }
        Err(error) if error.is_cancelled() => {
            // Observed cancellation mid-step; existing markers stay intact.
            Ok(UnitOutcome::Cancelled)
        }
        Err(error) => {
            log.line(format!("{error}"));
            if slot.dir().exists() {
                let _ = slot.write_log(&log);
                let _ = slot.write_marker(StepResult::Failed);
            } else {
                write_hash_failure_log(layout, artifact, &log);
            }
            log.echo_failure();
            request.cancel(error.to_string());
            Err(error)
        }
    }
}

/// A recorded marker the scheduler may reuse. `Failed` attempts left no
/// reusable output and re-run. A success marker without its output payload
/// is an invariant violation.
fn reusable_marker(slot: &StepSlot, step: StepKind) -> Result<Option<StepResult>> {
    match slot.marker()? {
        Some(StepResult::Failed) | None => Ok(None),
        Some(StepResult::Success)
            if step.produces_output() && slot.existing_output().is_none() =>
        {
            Err(BuildError::internal(format!(
                "success marker without output in {}",
                slot.dir().display()
            )))
        }
        Some(result) => Ok(Some(result)),
    }
}

fn write_hash_failure_log(layout: &CacheLayout, artifact: &Artifact, log: &TaskLog) {
    let timestamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S");
    let path = layout.base().join(format!(
        "{}-{timestamp}.log",
        artifact.coords().directory_safe()
    ));
    if log.write_to(&path).is_ok() {
        tracing::error!("log file {}", path.display());
    }
}
