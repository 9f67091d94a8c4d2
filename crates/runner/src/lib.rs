//! Task runners: `query` for single monolithic fetches, `query_multi` for
//! large batches of independent fetch operations.
//!
//! Both check the snapshot store before doing any work, report live progress
//! while running, and persist their results so repeated pipeline runs are
//! incremental. The batch runner additionally bounds concurrency, isolates
//! per-task failures, and returns outcomes positionally aligned to its
//! input.

mod task;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use gleaner_cache::SnapshotStore;
use gleaner_core::text::{count, truncate_middle};
use gleaner_core::{Error, IsEmpty, Outcome, Result};
use gleaner_progress::{Reporter, TaskState};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Semaphore;

pub use gleaner_core::DEFAULT_CONCURRENCY;
pub use task::{Task, TaskHandle};

/// Failure messages longer than this are middle-truncated before grouping.
const FAILURE_MESSAGE_LIMIT: usize = 80;

/// Run one long, expensive fetch operation with snapshot caching.
///
/// A present snapshot short-circuits the operation entirely. An empty result
/// is treated as a failure even when the operation itself succeeded, so a
/// no-op upstream response is never persisted as valid data. On failure
/// nothing is written.
pub async fn query<T, F, Fut>(
    snapshots: &SnapshotStore,
    snapshot: Option<&str>,
    func: F,
) -> Result<T>
where
    T: Serialize + DeserializeOwned + IsEmpty,
    F: FnOnce(TaskHandle) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if let Some(name) = snapshot {
        if let Some(value) = snapshots.load::<T>(name) {
            tracing::info!(name, "using cached snapshot");
            return Ok(value);
        }
    }

    let reporter = Arc::new(Reporter::new(1));
    if let Some(name) = snapshot {
        reporter.set_label(0, name);
    }
    reporter.update(0, TaskState::Running(0.0));

    let handle = TaskHandle::new(0, Arc::clone(&reporter));
    let result = func(handle).await;

    let result = match result {
        Ok(value) if value.is_empty_value() => {
            Err(Error::empty_result(snapshot.unwrap_or("query")))
        }
        other => other,
    };

    match result {
        Ok(value) => {
            reporter.update(0, TaskState::Success);
            reporter.finish();
            if let Some(name) = snapshot {
                snapshots.save(name, &value)?;
            }
            Ok(value)
        }
        Err(error) => {
            reporter.update(0, TaskState::Error);
            reporter.finish();
            tracing::error!(%error, "query failed");
            Err(error)
        }
    }
}

/// Run many independent fetch operations under a bounded concurrency budget.
///
/// Returns exactly one [`Outcome`] per input task, in submission order,
/// regardless of completion order. Individual failures are isolated, counted,
/// and logged grouped by truncated message; only if *every* task fails does
/// the batch itself fail. On (partial or full) success the successful subset
/// is persisted as the named snapshot.
///
/// Snapshot granularity is whole-batch: a present snapshot is returned
/// wholesale and no task is re-run. To retry a partially failed batch,
/// delete the snapshot.
pub async fn query_multi<T>(
    snapshots: &SnapshotStore,
    tasks: Vec<Task<T>>,
    snapshot: Option<&str>,
    concurrency: usize,
) -> Result<Vec<Outcome<T>>>
where
    T: Serialize + DeserializeOwned + IsEmpty + Send + 'static,
{
    if let Some(name) = snapshot {
        if let Some(values) = snapshots.load::<Vec<T>>(name) {
            tracing::info!(name, results = values.len(), "using cached snapshot");
            return Ok(values.into_iter().map(Outcome::Success).collect());
        }
    }

    let total = tasks.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    tracing::info!(tasks = total, concurrency, "running batch");

    let reporter = Arc::new(Reporter::new(total));
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let mut handles = Vec::with_capacity(total);
    for (index, task) in tasks.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let reporter = Arc::clone(&reporter);
        handles.push(tokio::spawn(async move {
            // permit is held for the whole task and released on every path,
            // including panics
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return Outcome::Failure(Error::configuration("worker pool closed")),
            };
            reporter.update(index, TaskState::Running(0.0));

            let handle = TaskHandle::new(index, Arc::clone(&reporter));
            let outcome = match task.run(handle).await {
                Ok(value) if value.is_empty_value() => {
                    let context = reporter
                        .label(index)
                        .unwrap_or_else(|| format!("task {index}"));
                    Outcome::Failure(Error::empty_result(context))
                }
                Ok(value) => Outcome::Success(value),
                Err(error) => Outcome::Failure(error),
            };

            let state = if outcome.is_success() {
                TaskState::Success
            } else {
                TaskState::Error
            };
            reporter.update(index, state);
            outcome
        }));
    }

    // one outcome per input task, in input order, whatever finished first
    let mut outcomes: Vec<Outcome<T>> = Vec::with_capacity(total);
    for (index, handle) in handles.into_iter().enumerate() {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(error) => {
                reporter.update(index, TaskState::Error);
                Outcome::Failure(Error::configuration(format!("task panicked: {error}")))
            }
        };
        outcomes.push(outcome);
    }
    reporter.finish();

    log_failures(&outcomes, total);

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    if succeeded == 0 {
        return Err(Error::NoSuccesses { total });
    }

    if let Some(name) = snapshot {
        let successes: Vec<&T> = outcomes.iter().filter_map(Outcome::as_success).collect();
        snapshots.save(name, &successes)?;
    }

    Ok(outcomes)
}

/// Log failures grouped by truncated message, one line per distinct message.
fn log_failures<T>(outcomes: &[Outcome<T>], total: usize) {
    let mut groups: BTreeMap<String, usize> = BTreeMap::new();
    for error in outcomes.iter().filter_map(Outcome::error) {
        let message = truncate_middle(&error.to_string(), FAILURE_MESSAGE_LIMIT);
        *groups.entry(message).or_default() += 1;
    }
    if groups.is_empty() {
        tracing::info!("all {} tasks succeeded", count(total));
        return;
    }

    let failed: usize = groups.values().sum();
    for (message, occurrences) in &groups {
        tracing::warn!(occurrences, "{message}");
    }
    tracing::warn!(
        "{} of {} tasks failed",
        count(failed),
        count(total)
    );
}
