//! Apply orchestrator.
//!
//! Consumes a [`ChangeSet`] and drives the platform toward it through a
//! [`JobService`]. The one ordering guarantee everything else hangs on:
//! every deletion in the batch is issued, and observed gone from the live
//! listing, strictly before any creation in the same batch is issued.
//! Otherwise a recreated job could collide with the old job of the same
//! name that the platform has not finished tearing down.
//!
//! Calls are sequential and there is no rollback: if a creation fails
//! partway through, already-created jobs in the batch remain.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::error::{ApplyError, ServiceError};
use crate::model::DesiredJobSpec;
use crate::reconcile::ChangeSet;

/// Collaborator interface to the job-management service.
///
/// Implemented by the HTTP client in the CLI crate; tests substitute an
/// in-memory fake. Deleting a job that does not exist must not be reported
/// as an error.
#[async_trait]
pub trait JobService: Send + Sync {
    /// Creates a job from its definition.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::AlreadyExists`] when a job with the same
    /// name is already live, distinguishable from infrastructure failures.
    async fn create_job(&self, spec: &DesiredJobSpec) -> Result<(), ServiceError>;

    /// Deletes a job by name. Idempotent from the caller's perspective.
    async fn delete_job(&self, name: &str) -> Result<(), ServiceError>;

    /// Names of all currently live jobs. Used for the convergence poll.
    async fn list_live_names(&self) -> Result<BTreeSet<String>, ServiceError>;
}

/// Timing knobs for the convergence poll.
#[derive(Debug, Clone, Copy)]
pub struct ApplyOptions {
    /// How long to sleep between live listings.
    pub poll_interval: Duration,
    /// Total time to wait for deletions to be observed before giving up.
    pub timeout: Duration,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(5 * 60),
        }
    }
}

/// Applies a change-set: deletes `delete ∪ modify`, waits until the live
/// listing confirms they are gone, then creates `add ∪ modify` from the
/// corresponding definitions in `desired`.
///
/// Creation follows the input order of `desired`; duplicate names are
/// created once, from their last definition.
///
/// # Errors
///
/// [`ApplyError::ConvergenceTimeout`] if deleted jobs are still live when
/// the bounded wait elapses (no creation is attempted, issued deletions
/// stand). [`ApplyError::CreateConflict`] if the platform reports a name
/// collision on creation. Any other collaborator failure aborts at the
/// point of occurrence.
pub async fn apply(
    service: &dyn JobService,
    changes: &ChangeSet,
    desired: &[DesiredJobSpec],
    options: ApplyOptions,
) -> Result<(), ApplyError> {
    let doomed = changes.doomed();
    if !doomed.is_empty() {
        for name in &doomed {
            service.delete_job(name).await?;
        }
        wait_until_deleted(service, &doomed, options).await?;
    }

    let mut last_definition: BTreeMap<&str, &DesiredJobSpec> = BTreeMap::new();
    for spec in desired {
        last_definition.insert(spec.name.as_str(), spec);
    }

    let mut created: BTreeSet<&str> = BTreeSet::new();
    for spec in desired {
        let name = spec.name.as_str();
        if !changes.needs_creation(name) || !created.insert(name) {
            continue;
        }
        match service.create_job(last_definition[name]).await {
            Ok(()) => info!(job = %name, "job created"),
            Err(ServiceError::AlreadyExists { name }) => {
                return Err(ApplyError::CreateConflict { name });
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

async fn wait_until_deleted(
    service: &dyn JobService,
    doomed: &BTreeSet<String>,
    options: ApplyOptions,
) -> Result<(), ApplyError> {
    let started = Instant::now();
    let mut pending = doomed.clone();

    while started.elapsed() < options.timeout {
        debug!(
            count = pending.len(),
            "waiting for old jobs to be gone, sleeping {}s",
            options.poll_interval.as_secs()
        );
        sleep(options.poll_interval).await;

        let live = service.list_live_names().await?;
        pending = doomed
            .iter()
            .filter(|name| live.contains(*name))
            .cloned()
            .collect();
        if pending.is_empty() {
            return Ok(());
        }
    }

    Err(ApplyError::ConvergenceTimeout {
        pending,
        waited: started.elapsed(),
    })
}
