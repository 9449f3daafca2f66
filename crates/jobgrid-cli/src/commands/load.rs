//! Declarative job loading.
//!
//! Reads a YAML jobs file, diffs it against the live jobs, and converges:
//! stale and changed jobs are deleted first, their disappearance is
//! confirmed against the live listing, and only then are new and changed
//! jobs (re)created.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use jobgrid_core::{ApplyOptions, DesiredJobSpec, JobKind, apply, calculate_changes};

use crate::client::ApiClient;
use crate::commands::jobs::wait_for_job;

pub async fn load(client: &ApiClient, file: &Path, job_filter: Option<&str>) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("couldn't read jobs file '{}'", file.display()))?;
    let desired: Vec<DesiredJobSpec> = serde_yaml::from_str(&raw)
        .with_context(|| format!("couldn't parse jobs file '{}'", file.display()))?;
    debug!(count = desired.len(), file = %file.display(), "loaded job definitions");

    let live = client.list().await?;

    let single_job;
    let filter: Option<&dyn Fn(&str) -> bool> = match job_filter {
        Some(wanted) => {
            single_job = move |name: &str| name == wanted;
            Some(&single_job)
        }
        None => None,
    };

    let changes = calculate_changes(&desired, &live, filter);
    debug!(
        add = changes.add.len(),
        delete = changes.delete.len(),
        modify = changes.modify.len(),
        "computed changes"
    );

    apply(client, &changes, &desired, ApplyOptions::default())
        .await
        .context("could not load new jobs")?;

    for spec in &desired {
        if changes.needs_creation(&spec.name)
            && spec.wait
            && matches!(spec.kind(), JobKind::OneShot)
        {
            wait_for_job(client, &spec.name).await?;
        }
    }

    Ok(())
}
