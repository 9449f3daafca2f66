//! Single-job operations: run, show, list, delete, flush, restart.

use std::time::Duration;

use anyhow::{Result, bail};
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::cli::{ListDisplayMode, RunArgs};
use crate::client::ApiClient;
use crate::output;

// for --wait: 5 minutes timeout, check every 5 seconds
const WAIT_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const WAIT_SLEEP: Duration = Duration::from_secs(5);

pub async fn run(client: &ApiClient, args: &RunArgs) -> Result<()> {
    let spec = args.to_spec();
    client.run(&spec).await?;
    debug!("job was created");

    if spec.wait {
        wait_for_job(client, &spec.name).await?;
    }
    Ok(())
}

/// Polls a one-shot job until it completes, fails, or the wait times out.
/// A 404 means the job finished and was already cleaned up.
pub async fn wait_for_job(client: &ApiClient, name: &str) -> Result<()> {
    let started = Instant::now();
    while started.elapsed() < WAIT_TIMEOUT {
        sleep(WAIT_SLEEP).await;

        let job = match client.show(name).await {
            Ok(job) => job,
            Err(err) if err.is_not_found() => {
                info!(job = %name, "job completed (and already deleted)");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        match job.status_short.as_deref() {
            Some("Completed") => {
                info!(job = %name, "job completed");
                return Ok(());
            }
            Some("Failed") => {
                println!("{}", output::job_details_table(&job));
                bail!("job '{name}' failed");
            }
            _ => {}
        }
    }

    if let Ok(job) = client.show(name).await {
        println!("{}", output::job_details_table(&job));
    }
    bail!(
        "timed out {} seconds waiting for job '{name}' to complete",
        WAIT_TIMEOUT.as_secs()
    );
}

pub async fn show(client: &ApiClient, name: &str) -> Result<()> {
    let job = client.show(name).await?;
    println!("{}", output::job_details_table(&job));
    Ok(())
}

pub async fn list(client: &ApiClient, mode: ListDisplayMode) -> Result<()> {
    let jobs = client.list().await?;
    if jobs.is_empty() {
        debug!("no jobs to be listed");
        return Ok(());
    }
    println!("{}", output::jobs_table(&jobs, mode));
    Ok(())
}

pub async fn delete(client: &ApiClient, name: &str) -> Result<()> {
    client.delete(name).await?;
    debug!("job was deleted (if it existed anyway, we didn't check)");
    Ok(())
}

pub async fn flush(client: &ApiClient) -> Result<()> {
    client.flush().await?;
    debug!("all jobs were flushed (if any existed anyway, we didn't check)");
    Ok(())
}

pub async fn restart(client: &ApiClient, name: &str) -> Result<()> {
    client.restart(name).await?;
    output::print_success(&format!("job '{name}' was restarted"));
    Ok(())
}
