use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use jobgrid_core::{DesiredJobSpec, EmailPolicy};

#[derive(Parser)]
#[command(name = "jobgrid")]
#[command(about = "Jobgrid command line interface — manage jobs on the Jobgrid platform")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Activate debug mode
    #[arg(long, global = true)]
    pub debug: bool,

    /// YAML config for the CLI. Only useful for platform admins.
    #[arg(long, global = true, default_value = "/etc/jobgrid-cli.cfg")]
    pub cfg: PathBuf,

    /// Override kubeconfig TLS cert path. Only useful for platform admins.
    #[arg(long, global = true)]
    pub cert: Option<PathBuf>,

    /// Override kubeconfig TLS key path. Only useful for platform admins.
    #[arg(long, global = true)]
    pub key: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List information on available container image types for jobs
    Images,
    /// Run a new job of your own
    Run(RunArgs),
    /// Show details of a job of your own
    Show(NameArg),
    /// List all running jobs of your own
    List(ListArgs),
    /// Delete a running job of your own
    Delete(NameArg),
    /// Delete all running jobs of your own
    Flush,
    /// Load a YAML file with job definitions and reconcile the running jobs with it
    Load(LoadArgs),
    /// Restart a running job
    Restart(NameArg),
}

#[derive(clap::Args)]
pub struct NameArg {
    /// Job name
    pub name: String,
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// New job name
    pub name: String,

    /// Full path of command to run in this job
    #[arg(long)]
    pub command: String,

    /// Image shortname (check them with `images`)
    #[arg(long)]
    pub image: String,

    /// Run the job with a cron-like schedule (example '1 * * * *')
    #[arg(long, group = "mode")]
    pub schedule: Option<String>,

    /// Run a continuous job
    #[arg(long, group = "mode")]
    pub continuous: bool,

    /// Run the job and wait for completion
    #[arg(long, group = "mode")]
    pub wait: bool,

    /// Don't store job stdout in `jobname`.out and stderr in `jobname`.err
    /// files in the user home directory
    #[arg(long)]
    pub no_filelog: bool,

    /// Location to store stdout logs for this job
    #[arg(short = 'o', long)]
    pub filelog_stdout: Option<String>,

    /// Location to store stderr logs for this job
    #[arg(short = 'e', long)]
    pub filelog_stderr: Option<String>,

    /// Retry policy of failed jobs
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=5))]
    pub retry: u8,

    /// Additional memory limit required for this job
    #[arg(long)]
    pub mem: Option<String>,

    /// Additional CPU limit required for this job
    #[arg(long)]
    pub cpu: Option<String>,

    /// Whether the system should email notifications about this job
    #[arg(long, value_enum, default_value_t = EmailsArg::None)]
    pub emails: EmailsArg,
}

impl RunArgs {
    pub fn to_spec(&self) -> DesiredJobSpec {
        DesiredJobSpec {
            name: self.name.clone(),
            command: self.command.clone(),
            image: self.image.clone(),
            schedule: self.schedule.clone(),
            continuous: self.continuous,
            memory: self.mem.clone(),
            cpu: self.cpu.clone(),
            retry: self.retry,
            emails: self.emails.into(),
            no_filelog: self.no_filelog,
            filelog_stdout: self.filelog_stdout.clone(),
            filelog_stderr: self.filelog_stderr.clone(),
            wait: self.wait,
            ..Default::default()
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum EmailsArg {
    #[default]
    None,
    All,
    Onfinish,
    Onfailure,
}

impl From<EmailsArg> for EmailPolicy {
    fn from(value: EmailsArg) -> Self {
        match value {
            EmailsArg::None => EmailPolicy::None,
            EmailsArg::All => EmailPolicy::All,
            EmailsArg::Onfinish => EmailPolicy::OnFinish,
            EmailsArg::Onfailure => EmailPolicy::OnFailure,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ListDisplayMode {
    #[default]
    Normal,
    Long,
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = ListDisplayMode::Normal)]
    pub output: ListDisplayMode,
}

#[derive(clap::Args)]
pub struct LoadArgs {
    /// Path to YAML file with job definitions
    pub file: PathBuf,

    /// Load a single job only
    #[arg(long)]
    pub job: Option<String>,
}
