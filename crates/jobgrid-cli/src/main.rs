mod cli;
mod client;
mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use client::ApiClient;
use jobgrid_core::ServiceError;
use output::print_error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli).await {
        print_error(&format!("{err:#}"));
        if let Some(service_err) = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<ServiceError>())
        {
            if let Some(context) = service_err.context() {
                eprintln!("some additional context for the issue follows:");
                for (key, value) in context {
                    eprintln!("  {key} = {value}");
                }
            }
            if !service_err.is_user_error() {
                eprintln!("contact a platform admin if the issue persists");
            }
        }
        std::process::exit(1);
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stdout)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    if let Ok(user) = std::env::var("USER")
        && !user.starts_with("tools.")
    {
        tracing::warn!(
            "not running as the tool account? Likely to fail. Perhaps you forgot `become <tool>`?"
        );
    }

    let session = config::Session::load(&cli.cfg, cli.cert.as_deref(), cli.key.as_deref())
        .context("failed to load configuration, please contact a platform admin")?;
    debug!("session configuration generated correctly");
    let client = ApiClient::from_session(&session)?;

    match &cli.command {
        Commands::Images => commands::images::images(&client).await?,
        Commands::Run(args) => commands::jobs::run(&client, args).await?,
        Commands::Show(args) => commands::jobs::show(&client, &args.name).await?,
        Commands::List(args) => commands::jobs::list(&client, args.output).await?,
        Commands::Delete(args) => commands::jobs::delete(&client, &args.name).await?,
        Commands::Flush => commands::jobs::flush(&client).await?,
        Commands::Load(args) => {
            commands::load::load(&client, &args.file, args.job.as_deref()).await?;
        }
        Commands::Restart(args) => commands::jobs::restart(&client, &args.name).await?,
    }

    debug!("-- end of operations");
    Ok(())
}
