//! `jobwatch` -- track and control jobs on a remote job service.
//!
//! Configuration comes from the environment (and a `.env` file if
//! present); see `ClientConfig::from_env` and `PollConfig::from_env` for
//! the variables and their defaults. `--api-url` overrides
//! `JOBWATCH_API_URL`.

mod commands;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use jobwatch_client::ClientConfig;
use jobwatch_core::{JobCategory, JobId};
use jobwatch_orchestrator::PollConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::Context;

#[derive(Parser, Debug)]
#[command(name = "jobwatch", version)]
#[command(about = "Track and control jobs on a remote job service")]
struct Cli {
    /// Base URL of the job service
    #[arg(long, global = true, env = "JOBWATCH_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the service and stream job events until Ctrl-C
    Watch {
        /// Print every event as a JSON line
        #[arg(long)]
        json: bool,
    },
    /// List jobs, of one category or all of them
    List { category: Option<JobCategory> },
    /// Show one job's status and progress
    Status { category: JobCategory, job_id: JobId },
    /// Print a completed job's results
    Results { category: JobCategory, job_id: JobId },
    /// Cancel a queued or running job
    Cancel {
        category: JobCategory,
        job_id: JobId,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete a job and its results
    Delete {
        category: JobCategory,
        job_id: JobId,
        #[arg(short, long)]
        yes: bool,
    },
    /// Start a new job
    Start {
        category: JobCategory,
        /// Start configuration as a JSON object; omitted fields use defaults
        #[arg(long)]
        config: Option<String>,
        /// Job id to use instead of a service-generated one
        #[arg(long)]
        job_id: Option<String>,
    },
    /// Show service health and per-category job counts
    Health,
    /// Show the service's worker log tail
    Logs {
        /// Clear the log instead of printing it
        #[arg(long)]
        clear: bool,
    },
    /// Cancel every running job on the service
    CancelAll {
        #[arg(short, long)]
        yes: bool,
    },
    /// Restart the service's workers
    Restart {
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut client_config = ClientConfig::from_env()?;
    if let Some(api_url) = cli.api_url {
        client_config = client_config.with_api_url(api_url);
    }
    let poll_config = PollConfig::from_env()?;
    tracing::debug!(api_url = %client_config.api_url, ?poll_config, "Configuration loaded");

    let ctx = Context::new(client_config, poll_config);

    match cli.command {
        Command::Watch { json } => commands::watch(&ctx, json).await,
        Command::List { category } => commands::list(&ctx, category).await,
        Command::Status { category, job_id } => commands::status(&ctx, category, job_id).await,
        Command::Results { category, job_id } => commands::results(&ctx, category, job_id).await,
        Command::Cancel {
            category,
            job_id,
            yes,
        } => commands::cancel(&ctx, category, job_id, yes).await,
        Command::Delete {
            category,
            job_id,
            yes,
        } => commands::delete(&ctx, category, job_id, yes).await,
        Command::Start {
            category,
            config,
            job_id,
        } => commands::start(&ctx, category, config, job_id).await,
        Command::Health => commands::health(&ctx).await,
        Command::Logs { clear } => commands::logs(&ctx, clear).await,
        Command::CancelAll { yes } => commands::cancel_all(&ctx, yes).await,
        Command::Restart { yes } => commands::restart(&ctx, yes).await,
    }
}
