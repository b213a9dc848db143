//! Handlers for each `jobwatch` subcommand.
//!
//! One-shot commands run against a scheduler that is never started: they
//! refresh only what they need and print the resulting registry rows.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use jobwatch_client::{
    Ack, ClientConfig, JobService, JobServiceClient, StartConfig, StartRequest,
};
use jobwatch_core::{JobCategory, JobId};
use jobwatch_events::{EventBus, JobEvent, ProgressLog};
use jobwatch_orchestrator::{CommandDispatcher, PollConfig, PollScheduler};
use tokio::sync::broadcast::error::RecvError;

use crate::render;

/// Service client, scheduler and dispatcher shared by every command.
pub struct Context {
    client: Arc<JobServiceClient>,
    scheduler: Arc<PollScheduler>,
    dispatcher: CommandDispatcher,
}

impl Context {
    pub fn new(client_config: ClientConfig, poll_config: PollConfig) -> Self {
        let client = Arc::new(JobServiceClient::new(client_config));
        let service: Arc<dyn JobService> = client.clone();
        let scheduler = PollScheduler::new(service, Arc::new(EventBus::default()), poll_config);
        let dispatcher = CommandDispatcher::new(Arc::clone(&scheduler));
        Self {
            client,
            scheduler,
            dispatcher,
        }
    }

    fn print_category(&self, category: JobCategory) {
        println!(
            "{}",
            render::jobs_table(&self.scheduler.snapshot(), &[category])
        );
    }
}

fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?;
    if !confirmed {
        println!("Aborted");
    }
    Ok(confirmed)
}

fn print_ack(ack: &Ack) {
    println!("{}", ack.message.as_deref().unwrap_or("OK"));
}

/// Line shown on stderr for `event` while watching.
///
/// Only the initial-load escalation is shown. Background refresh failures
/// stay in the log, where the scheduler already reports them.
fn watch_notice(event: &JobEvent) -> Option<String> {
    match event {
        JobEvent::InitialLoadFailed {
            categories,
            message,
        } => Some(format!(
            "Initial load failed for {categories:?}: {message}"
        )),
        _ => None,
    }
}

/// Run the orchestrator until Ctrl-C, streaming events as they happen.
pub async fn watch(ctx: &Context, json: bool) -> Result<()> {
    let scheduler = &ctx.scheduler;
    let progress_log = tokio::spawn(ProgressLog::run(scheduler.subscribe()));
    let mut events = scheduler.subscribe();

    tracing::info!(api_url = %ctx.client.api_url(), "Watching jobs");
    scheduler.start();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping");
                break;
            }
            received = events.recv() => match received {
                Ok(timed) if json => println!("{}", serde_json::to_string(&timed)?),
                Ok(timed) => {
                    if let Some(notice) = watch_notice(&timed.event) {
                        eprintln!("{notice}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    scheduler.shutdown().await;
    progress_log.abort();

    if !json {
        println!(
            "{}",
            render::jobs_table(&scheduler.snapshot(), &JobCategory::ALL)
        );
    }
    Ok(())
}

pub async fn list(ctx: &Context, category: Option<JobCategory>) -> Result<()> {
    let categories = match category {
        Some(category) => vec![category],
        None => JobCategory::ALL.to_vec(),
    };
    for &category in &categories {
        ctx.scheduler
            .refresh_category(category)
            .await
            .with_context(|| format!("Failed to list {category} jobs"))?;
    }
    println!(
        "{}",
        render::jobs_table(&ctx.scheduler.snapshot(), &categories)
    );
    Ok(())
}

pub async fn status(ctx: &Context, category: JobCategory, job_id: JobId) -> Result<()> {
    let record = ctx.client.get_status(category, &job_id).await?;
    println!("{}", render::job_detail(category, &record));
    Ok(())
}

pub async fn results(ctx: &Context, category: JobCategory, job_id: JobId) -> Result<()> {
    ctx.scheduler.refresh_category(category).await?;
    let payload = ctx.dispatcher.get_results(category, &job_id).await?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

pub async fn cancel(
    ctx: &Context,
    category: JobCategory,
    job_id: JobId,
    assume_yes: bool,
) -> Result<()> {
    if !confirm(&format!("Cancel {category} job '{job_id}'?"), assume_yes)? {
        return Ok(());
    }
    let ack = ctx.dispatcher.cancel(category, &job_id).await?;
    print_ack(&ack);
    ctx.print_category(category);
    Ok(())
}

pub async fn delete(
    ctx: &Context,
    category: JobCategory,
    job_id: JobId,
    assume_yes: bool,
) -> Result<()> {
    if !confirm(
        &format!("Delete {category} job '{job_id}' and its results?"),
        assume_yes,
    )? {
        return Ok(());
    }
    let ack = ctx.dispatcher.delete(category, &job_id).await?;
    print_ack(&ack);
    ctx.print_category(category);
    Ok(())
}

pub async fn start(
    ctx: &Context,
    category: JobCategory,
    config: Option<String>,
    job_id: Option<String>,
) -> Result<()> {
    let config = match config {
        Some(raw) => {
            let value = serde_json::from_str(&raw).context("--config is not valid JSON")?;
            StartConfig::from_json(category, value)
                .with_context(|| format!("Invalid {category} start configuration"))?
        }
        None => StartConfig::default_for(category),
    };
    let mut request = StartRequest::new(config);
    if let Some(job_id) = job_id {
        request = request.with_job_id(job_id);
    }

    let started = ctx.dispatcher.start(&request).await?;
    println!(
        "{} ({}): {}",
        started.job_id, started.status, started.message
    );
    ctx.print_category(category);
    Ok(())
}

pub async fn health(ctx: &Context) -> Result<()> {
    let health = ctx.client.health().await?;
    let stamp = health
        .timestamp
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".into());
    println!("Service {} at {}", health.status, stamp);
    println!("{}", render::health_table(&health));
    if !health.is_healthy() {
        anyhow::bail!("Service reports status '{}'", health.status);
    }
    Ok(())
}

pub async fn logs(ctx: &Context, clear: bool) -> Result<()> {
    if clear {
        print_ack(&ctx.client.clear_terminal_logs().await?);
        return Ok(());
    }
    let logs = ctx.client.terminal_logs().await?;
    println!("{}", render::logs_table(&logs));
    println!("{} of {} entries", logs.logs.len(), logs.total_logs);
    Ok(())
}

pub async fn cancel_all(ctx: &Context, assume_yes: bool) -> Result<()> {
    if !confirm("Cancel every running job on the service?", assume_yes)? {
        return Ok(());
    }
    let ack = ctx.dispatcher.cancel_all_running().await?;
    print_ack(&ack);
    println!(
        "{}",
        render::jobs_table(&ctx.scheduler.snapshot(), &JobCategory::ALL)
    );
    Ok(())
}

pub async fn restart(ctx: &Context, assume_yes: bool) -> Result<()> {
    if !confirm(
        "Restart the service workers? Running jobs will be lost.",
        assume_yes,
    )? {
        return Ok(());
    }
    print_ack(&ctx.client.emergency_restart().await?);
    Ok(())
}
