mod background_service;
mod config;
mod dto;
mod infrastructure;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use colored::Colorize;
use domain::model::vo::{SubmitOutcome, SubmitReport};
use tracing_subscriber::EnvFilter;

use self::background_service::prelude::*;
use self::config::{build_config, AgentConfig};
use self::dto::TaskFile;
use self::infrastructure::ioc::Container;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = build_config().with_context(|| "Failed to build config".red())?;
    let agent_config: AgentConfig =
        config.try_deserialize().with_context(|| "Invalid config".red())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let tasks = TaskFile::load(&agent_config.tasks_file)
        .await
        .with_context(|| "Cannot load tasks".red())?;
    let container = Arc::new(
        Container::new(&agent_config, tasks.global_environment)
            .with_context(|| "Cannot build IOC container".red())?,
    );

    let submissions = tasks.tasks.into_iter().map(|task| {
        let container = container.clone();
        tokio::spawn(async move {
            let task_id = task.id.clone();
            (task_id, container.submit.submit(task.into()).await)
        })
    });
    let jobs = Arc::new(ActiveJobs::new());
    for handle in futures::future::join_all(submissions).await {
        match handle {
            Ok((task_id, report)) => track(&jobs, &task_id, report),
            Err(e) => tracing::error!("Submission aborted: {e}"),
        }
    }

    if jobs.is_empty() {
        tracing::info!("No job to follow");
        return Ok(());
    }

    let interval = Duration::from_secs(agent_config.poll_interval.max(1));
    tokio::select! {
        _ = poll_jobs(container.clone(), jobs.clone(), interval) => {
            tracing::info!("All jobs finished");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Cannot listen for ctrl-c")?;
            tracing::info!("Stopping (ctrl-c handling).");
            if agent_config.kill_on_exit {
                kill_jobs(&container, &jobs).await;
            }
        }
    }
    Ok(())
}

/// Print the outcome of a submission and remember its job for polling.
fn track(jobs: &ActiveJobs, task_id: &str, report: SubmitReport) {
    let SubmitReport {
        outcome,
        log_paths,
        target,
    } = report;
    match &outcome {
        SubmitOutcome::Failed(e) => println!("{} {task_id}: {e}", "failed".red()),
        _ => {
            let logs: Vec<_> = log_paths.iter().map(|p| p.display().to_string()).collect();
            println!("{} {task_id}: {}", outcome.to_string().green(), logs.join(" "));
        }
    }

    if let (Some(target), Some(job_id)) = (target, outcome.job_id()) {
        jobs.entry(target).or_default().insert(job_id.to_owned());
    }
}
