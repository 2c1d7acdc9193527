use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use domain::model::vo::{Directives, RemotePaths, TaskSubmission};
use indexmap::IndexMap;
use serde::Deserialize;

/// The tasks to submit in one agent run.
#[derive(Debug, Deserialize)]
pub struct TaskFile {
    /// Exported ahead of every task's own environment.
    #[serde(default)]
    pub global_environment: IndexMap<String, String>,

    pub tasks: Vec<Task>,
}

/// One task as written in the tasks file.
#[derive(Debug, Deserialize)]
pub struct Task {
    pub id: String,
    pub command: String,
    #[serde(default)]
    pub environment: IndexMap<String, String>,
    #[serde(default)]
    pub directives: Directives,
    /// Seconds.
    #[serde(default)]
    pub execution_time_limit: Option<u64>,
    #[serde(default)]
    pub pre_script: Option<String>,
    #[serde(default)]
    pub post_script: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub remote_host: Option<String>,
    #[serde(default)]
    pub remote_paths: RemotePaths,
    #[serde(default)]
    pub job_log_dir: Option<PathBuf>,
    #[serde(default)]
    pub batch_system: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
}

impl TaskFile {
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Cannot read {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid tasks file {}", path.display()))
    }
}

impl From<Task> for TaskSubmission {
    fn from(task: Task) -> Self {
        TaskSubmission {
            task_id: task.id,
            command: task.command,
            environment: task.environment,
            directives: task.directives,
            execution_time_limit: task.execution_time_limit.map(Duration::from_secs),
            pre_script: task.pre_script,
            post_script: task.post_script,
            owner: task.owner,
            remote_host: task.remote_host,
            remote_paths: task.remote_paths,
            job_log_dir: task.job_log_dir,
            batch_system: task.batch_system,
            dry_run: task.dry_run,
        }
    }
}
