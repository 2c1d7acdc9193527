use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;
use typed_builder::TypedBuilder;

use super::Directives;

/// One attempt at running a task. Built fresh for every try and never reused.
#[derive(Debug, Clone, TypedBuilder)]
pub struct TaskSubmission {
    #[builder(setter(into))]
    pub task_id: String,

    #[builder(setter(into))]
    pub command: String,

    /// Exported in order, so later entries may refer to earlier ones.
    #[builder(default)]
    pub environment: IndexMap<String, String>,

    #[builder(default)]
    pub directives: Directives,

    #[builder(default, setter(strip_option))]
    pub execution_time_limit: Option<Duration>,

    #[builder(default, setter(strip_option, into))]
    pub pre_script: Option<String>,

    #[builder(default, setter(strip_option, into))]
    pub post_script: Option<String>,

    #[builder(default, setter(strip_option, into))]
    pub owner: Option<String>,

    #[builder(default, setter(strip_option, into))]
    pub remote_host: Option<String>,

    #[builder(default)]
    pub remote_paths: RemotePaths,

    #[builder(default, setter(strip_option, into))]
    pub job_log_dir: Option<PathBuf>,

    /// Backend name, the configured default when unset.
    #[builder(default, setter(strip_option, into))]
    pub batch_system: Option<String>,

    /// Write the job file and print how it would be submitted. Log files
    /// and their directory are left uncreated.
    #[builder(default)]
    pub dry_run: bool,
}

/// Where the supporting tooling lives on a remote host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RemotePaths {
    #[serde(default)]
    pub tool_dir: Option<PathBuf>,

    #[serde(default)]
    pub suite_dir: Option<PathBuf>,
}

impl RemotePaths {
    /// Fill whatever is missing here from `fallback`.
    pub fn or(self, fallback: &RemotePaths) -> Self {
        Self {
            tool_dir: self.tool_dir.or_else(|| fallback.tool_dir.clone()),
            suite_dir: self.suite_dir.or_else(|| fallback.suite_dir.clone()),
        }
    }
}

/// A user from the identity database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    pub home: PathBuf,
}
