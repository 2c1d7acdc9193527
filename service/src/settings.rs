use std::path::PathBuf;

use domain::model::vo::RemotePaths;
use indexmap::IndexMap;
use typed_builder::TypedBuilder;

pub const DEFAULT_DUMMY_COMMAND: &str = "echo Dummy command; sleep 10";
pub const DEFAULT_DUMMY_COMMAND_FAIL: &str = "echo Dummy command failing; sleep 10; exit 1";

/// Process-wide submission settings. Read-only once built and shared between
/// every concurrent submission.
#[derive(Debug, Clone, TypedBuilder)]
pub struct SubmitSettings {
    /// Run (suite) name, part of batch job names.
    #[builder(setter(into))]
    pub run_name: String,

    #[builder(default = "/bin/bash".to_owned(), setter(into))]
    pub shell: String,

    /// Default directory for job stdout and stderr.
    #[builder(setter(into))]
    pub job_log_dir: PathBuf,

    /// Local directory job files are written to.
    #[builder(setter(into))]
    pub job_file_dir: PathBuf,

    #[builder(default, setter(strip_option, into))]
    pub default_owner: Option<String>,

    #[builder(default, setter(strip_option, into))]
    pub default_remote_host: Option<String>,

    #[builder(default)]
    pub remote_paths: RemotePaths,

    /// `sudo` or `ssh`, see [`OwnerSwitch`](domain::model::vo::OwnerSwitch).
    #[builder(default = "sudo".to_owned(), setter(into))]
    pub owned_task_execution_method: String,

    #[builder(default, setter(strip_option))]
    pub ssh_port: Option<u16>,

    /// Run every task locally with a stub command.
    #[builder(default)]
    pub simulation_mode: bool,

    /// In simulation mode, the task that gets the failing stub.
    #[builder(default, setter(strip_option, into))]
    pub failout_id: Option<String>,

    #[builder(default = DEFAULT_DUMMY_COMMAND.to_owned(), setter(into))]
    pub dummy_command: String,

    #[builder(default = DEFAULT_DUMMY_COMMAND_FAIL.to_owned(), setter(into))]
    pub dummy_command_fail: String,

    #[builder(default = "background".to_owned(), setter(into))]
    pub default_batch_system: String,

    #[builder(default)]
    pub global_environment: IndexMap<String, String>,

    #[builder(default, setter(strip_option, into))]
    pub global_pre_script: Option<String>,

    #[builder(default, setter(strip_option, into))]
    pub global_post_script: Option<String>,
}
