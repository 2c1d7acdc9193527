use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::*;
use service::settings::{DEFAULT_DUMMY_COMMAND, DEFAULT_DUMMY_COMMAND_FAIL};

/// `config.yaml` in the working directory if present, overridden by
/// `SUBMIT__<KEY>` environment variables.
pub fn build_config() -> Result<Config, ConfigError> {
    Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::with_prefix("SUBMIT").separator("__"))
        .build()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "AgentConfig::default_run_name")]
    pub run_name: String,

    #[serde(default = "AgentConfig::default_shell")]
    pub shell: String,

    /// May start with `~` or refer to environment variables.
    #[serde(default = "AgentConfig::default_job_log_dir")]
    pub job_log_dir: PathBuf,

    #[serde(default = "AgentConfig::default_job_file_dir")]
    pub job_file_dir: PathBuf,

    #[serde(default = "Default::default")]
    pub default_owner: Option<String>,

    #[serde(default = "Default::default")]
    pub default_remote_host: Option<String>,

    #[serde(default = "Default::default")]
    pub ssh_port: Option<u16>,

    /// Where the supporting tooling lives on remote hosts.
    #[serde(default = "Default::default")]
    pub remote_cylc_dir: Option<PathBuf>,

    #[serde(default = "Default::default")]
    pub remote_suite_dir: Option<PathBuf>,

    #[serde(default = "AgentConfig::default_owned_task_execution_method")]
    pub owned_task_execution_method: String,

    #[serde(default = "Default::default")]
    pub simulation_mode: bool,

    #[serde(default = "Default::default")]
    pub failout_id: Option<String>,

    #[serde(default = "AgentConfig::default_dummy_command")]
    pub dummy_command: String,

    #[serde(default = "AgentConfig::default_dummy_command_fail")]
    pub dummy_command_fail: String,

    #[serde(default = "AgentConfig::default_batch_system")]
    pub default_batch_system: String,

    #[serde(default = "Default::default")]
    pub global_pre_script: Option<String>,

    #[serde(default = "Default::default")]
    pub global_post_script: Option<String>,

    /// Seconds any external command may take.
    #[serde(default = "AgentConfig::default_command_timeout")]
    pub command_timeout: u64,

    #[serde(default = "AgentConfig::default_poll_interval")]
    pub poll_interval: u64,

    #[serde(default = "AgentConfig::default_tasks_file")]
    pub tasks_file: PathBuf,

    /// Kill jobs still active when the agent is interrupted.
    #[serde(default = "Default::default")]
    pub kill_on_exit: bool,
}

impl AgentConfig {
    pub fn default_run_name() -> String {
        "default".to_owned()
    }

    pub fn default_shell() -> String {
        "/bin/bash".to_owned()
    }

    pub fn default_job_log_dir() -> PathBuf {
        PathBuf::from("~/submit-run/log/job")
    }

    pub fn default_job_file_dir() -> PathBuf {
        PathBuf::from("~/submit-run/job")
    }

    pub fn default_owned_task_execution_method() -> String {
        "sudo".to_owned()
    }

    pub fn default_dummy_command() -> String {
        DEFAULT_DUMMY_COMMAND.to_owned()
    }

    pub fn default_dummy_command_fail() -> String {
        DEFAULT_DUMMY_COMMAND_FAIL.to_owned()
    }

    pub fn default_batch_system() -> String {
        "background".to_owned()
    }

    pub fn default_command_timeout() -> u64 {
        120
    }

    pub fn default_poll_interval() -> u64 {
        30
    }

    pub fn default_tasks_file() -> PathBuf {
        PathBuf::from("tasks.json")
    }
}
