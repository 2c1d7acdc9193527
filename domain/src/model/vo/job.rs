use std::path::PathBuf;

use indexmap::IndexMap;

/// Input of a job file builder. The builder writes a fresh script at `path`
/// on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobScript {
    pub path: PathBuf,
    pub task_id: String,
    pub batch_system: String,
    /// Interpreter for the `#!` line.
    pub shell: String,
    pub directives: Vec<String>,
    /// Only set for backends whose directives do not route stdout and stderr.
    pub output_redirect: Option<OutputRedirect>,
    pub global_environment: IndexMap<String, String>,
    pub environment: IndexMap<String, String>,
    pub global_pre_script: Option<String>,
    pub pre_script: Option<String>,
    pub command: String,
    pub post_script: Option<String>,
    pub global_post_script: Option<String>,
    pub remote_tool_dir: Option<PathBuf>,
    pub remote_suite_dir: Option<PathBuf>,
    pub remote: bool,
    pub simulation_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRedirect {
    pub stdout: PathBuf,
    pub stderr: PathBuf,
}
