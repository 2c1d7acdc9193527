//! Plain execution without a batch system: the job is forked with `nohup`
//! and tracked through its process id.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use domain::error::HandlerError;
use domain::model::vo::JobConf;
use domain::service::BatchSystemHandler;
use domain::shell;
use regex::Regex;

use super::ids_by_line;

static PID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\A\s*(\d+)\s*\z").unwrap());
static POLL_PID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\d+)").unwrap());

pub struct BackgroundHandler;

impl BatchSystemHandler for BackgroundHandler {
    fn name(&self) -> &'static str {
        "background"
    }

    fn detaches(&self) -> bool {
        true
    }

    fn redirects_output(&self) -> bool {
        false
    }

    /// There is nobody to read directives.
    fn format_directives(&self, _: &JobConf<'_>) -> Result<Vec<String>, HandlerError> {
        Ok(Vec::new())
    }

    fn submit_command(&self, job_file: &Path) -> Result<String, HandlerError> {
        let job = shell::quote(&job_file.to_string_lossy())?.into_owned();
        Ok(format!("nohup {job} </dev/null >/dev/null 2>&1 & echo $!"))
    }

    fn kill_command(&self, job_id: &str) -> Result<String, HandlerError> {
        Ok(format!("kill {}", shell::quote(job_id)?))
    }

    fn poll_command(&self, job_ids: &[String]) -> Vec<String> {
        vec![
            "ps".to_owned(),
            "-o".to_owned(),
            "pid=".to_owned(),
            "-p".to_owned(),
            job_ids.join(","),
        ]
    }

    fn accepts_poll_exit(&self, code: i32, _stderr: &str) -> bool {
        // ps exits 1 when none of the processes is left.
        code == 0 || code == 1
    }

    fn extract_submit_id(&self, stdout: &str) -> Result<String, HandlerError> {
        PID.captures(stdout)
            .map(|caps| caps[1].to_owned())
            .ok_or_else(|| HandlerError::SubmitIdNotFound(stdout.to_owned()))
    }

    fn extract_poll_ids(&self, stdout: &str) -> BTreeSet<String> {
        ids_by_line(&POLL_PID, stdout)
    }
}
