//! PBS and Torque: `qsub`, `qstat` and `qdel`.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use domain::error::HandlerError;
use domain::model::vo::JobConf;
use domain::service::BatchSystemHandler;
use domain::shell;
use regex::Regex;

use super::{ids_by_line, merge_directives};

const PREFIX: &str = "#PBS ";
const JOB_NAME_LEN_MAX: usize = 236;

// `qsub` prints `<digits>.<server>`; array jobs look like `<digits>[].<server>`.
static SUBMIT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A\s*(\d+)(?:\[\])?(?:\.\S+)?\s*\z").unwrap());
static POLL_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\d+)").unwrap());

pub struct PbsHandler {
    job_name_len_max: usize,
}

impl Default for PbsHandler {
    fn default() -> Self {
        Self {
            job_name_len_max: JOB_NAME_LEN_MAX,
        }
    }
}

impl BatchSystemHandler for PbsHandler {
    fn name(&self) -> &'static str {
        "pbs"
    }

    fn format_directives(&self, conf: &JobConf<'_>) -> Result<Vec<String>, HandlerError> {
        let job_name: String = format!("{}.{}", conf.task_id, conf.run_name)
            .chars()
            .take(self.job_name_len_max)
            .collect();
        let reserved = [
            ("-N", job_name),
            ("-o", conf.stdout_path.to_string_lossy().into_owned()),
            ("-e", conf.stderr_path.to_string_lossy().into_owned()),
        ];
        let directives =
            merge_directives(conf, reserved, "-l walltime", |secs| secs.to_string());

        directives
            .iter()
            .map(|(key, value)| {
                if key.trim().is_empty() {
                    return Err(HandlerError::MalformedDirective(key.to_owned()));
                }
                Ok(match value {
                    "" => format!("{PREFIX}{key}"),
                    // -l walltime=3600
                    _ if key.contains(' ') => format!("{PREFIX}{key}={value}"),
                    // -q queue
                    _ => format!("{PREFIX}{key} {value}"),
                })
            })
            .collect()
    }

    fn submit_command(&self, job_file: &Path) -> Result<String, HandlerError> {
        Ok(format!("qsub {}", shell::quote(&job_file.to_string_lossy())?))
    }

    fn kill_command(&self, job_id: &str) -> Result<String, HandlerError> {
        Ok(format!("qdel {}", shell::quote(job_id)?))
    }

    fn poll_command(&self, job_ids: &[String]) -> Vec<String> {
        let mut argv = vec!["qstat".to_owned()];
        argv.extend(job_ids.iter().cloned());
        argv
    }

    fn accepts_poll_exit(&self, code: i32, stderr: &str) -> bool {
        // qstat still lists the jobs it knows when some ids are gone.
        code == 0 || stderr.contains("Unknown Job Id")
    }

    fn extract_submit_id(&self, stdout: &str) -> Result<String, HandlerError> {
        SUBMIT_ID
            .captures(stdout)
            .map(|caps| caps[1].to_owned())
            .ok_or_else(|| HandlerError::SubmitIdNotFound(stdout.to_owned()))
    }

    fn extract_poll_ids(&self, stdout: &str) -> BTreeSet<String> {
        ids_by_line(&POLL_ID, stdout)
    }
}
