//! SLURM: `sbatch`, `squeue` and `scancel`, plus heterogeneous job groups.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use domain::error::HandlerError;
use domain::model::vo::JobConf;
use domain::service::BatchSystemHandler;
use domain::shell;
use regex::Regex;

use super::{ids_by_line, merge_directives};

const PREFIX: &str = "#SBATCH ";

static SUBMIT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\ASubmitted\sbatch\sjob\s(\d+)").unwrap());
// Heterogeneous components are listed as `<id>+<n>`; only the leading digits
// count.
static POLL_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ *(\d+)").unwrap());
static HETJOB: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^hetjob_(\d+)_").unwrap());
static PACKJOB: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^packjob_(\d+)_").unwrap());

pub struct SlurmHandler {
    name: &'static str,
    group_key: &'static LazyLock<Regex>,
    group_separator: &'static str,
}

impl SlurmHandler {
    /// Current SLURM, with `hetjob_<n>_` directive groups.
    pub fn hetjob() -> Self {
        Self {
            name: "slurm",
            group_key: &HETJOB,
            group_separator: "#SBATCH hetjob",
        }
    }

    /// SLURM before 19.05, which called them pack jobs.
    pub fn packjob() -> Self {
        Self {
            name: "slurm_packjob",
            group_key: &PACKJOB,
            group_separator: "#SBATCH packjob",
        }
    }
}

impl BatchSystemHandler for SlurmHandler {
    fn name(&self) -> &'static str {
        self.name
    }

    fn format_directives(&self, conf: &JobConf<'_>) -> Result<Vec<String>, HandlerError> {
        let reserved = [
            ("--job-name", format!("{}.{}", conf.task_id, conf.run_name)),
            ("--output", escape_pattern(conf.stdout_path)),
            ("--error", escape_pattern(conf.stderr_path)),
        ];
        let directives = merge_directives(conf, reserved, "--time", |secs| {
            format!("{}:{:02}", secs / 60, secs % 60)
        });

        let mut lines = Vec::with_capacity(directives.len());
        let mut seen = BTreeSet::new();
        for (raw, value) in directives.iter() {
            let key = match self.group_key.captures(raw) {
                Some(caps) => {
                    let group = &caps[1];
                    if group != "0" && !seen.contains(group) {
                        lines.push(self.group_separator.to_owned());
                    }
                    seen.insert(group.to_owned());
                    &raw[caps[0].len()..]
                }
                None => raw,
            };
            if key.is_empty() {
                return Err(HandlerError::MalformedDirective(raw.to_owned()));
            }
            lines.push(if value.is_empty() {
                format!("{PREFIX}{key}")
            } else {
                format!("{PREFIX}{key}={value}")
            });
        }
        Ok(lines)
    }

    fn submit_command(&self, job_file: &Path) -> Result<String, HandlerError> {
        Ok(format!("sbatch {}", shell::quote(&job_file.to_string_lossy())?))
    }

    fn kill_command(&self, job_id: &str) -> Result<String, HandlerError> {
        Ok(format!("scancel {}", shell::quote(job_id)?))
    }

    fn poll_command(&self, job_ids: &[String]) -> Vec<String> {
        vec![
            "squeue".to_owned(),
            "-h".to_owned(),
            "-j".to_owned(),
            job_ids.join(","),
        ]
    }

    fn accepts_poll_exit(&self, code: i32, stderr: &str) -> bool {
        // squeue fails when none of the requested jobs is known any more.
        code == 0 || (code == 1 && stderr.contains("Invalid job id"))
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

/// `%` starts a filename pattern in `--output` and `--error`.
fn escape_pattern(path: &Path) -> String {
    path.to_string_lossy().replace('%', "%%")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::path::Path;
    use std::time::Duration;

    use domain::error::HandlerError;
    use domain::model::vo::{Directives, JobConf};
    use domain::service::BatchSystemHandler;
    use pretty_assertions::assert_eq;

    use super::{SlurmHandler, HETJOB};

    fn conf<'a>(directives: &'a Directives, limit: Option<Duration>) -> JobConf<'a> {
        JobConf {
            task_id: "foo.1",
            run_name: "suite",
            job_file_path: Path::new("/home/alice/jobs/foo.1-ABC123.sh"),
            stdout_path: Path::new("/home/alice/log/foo.1-ABC123.out"),
            stderr_path: Path::new("/home/alice/log/foo.1-ABC123.err"),
            execution_time_limit: limit,
            directives,
        }
    }

    #[test]
    fn reserved_directives_come_first() {
        let directives = [("--nodes", "5"), ("--exclusive", "")].into_iter().collect();
        let lines = SlurmHandler::hetjob()
            .format_directives(&conf(&directives, Some(Duration::from_secs(3661))))
            .unwrap();
        assert_eq!(
            vec![
                "#SBATCH --job-name=foo.1.suite",
                "#SBATCH --output=/home/alice/log/foo.1-ABC123.out",
                "#SBATCH --error=/home/alice/log/foo.1-ABC123.err",
                "#SBATCH --time=61:01",
                "#SBATCH --nodes=5",
                "#SBATCH --exclusive",
            ],
            lines
        );
    }

    #[test]
    fn user_time_is_never_merged() {
        let directives = [("--time", "10:00")].into_iter().collect();
        let lines = SlurmHandler::hetjob()
            .format_directives(&conf(&directives, Some(Duration::from_secs(3661))))
            .unwrap();
        let times: Vec<_> = lines
            .iter()
            .map(String::as_str)
            .filter(|l| l.starts_with("#SBATCH --time"))
            .collect();
        assert_eq!(vec!["#SBATCH --time=10:00"], times);
        assert_eq!("#SBATCH --time=10:00", lines[3]);
    }

    #[test]
    fn no_limit_no_time() {
        let lines = SlurmHandler::hetjob()
            .format_directives(&conf(&Directives::new(), None))
            .unwrap();
        assert_eq!(3, lines.len());
    }

    #[test]
    fn zero_limit_is_no_limit() {
        let lines = SlurmHandler::hetjob()
            .format_directives(&conf(&Directives::new(), Some(Duration::ZERO)))
            .unwrap();
        assert_eq!(3, lines.len());
        assert!(lines.iter().all(|l| !l.starts_with("#SBATCH --time")));
    }

    #[test]
    fn percent_is_escaped_in_log_paths() {
        let directives = Directives::new();
        let mut conf = conf(&directives, None);
        conf.stdout_path = Path::new("/log/100%/x.out");
        let lines = SlurmHandler::hetjob().format_directives(&conf).unwrap();
        assert_eq!("#SBATCH --output=/log/100%%/x.out", lines[1]);
    }

    #[test]
    fn one_separator_per_new_group() {
        let directives = [
            ("--account", "QXZ5W2"),
            ("hetjob_0_--mem", "1G"),
            ("hetjob_0_--nodes", "3"),
            ("hetjob_1_--mem", "2G"),
            ("hetjob_1_--nodes", "6"),
        ]
        .into_iter()
        .collect();
        let lines = SlurmHandler::hetjob().format_directives(&conf(&directives, None)).unwrap();
        assert_eq!(
            vec![
                "#SBATCH --account=QXZ5W2",
                "#SBATCH --mem=1G",
                "#SBATCH --nodes=3",
                "#SBATCH hetjob",
                "#SBATCH --mem=2G",
                "#SBATCH --nodes=6",
            ],
            lines[3..].to_vec()
        );
    }

    #[test]
    fn groups_keep_input_order() {
        let directives = [
            ("hetjob_2_--mem", "1G"),
            ("hetjob_1_--mem", "2G"),
            ("hetjob_2_--nodes", "1"),
        ]
        .into_iter()
        .collect();
        let lines = SlurmHandler::hetjob().format_directives(&conf(&directives, None)).unwrap();
        assert_eq!(
            vec![
                "#SBATCH hetjob",
                "#SBATCH --mem=1G",
                "#SBATCH hetjob",
                "#SBATCH --mem=2G",
                "#SBATCH --nodes=1",
            ],
            lines[3..].to_vec()
        );
    }

    #[test]
    fn packjob_variant() {
        let directives = [("packjob_1_--mem", "2G"), ("hetjob_1_--mem", "1G")]
            .into_iter()
            .collect();
        let lines = SlurmHandler::packjob().format_directives(&conf(&directives, None)).unwrap();
        assert_eq!(
            vec!["#SBATCH packjob", "#SBATCH --mem=2G", "#SBATCH hetjob_1_--mem=1G"],
            lines[3..].to_vec()
        );
    }

    #[test]
    fn key_round_trip() {
        let directives: Directives =
            [("--partition", "debug"), ("--requeue", "")].into_iter().collect();
        let lines = SlurmHandler::hetjob().format_directives(&conf(&directives, None)).unwrap();
        let parsed: Directives = lines[3..]
            .iter()
            .map(|line| {
                let body = line.strip_prefix("#SBATCH ").unwrap();
                body.split_once('=').unwrap_or((body, ""))
            })
            .collect();
        assert_eq!(directives, parsed);
    }

    #[test]
    fn prefixed_key_round_trip() {
        let directives: Directives = [
            ("--partition", "debug"),
            ("hetjob_0_--mem", "1G"),
            ("hetjob_1_--mem", "2G"),
            ("hetjob_1_--requeue", ""),
        ]
        .into_iter()
        .collect();
        let lines = SlurmHandler::hetjob().format_directives(&conf(&directives, None)).unwrap();

        let mut parsed: Vec<(String, String)> = lines[3..]
            .iter()
            .filter(|line| line.as_str() != "#SBATCH hetjob")
            .map(|line| {
                let body = line.strip_prefix("#SBATCH ").unwrap();
                let (key, value) = body.split_once('=').unwrap_or((body, ""));
                (key.to_owned(), value.to_owned())
            })
            .collect();
        let mut expected: Vec<(String, String)> = directives
            .iter()
            .map(|(key, value)| (HETJOB.replace(key, "").into_owned(), value.to_owned()))
            .collect();
        parsed.sort();
        expected.sort();
        assert_eq!(expected, parsed);
    }

    #[test]
    fn malformed_keys() {
        for key in ["", "hetjob_1_"] {
            let directives = [(key, "1")].into_iter().collect();
            let err = SlurmHandler::hetjob()
                .format_directives(&conf(&directives, None))
                .unwrap_err();
            assert!(matches!(err, HandlerError::MalformedDirective(_)));
        }
    }

    #[test]
    fn submit_id() {
        let slurm = SlurmHandler::hetjob();
        assert_eq!("4821", slurm.extract_submit_id("Submitted batch job 4821\n").unwrap());
        assert_eq!(
            Err(HandlerError::SubmitIdNotFound("sbatch: error: invalid partition\n".to_owned())),
            slurm.extract_submit_id("sbatch: error: invalid partition\n")
        );
        assert!(slurm.extract_submit_id("Note: Submitted batch job 1\n").is_err());
    }

    #[test]
    fn poll_ids_are_deduplicated() {
        let out = "123\n  123+0\n123+1\n456 R\nJOBID\n";
        let ids = SlurmHandler::hetjob().extract_poll_ids(out);
        assert_eq!(BTreeSet::from(["123".to_owned(), "456".to_owned()]), ids);
    }

    #[test]
    fn commands() {
        let slurm = SlurmHandler::hetjob();
        assert_eq!(
            "sbatch ./foo.1-ABC123.sh",
            slurm.submit_command(Path::new("./foo.1-ABC123.sh")).unwrap()
        );
        assert_eq!("scancel 123", slurm.kill_command("123").unwrap());
        assert_eq!(
            vec!["squeue", "-h", "-j", "1,2"],
            slurm.poll_command(&["1".to_owned(), "2".to_owned()])
        );
        assert!(slurm.accepts_poll_exit(1, "slurm_load_jobs error: Invalid job id specified"));
        assert!(!slurm.accepts_poll_exit(1, "Connection refused"));
    }
}
