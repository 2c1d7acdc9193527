//! Test doubles shared by the service tests.

use std::collections::{BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use domain::{
    error::{ConfigError, HandlerError, SubmitError},
    model::vo::{Account, CommandOutput, ExitKind, JobConf, JobScript, ShellCommand},
    service::{BatchSystemHandler, IdentityDatabase, JobFileBuilder, ShellRunner},
};

mockall::mock! {
    pub Identity {}

    impl IdentityDatabase for Identity {
        fn submitter(&self) -> Result<Account, ConfigError>;
        fn home_dir(&self, user: &str) -> Option<PathBuf>;
    }
}

mockall::mock! {
    pub JobFiles {}

    #[async_trait]
    impl JobFileBuilder for JobFiles {
        async fn write(&self, script: JobScript) -> anyhow::Result<PathBuf>;
    }
}

/// `alice`, whose home is `home`; every other user but `nobody` has a
/// home directory next to it.
pub fn identity(home: &Path) -> MockIdentity {
    let home = home.to_owned();
    let mut identity = MockIdentity::new();
    let submitter_home = home.clone();
    identity.expect_submitter().returning(move || {
        Ok(Account {
            name: "alice".to_owned(),
            home: submitter_home.clone(),
        })
    });
    identity.expect_home_dir().returning(move |user| match user {
        "alice" => Some(home.clone()),
        "nobody" => None,
        other => home.parent().map(|parent| parent.join(other)),
    });
    identity
}

/// Writes the job file so later steps find it, and nothing else.
pub fn job_files() -> MockJobFiles {
    let mut files = MockJobFiles::new();
    files.expect_write().returning(|script| {
        std::fs::write(&script.path, format!("#!{}\n{}\n", script.shell, script.command))?;
        Ok(script.path)
    });
    files
}

/// Records every command line and answers with canned outputs, a plain
/// success once they run out.
#[derive(Default)]
pub struct Runner {
    pub calls: Mutex<Vec<ShellCommand>>,
    replies: Mutex<VecDeque<CommandOutput>>,
}

impl Runner {
    pub fn reply(self, status: ExitKind, stdout: &str, stderr: &str) -> Self {
        self.replies.lock().unwrap().push_back(CommandOutput {
            status,
            stdout: stdout.to_owned(),
            stderr: stderr.to_owned(),
        });
        self
    }

    pub fn lines(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|c| c.line.clone()).collect()
    }
}

#[async_trait]
impl ShellRunner for Runner {
    async fn run(&self, command: ShellCommand) -> Result<CommandOutput, SubmitError> {
        self.calls.lock().unwrap().push(command);
        let reply = self.replies.lock().unwrap().pop_front();
        Ok(reply.unwrap_or(CommandOutput {
            status: ExitKind::Exited(0),
            stdout: String::new(),
            stderr: String::new(),
        }))
    }
}

/// A batch system answering `job <id>` on submit and listing one id per
/// line on poll.
pub struct Queue {
    pub detaches: bool,
}

impl BatchSystemHandler for Queue {
    fn name(&self) -> &'static str {
        "queue"
    }

    fn detaches(&self) -> bool {
        self.detaches
    }

    fn format_directives(&self, conf: &JobConf<'_>) -> Result<Vec<String>, HandlerError> {
        Ok(vec![format!("#Q name={}", conf.task_id)])
    }

    fn submit_command(&self, job_file: &Path) -> Result<String, HandlerError> {
        Ok(format!("qsubmit {}", job_file.display()))
    }

    fn kill_command(&self, job_id: &str) -> Result<String, HandlerError> {
        Ok(format!("qkill {job_id}"))
    }

    fn poll_command(&self, job_ids: &[String]) -> Vec<String> {
        let mut argv = vec!["qlist".to_owned()];
        argv.extend(job_ids.iter().cloned());
        argv
    }

    fn accepts_poll_exit(&self, code: i32, stderr: &str) -> bool {
        code == 0 || (code == 1 && stderr.contains("no such job"))
    }

    fn extract_submit_id(&self, stdout: &str) -> Result<String, HandlerError> {
        stdout
            .strip_prefix("job ")
            .map(|id| id.trim().to_owned())
            .ok_or_else(|| HandlerError::SubmitIdNotFound(stdout.to_owned()))
    }

    fn extract_poll_ids(&self, stdout: &str) -> BTreeSet<String> {
        stdout.lines().map(|line| line.trim().to_owned()).filter(|id| !id.is_empty()).collect()
    }
}
