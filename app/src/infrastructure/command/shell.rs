use std::os::unix::process::ExitStatusExt;
use std::process::Stdio;
use std::time::Duration;

use domain::error::SubmitError;
use domain::model::vo::{CommandOutput, ExitKind, ShellCommand};
use domain::service::ShellRunner;
use tokio::process::Command;

/// Runs command lines through `<shell> -c`, one child process per call.
pub struct TokioShellRunner {
    shell: String,
    timeout: Duration,
}

impl TokioShellRunner {
    pub fn new(shell: impl Into<String>, timeout: Duration) -> Self {
        Self {
            shell: shell.into(),
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl ShellRunner for TokioShellRunner {
    async fn run(&self, command: ShellCommand) -> Result<CommandOutput, SubmitError> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(&command.line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the future on timeout must not leave the child behind.
            .kill_on_drop(true);
        if let Some(dir) = &command.cwd {
            cmd.current_dir(dir);
        }

        tracing::debug!(command = %command.line, cwd = ?command.cwd, "Spawning");
        let out = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(out) => out.map_err(|e| {
                SubmitError::transport(format!("Failed to run `{}`", command.line), e)
            })?,
            Err(_) => {
                return Err(SubmitError::Timeout {
                    command: command.line,
                    timeout: self.timeout,
                })
            }
        };

        let status = match (out.status.code(), out.status.signal()) {
            (Some(code), _) => ExitKind::Exited(code),
            (None, Some(signal)) => ExitKind::Signaled(signal),
            (None, None) => ExitKind::Exited(-1),
        };
        Ok(CommandOutput {
            status,
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use domain::error::SubmitError;
    use domain::model::vo::{ExitKind, ShellCommand};
    use domain::service::ShellRunner;

    use super::TokioShellRunner;

    fn runner() -> TokioShellRunner {
        TokioShellRunner::new("/bin/sh", Duration::from_secs(10))
    }

    #[tokio::test]
    async fn captures_output_and_code() {
        let out = runner()
            .run(ShellCommand::new("echo out; echo err >&2; exit 3"))
            .await
            .unwrap();
        assert_eq!(ExitKind::Exited(3), out.status);
        assert_eq!("out\n", out.stdout);
        assert_eq!("err\n", out.stderr);
    }

    #[tokio::test]
    async fn runs_in_given_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = runner()
            .run(ShellCommand::new("pwd -P").current_dir(dir.path()))
            .await
            .unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(expected.to_string_lossy(), out.stdout.trim_end());
    }

    #[tokio::test]
    async fn signal_death() {
        let out = runner().run(ShellCommand::new("kill -9 $$")).await.unwrap();
        assert_eq!(ExitKind::Signaled(9), out.status);
    }

    #[tokio::test]
    async fn timeout() {
        let runner = TokioShellRunner::new("/bin/sh", Duration::from_millis(100));
        let err = runner.run(ShellCommand::new("sleep 5")).await.unwrap_err();
        assert!(matches!(err, SubmitError::Timeout { .. }));
    }

    #[tokio::test]
    async fn missing_shell_is_transport_error() {
        let runner = TokioShellRunner::new("/nonexistent/shell", Duration::from_secs(1));
        let err = runner.run(ShellCommand::new("true")).await.unwrap_err();
        assert!(matches!(err, SubmitError::Transport { .. }));
    }
}
