use std::path::PathBuf;

use crate::error::SubmitError;

/// A command line to hand to the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub line: String,
    /// Working directory of the spawned process only; the caller's own
    /// working directory is never changed.
    pub cwd: Option<PathBuf>,
}

impl ShellCommand {
    #[inline]
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            cwd: None,
        }
    }

    #[inline]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Exited(i32),
    Signaled(i32),
}

impl ExitKind {
    /// The shell convention: negative for a signal, the exit code otherwise.
    pub fn code(self) -> i32 {
        match self {
            Self::Exited(code) => code,
            Self::Signaled(signal) => -signal,
        }
    }

    #[inline]
    pub fn success(self) -> bool {
        self == Self::Exited(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: ExitKind,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Classify the outcome of `command`: anything but a zero exit is an error.
    pub fn check(self, command: &str) -> Result<Self, SubmitError> {
        match self.status {
            ExitKind::Exited(0) => Ok(self),
            ExitKind::Exited(code) => Err(SubmitError::Exit {
                command: command.to_owned(),
                code,
                stderr: self.stderr.trim().to_owned(),
            }),
            ExitKind::Signaled(signal) => Err(SubmitError::Signal {
                command: command.to_owned(),
                signal,
            }),
        }
    }
}
