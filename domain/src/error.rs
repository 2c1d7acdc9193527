use std::path::PathBuf;
use std::time::Duration;

/// Problems with the configuration of a single submission attempt.
///
/// These abort the attempt they occur in, never the whole process.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("task {task_id} owner ({owner}): home dir not found")]
    HomeDirNotFound { task_id: String, owner: String },

    #[error("unable to determine the submitting user")]
    UnknownSubmitter,

    #[error("unknown owned task execution method: {0}")]
    UnknownOwnerSwitch(String),

    #[error("no job submission command defined for batch system `{0}`")]
    UnknownBatchSystem(String),

    #[error("cannot expand job log directory {path:?}: {reason}")]
    LogDir { path: PathBuf, reason: String },
}

/// Errors raised by a batch system handler while translating to or from
/// backend syntax.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    #[error("malformed directive key `{0}`")]
    MalformedDirective(String),

    #[error("cannot quote {0:?} for the shell")]
    Quote(String),

    #[error("no job id found in submit output: {0:?}")]
    SubmitIdNotFound(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("`{command}` failed with exit code {code}: {stderr}")]
    Exit {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("`{command}` terminated by signal {signal}")]
    Signal { command: String, signal: i32 },

    #[error("failed to write job file: {0:#}")]
    JobFile(anyhow::Error),

    #[error(transparent)]
    Parse(#[from] HandlerError),
}

impl SubmitError {
    pub fn transport(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Transport {
            context: context.into(),
            source,
        }
    }

    /// Whether the error comes from the configuration rather than from running
    /// anything.
    #[inline]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
