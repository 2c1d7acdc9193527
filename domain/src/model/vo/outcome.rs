use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::SubmitError;
use crate::model::entity::JobTarget;

/// Result of one submission attempt.
#[derive(Debug, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SubmitOutcome {
    /// The submit command succeeded. `job_id` is `None` for dry runs.
    Submitted { job_id: Option<String> },
    Failed(SubmitError),
    /// The backend forked the job into a background sub-shell and returned
    /// straight away. The wrapper succeeded; whether the job did is only
    /// visible later, out of band.
    Detached { job_id: Option<String> },
}

impl SubmitOutcome {
    /// `true` unless the attempt is known to have failed. A detached job counts
    /// as started even though its real fate is unknown.
    #[inline]
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            Self::Submitted { job_id } | Self::Detached { job_id } => job_id.as_deref(),
            Self::Failed(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct SubmitReport {
    pub outcome: SubmitOutcome,
    /// Files registered as viewable logs of the task: stdout, stderr and, for
    /// local jobs, the job script. None of them is deleted automatically.
    pub log_paths: Vec<PathBuf>,
    /// Where the job went, `None` if the attempt failed before that was
    /// resolved.
    pub target: Option<JobTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Ids the batch system still knows about, deduplicated.
    pub active: BTreeSet<String>,
    /// Requested ids missing from the poll output.
    pub finished: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::SubmitOutcome;
    use crate::error::{ConfigError, SubmitError};

    #[test]
    fn detached_counts_as_started() {
        let outcome = SubmitOutcome::Detached {
            job_id: Some("4242".to_owned()),
        };
        assert!(outcome.is_success());
        assert_eq!(Some("4242"), outcome.job_id());
        assert_eq!("detached", outcome.to_string());
    }

    #[test]
    fn failure_has_no_id() {
        let outcome = SubmitOutcome::Failed(SubmitError::Config(ConfigError::UnknownSubmitter));
        assert!(!outcome.is_success());
        assert_eq!(None, outcome.job_id());
    }
}
