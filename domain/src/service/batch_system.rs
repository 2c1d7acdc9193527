use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::error::{ConfigError, HandlerError};
use crate::model::vo::JobConf;

/// Translation between the abstract job model and one batch system's
/// directive syntax and commands. Implementations do no I/O.
pub trait BatchSystemHandler: Send + Sync {
    /// Registry key, e.g. `slurm`.
    fn name(&self) -> &'static str;

    /// Whether the submit command returns as soon as the job is forked into
    /// the background, leaving its outcome unobservable.
    fn detaches(&self) -> bool {
        false
    }

    /// Whether the directives route the job's stdout and stderr. When not,
    /// the job file redirects them itself.
    fn redirects_output(&self) -> bool {
        true
    }

    /// Directive lines for the top of the job file: job name and log paths
    /// first, then the time limit unless the user set it, then user
    /// directives in their original order.
    fn format_directives(&self, conf: &JobConf<'_>) -> Result<Vec<String>, HandlerError>;

    fn submit_command(&self, job_file: &Path) -> Result<String, HandlerError>;

    fn kill_command(&self, job_id: &str) -> Result<String, HandlerError>;

    /// One argument list querying all of `job_ids` at once.
    fn poll_command(&self, job_ids: &[String]) -> Vec<String>;

    /// Some pollers exit non-zero once every requested job has left the
    /// system; such output still counts as a valid, empty poll.
    fn accepts_poll_exit(&self, code: i32, _stderr: &str) -> bool {
        code == 0
    }

    fn extract_submit_id(&self, stdout: &str) -> Result<String, HandlerError>;

    /// Job ids in poll output, one per matching line, with backend-specific
    /// decorations dropped.
    fn extract_poll_ids(&self, stdout: &str) -> BTreeSet<String>;
}

/// Handlers keyed on their name.
#[derive(Default, Clone)]
pub struct BatchSystems {
    handlers: HashMap<&'static str, Arc<dyn BatchSystemHandler>>,
}

impl BatchSystems {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(mut self, handler: H) -> Self
    where
        H: BatchSystemHandler + 'static,
    {
        self.handlers.insert(handler.name(), Arc::new(handler));
        self
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn BatchSystemHandler>, ConfigError> {
        self.handlers
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownBatchSystem(name.to_owned()))
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
