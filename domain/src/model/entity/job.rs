/// Where a submitted job lives, enough to poll or kill it later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobTarget {
    pub batch_system: String,
    /// Set when the job runs as someone other than the submitter, or remotely.
    pub owner: Option<String>,
    pub host: Option<String>,
}
