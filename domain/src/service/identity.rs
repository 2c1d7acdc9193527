use std::path::PathBuf;

use crate::error::ConfigError;
use crate::model::vo::Account;

/// Read access to the local user database.
pub trait IdentityDatabase: Send + Sync {
    /// The user running this process.
    fn submitter(&self) -> Result<Account, ConfigError>;

    fn home_dir(&self, user: &str) -> Option<PathBuf>;
}
