use std::path::PathBuf;

use domain::error::ConfigError;
use domain::model::vo::Account;
use domain::service::IdentityDatabase;
use nix::unistd::{Uid, User};

/// The system passwd database.
#[derive(Debug, Default)]
pub struct PasswdIdentity;

impl IdentityDatabase for PasswdIdentity {
    fn submitter(&self) -> Result<Account, ConfigError> {
        match User::from_uid(Uid::current()) {
            Ok(Some(user)) => Ok(Account {
                name: user.name,
                home: user.dir,
            }),
            Ok(None) => Err(ConfigError::UnknownSubmitter),
            Err(e) => {
                tracing::error!("Cannot look up the current user: {e}");
                Err(ConfigError::UnknownSubmitter)
            }
        }
    }

    fn home_dir(&self, user: &str) -> Option<PathBuf> {
        match User::from_name(user) {
            Ok(found) => found.map(|user| user.dir),
            Err(e) => {
                tracing::warn!("Cannot look up user {user}: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use domain::service::IdentityDatabase;

    use super::PasswdIdentity;

    #[test]
    fn current_user_has_a_home() {
        let me = PasswdIdentity.submitter().unwrap();
        assert_eq!(Some(me.home.clone()), PasswdIdentity.home_dir(&me.name));
    }

    #[test]
    fn unknown_user() {
        assert_eq!(None, PasswdIdentity.home_dir("no-such-user-4f9a2c"));
    }
}
