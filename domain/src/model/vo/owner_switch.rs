use crate::error::{ConfigError, HandlerError};
use crate::shell::quote;

/// How a local command is run as an owner other than the submitting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum OwnerSwitch {
    /// The owner is the submitting user.
    None,
    /// `sudo -u OWNER COMMAND`
    Sudo,
    /// `ssh OWNER@localhost 'COMMAND'`; needs passwordless ssh as the owner.
    Ssh,
}

impl OwnerSwitch {
    /// Pick the switch for running as `owner` on behalf of `submitter`.
    /// `method` is only consulted when the two differ.
    pub fn select(submitter: &str, owner: &str, method: &str) -> Result<Self, ConfigError> {
        if submitter == owner {
            return Ok(Self::None);
        }
        match method.parse() {
            Ok(Self::None) | Err(_) => Err(ConfigError::UnknownOwnerSwitch(method.to_owned())),
            Ok(switch) => Ok(switch),
        }
    }

    pub fn wrap(self, owner: &str, command: &str) -> Result<String, HandlerError> {
        Ok(match self {
            Self::None => command.to_owned(),
            Self::Sudo => format!("sudo -u {} {command}", quote(owner)?),
            Self::Ssh => format!("ssh {}@localhost {}", quote(owner)?, quote(command)?),
        })
    }
}
