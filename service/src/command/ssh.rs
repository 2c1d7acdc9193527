use domain::error::HandlerError;
use domain::shell;

/// `[owner@]host`, plus an optional non-default port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshDestination {
    pub port: Option<u16>,
    pub username_host: String,
}

impl SshDestination {
    pub fn new(owner: Option<&str>, host: &str, port: Option<u16>) -> Self {
        let username_host = match owner {
            Some(owner) => format!("{owner}@{host}"),
            None => host.to_owned(),
        };
        Self {
            port,
            username_host,
        }
    }
}

/// An ssh proxy for command lines. It's transparent if not using ssh.
pub trait MaybeSsh {
    fn command(&self, cmd: &str) -> Result<String, HandlerError>;
}

impl MaybeSsh for Option<SshDestination> {
    fn command(&self, cmd: &str) -> Result<String, HandlerError> {
        let Some(ssh) = self else {
            return Ok(cmd.to_owned());
        };

        let mut args = vec!["ssh".to_owned()];
        if let Some(port) = ssh.port {
            args.extend(["-p".to_owned(), port.to_string()]);
        }
        args.push(ssh.username_host.clone());
        // The remote side hands the command to its own shell, so it travels
        // as one quoted word.
        args.push(cmd.to_owned());
        shell::join(args.iter().map(String::as_str))
    }
}
