use std::path::Path;

use domain::error::HandlerError;
use domain::shell;

use super::SshDestination;

/// Builds an `scp` command line copying local files to an [`SshDestination`].
pub struct ScpCommand<'a> {
    ssh: &'a SshDestination,
    args: Vec<String>,
}

impl SshDestination {
    pub fn scp(&self) -> ScpCommand<'_> {
        let mut args = vec!["scp".to_owned()];
        if let Some(port) = self.port {
            args.extend(["-P".to_owned(), port.to_string()]);
        }
        ScpCommand { ssh: self, args }
    }
}

impl ScpCommand<'_> {
    #[inline]
    pub fn local_path(&mut self, p: impl AsRef<Path>) -> &mut Self {
        self.args.push(p.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Destination relative to the remote home directory; an empty path
    /// drops the file straight into it.
    pub fn remote_path(&mut self, p: impl AsRef<Path>) -> &mut Self {
        self.args.push(format!(
            "{}:{}",
            self.ssh.username_host,
            p.as_ref().to_string_lossy()
        ));
        self
    }

    pub fn build(&self) -> Result<String, HandlerError> {
        shell::join(self.args.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use crate::command::SshDestination;

    #[test]
    fn copy_into_remote_home() {
        let ssh = SshDestination::new(Some("bob"), "hpc", None);
        let line = ssh
            .scp()
            .local_path("/tmp/jobs/foo.1-AB12CD.sh")
            .remote_path("")
            .build()
            .unwrap();
        assert_eq!("scp /tmp/jobs/foo.1-AB12CD.sh bob@hpc:", line);
    }

    #[test]
    fn port_and_subdirectory() {
        let ssh = SshDestination::new(None, "hpc", Some(2222));
        let line = ssh.scp().local_path("/tmp/job.sh").remote_path("jobs").build().unwrap();
        assert_eq!("scp -P 2222 /tmp/job.sh hpc:jobs", line);
    }
}
