mod scp;
mod ssh;

pub use self::{
    scp::ScpCommand,
    ssh::{MaybeSsh, SshDestination},
};

use domain::error::SubmitError;
use domain::model::{entity::JobTarget, vo::OwnerSwitch};

use crate::settings::SubmitSettings;

/// Wrap `command` so it runs on the target's host and as the target's owner:
/// through ssh for remote targets, through the configured owner switch for
/// local targets owned by someone other than `submitter`.
pub fn route(
    command: &str,
    target: &JobTarget,
    submitter: &str,
    settings: &SubmitSettings,
) -> Result<String, SubmitError> {
    if let Some(host) = &target.host {
        let ssh = Some(SshDestination::new(
            target.owner.as_deref(),
            host,
            settings.ssh_port,
        ));
        return Ok(ssh.command(command)?);
    }

    let owner = target.owner.as_deref().unwrap_or(submitter);
    let switch = OwnerSwitch::select(submitter, owner, &settings.owned_task_execution_method)?;
    Ok(switch.wrap(owner, command)?)
}

#[cfg(test)]
mod tests {
    use domain::error::{ConfigError, SubmitError};
    use domain::model::entity::JobTarget;

    use super::route;
    use crate::settings::SubmitSettings;

    fn settings(method: &str) -> SubmitSettings {
        SubmitSettings::builder()
            .run_name("test")
            .job_log_dir("/tmp/log")
            .job_file_dir("/tmp/job")
            .owned_task_execution_method(method)
            .build()
    }

    fn target(owner: Option<&str>, host: Option<&str>) -> JobTarget {
        JobTarget {
            batch_system: "slurm".to_owned(),
            owner: owner.map(str::to_owned),
            host: host.map(str::to_owned),
        }
    }

    #[test]
    fn local_self_owned_runs_as_is() {
        let line = route("squeue -h", &target(None, None), "alice", &settings("sudo")).unwrap();
        assert_eq!("squeue -h", line);
    }

    #[test]
    fn local_other_owner_is_switched() {
        let line =
            route("scancel 12", &target(Some("bob"), None), "alice", &settings("sudo")).unwrap();
        assert_eq!("sudo -u bob scancel 12", line);
    }

    #[test]
    fn remote_goes_through_ssh() {
        let line = route(
            "scancel 12",
            &target(Some("bob"), Some("hpc")),
            "alice",
            &settings("bogus"),
        )
        .unwrap();
        let words = shlex::split(&line).unwrap();
        assert_eq!(vec!["ssh", "bob@hpc", "scancel 12"], words);
    }

    #[test]
    fn bad_switch_is_config_error() {
        let err = route("x", &target(Some("bob"), None), "alice", &settings("su")).unwrap_err();
        assert!(matches!(err, SubmitError::Config(ConfigError::UnknownOwnerSwitch(_))));
    }
}
