use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use domain::{
    error::{ConfigError, SubmitError},
    model::{
        entity::JobTarget,
        vo::{
            Account, CommandOutput, JobConf, JobScript, OutputRedirect, OwnerSwitch, RemotePaths,
            ShellCommand, SubmitOutcome, SubmitReport, TaskSubmission,
        },
    },
    service::{BatchSystemHandler, BatchSystems, IdentityDatabase, JobFileBuilder, ShellRunner},
    shell,
};
use tracing::Instrument;

use crate::command::{MaybeSsh, SshDestination};
use crate::log_file::{self, LogDirTarget};
use crate::settings::SubmitSettings;

/// Turns task submissions into job files and runs whatever command gets each
/// job to its batch system, locally or on a remote host, as the right owner.
pub struct JobSubmitService {
    settings: Arc<SubmitSettings>,
    batch_systems: Arc<BatchSystems>,
    job_files: Arc<dyn JobFileBuilder>,
    runner: Arc<dyn ShellRunner>,
    identity: Arc<dyn IdentityDatabase>,
}

/// Who runs one attempt and where.
struct Placement {
    submitter: Account,
    owner: String,
    locality: Locality,
}

enum Locality {
    /// Submitted from the owner's home directory.
    Local { home: PathBuf },
    Remote { host: String },
}

/// A job file that has been written and the command that submits it.
struct Attempt<'a> {
    handler: &'a dyn BatchSystemHandler,
    placement: &'a Placement,
    /// The file on this host.
    job_path: PathBuf,
    /// The file as the submit command sees it.
    submit_path: PathBuf,
    command: String,
    dry_run: bool,
}

impl Placement {
    #[inline]
    fn is_owned(&self) -> bool {
        self.owner != self.submitter.name
    }

    fn target(&self, batch_system: &str) -> JobTarget {
        let (owner, host) = match &self.locality {
            Locality::Local { .. } => (self.is_owned().then(|| self.owner.clone()), None),
            Locality::Remote { host } => (Some(self.owner.clone()), Some(host.clone())),
        };
        JobTarget {
            batch_system: batch_system.to_owned(),
            owner,
            host,
        }
    }
}

impl Attempt<'_> {
    fn outcome(&self, out: &CommandOutput) -> Result<SubmitOutcome, SubmitError> {
        let job_id = Some(self.handler.extract_submit_id(&out.stdout)?);
        Ok(if self.handler.detaches() {
            SubmitOutcome::Detached { job_id }
        } else {
            SubmitOutcome::Submitted { job_id }
        })
    }
}

impl JobSubmitService {
    pub fn new(
        settings: Arc<SubmitSettings>,
        batch_systems: Arc<BatchSystems>,
        job_files: Arc<dyn JobFileBuilder>,
        runner: Arc<dyn ShellRunner>,
        identity: Arc<dyn IdentityDatabase>,
    ) -> Self {
        Self {
            settings,
            batch_systems,
            job_files,
            runner,
            identity,
        }
    }

    /// Submit one task. Every failure is reported in the returned outcome;
    /// nothing here aborts other submissions running alongside.
    pub async fn submit(&self, task: TaskSubmission) -> SubmitReport {
        let span = tracing::info_span!("submit", task_id = %task.task_id);
        async move {
            let mut report = SubmitReport {
                outcome: SubmitOutcome::Submitted { job_id: None },
                log_paths: Vec::new(),
                target: None,
            };
            report.outcome = match self.try_submit(task, &mut report).await {
                Ok(outcome) => {
                    tracing::info!(job_id = ?outcome.job_id(), "Job {outcome}");
                    outcome
                }
                Err(e) => {
                    tracing::error!("Job submission failed: {e}");
                    SubmitOutcome::Failed(e)
                }
            };
            report
        }
        .instrument(span)
        .await
    }

    async fn try_submit(
        &self,
        task: TaskSubmission,
        report: &mut SubmitReport,
    ) -> Result<SubmitOutcome, SubmitError> {
        let settings = &self.settings;
        let placement = self.place(&task)?;
        let batch_system = task.batch_system.as_deref().unwrap_or(&settings.default_batch_system);
        let handler = self.batch_systems.get(batch_system)?;
        report.target = Some(placement.target(handler.name()));

        let log_dir = self.log_dir(&task, &placement).await?;
        let (stdout, stderr) = self.log_names(&task, &log_dir, &placement)?;
        report.log_paths.extend([stdout.clone(), stderr.clone()]);

        let job_path = self.reserve_job_file(&task.task_id).await?;
        let submit_path = match placement.locality {
            Locality::Local { .. } => job_path.clone(),
            // scp drops the file into the remote home directory, where ssh
            // commands start.
            Locality::Remote { .. } => home_relative(&job_path),
        };

        let directives = handler.format_directives(&JobConf {
            task_id: &task.task_id,
            run_name: &settings.run_name,
            job_file_path: &submit_path,
            stdout_path: &stdout,
            stderr_path: &stderr,
            execution_time_limit: task.execution_time_limit,
            directives: &task.directives,
        })?;

        let remote = matches!(placement.locality, Locality::Remote { .. });
        let remote_paths = if remote {
            task.remote_paths.clone().or(&settings.remote_paths)
        } else {
            RemotePaths::default()
        };
        let script = JobScript {
            path: job_path,
            task_id: task.task_id.clone(),
            batch_system: handler.name().to_owned(),
            shell: settings.shell.clone(),
            directives,
            output_redirect: (!handler.redirects_output()).then(|| OutputRedirect {
                stdout: stdout.clone(),
                stderr: stderr.clone(),
            }),
            global_environment: settings.global_environment.clone(),
            environment: task.environment.clone(),
            global_pre_script: settings.global_pre_script.clone(),
            pre_script: task.pre_script.clone(),
            command: self.task_command(&task),
            post_script: task.post_script.clone(),
            global_post_script: settings.global_post_script.clone(),
            remote_tool_dir: remote_paths.tool_dir,
            remote_suite_dir: remote_paths.suite_dir,
            remote,
            simulation_mode: settings.simulation_mode,
        };
        let job_path = self.job_files.write(script).await.map_err(SubmitError::JobFile)?;
        let command = handler.submit_command(&submit_path)?;

        let attempt = Attempt {
            handler: &*handler,
            placement: &placement,
            job_path,
            submit_path,
            command,
            dry_run: task.dry_run,
        };
        match &placement.locality {
            Locality::Local { home } => self.submit_local(attempt, home, report).await,
            Locality::Remote { host } => self.submit_remote(attempt, host).await,
        }
    }

    /// Resolve owner and locality. Simulation mode keeps everything local and
    /// owned by the submitter so dummy runs never leave this host.
    fn place(&self, task: &TaskSubmission) -> Result<Placement, SubmitError> {
        let settings = &self.settings;
        let submitter = self.identity.submitter()?;
        let owner = task
            .owner
            .clone()
            .or_else(|| settings.default_owner.clone())
            .unwrap_or_else(|| submitter.name.clone());
        let host = task.remote_host.as_ref().or(settings.default_remote_host.as_ref());

        if let Some(host) = host.filter(|_| !settings.simulation_mode) {
            return Ok(Placement {
                submitter,
                owner,
                locality: Locality::Remote { host: host.clone() },
            });
        }

        let owner = if settings.simulation_mode {
            submitter.name.clone()
        } else {
            owner
        };
        let home = self.identity.home_dir(&owner).ok_or_else(|| ConfigError::HomeDirNotFound {
            task_id: task.task_id.clone(),
            owner: owner.clone(),
        })?;
        Ok(Placement {
            submitter,
            owner,
            locality: Locality::Local { home },
        })
    }

    fn task_command(&self, task: &TaskSubmission) -> String {
        let settings = &self.settings;
        if !settings.simulation_mode {
            return task.command.clone();
        }
        if settings.failout_id.as_deref() == Some(task.task_id.as_str()) {
            settings.dummy_command_fail.clone()
        } else {
            settings.dummy_command.clone()
        }
    }

    async fn log_dir(
        &self,
        task: &TaskSubmission,
        placement: &Placement,
    ) -> Result<PathBuf, SubmitError> {
        let dir = match &task.job_log_dir {
            Some(dir) => log_file::expand(dir)?,
            None => self.settings.job_log_dir.clone(),
        };
        let target = match &placement.locality {
            Locality::Remote { .. } => LogDirTarget::Remote,
            Locality::Local { home } => LogDirTarget::Local {
                owner_home: placement.is_owned().then_some(home.as_path()),
            },
        };
        let dir = log_file::normalize(&dir, &placement.submitter.home, target);

        // Directories of other owners and on other hosts must already exist.
        if matches!(placement.locality, Locality::Local { .. })
            && !placement.is_owned()
            && !task.dry_run
        {
            tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                SubmitError::transport(
                    format!("cannot create job log directory {}", dir.display()),
                    e,
                )
            })?;
        }
        Ok(dir)
    }

    fn log_names(
        &self,
        task: &TaskSubmission,
        dir: &Path,
        placement: &Placement,
    ) -> Result<(PathBuf, PathBuf), SubmitError> {
        let task_id = task.task_id.as_str();
        if task.dry_run || matches!(placement.locality, Locality::Remote { .. }) {
            return Ok(log_file::random_logs(dir, task_id));
        }
        match log_file::reserve_logs(dir, task_id) {
            Ok(names) => Ok(names),
            Err(e) if placement.is_owned() => {
                tracing::warn!(
                    "Cannot reserve log names in {} owned by {}: {e}",
                    dir.display(),
                    placement.owner
                );
                Ok(log_file::random_logs(dir, task_id))
            }
            Err(e) => Err(SubmitError::transport(
                format!("cannot reserve log file names in {}", dir.display()),
                e,
            )),
        }
    }

    async fn reserve_job_file(&self, task_id: &str) -> Result<PathBuf, SubmitError> {
        let dir = &self.settings.job_file_dir;
        let context = || format!("cannot create job file in {}", dir.display());
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| SubmitError::transport(context(), e))?;
        log_file::reserve(dir, task_id, ".sh").map_err(|e| SubmitError::transport(context(), e))
    }

    async fn submit_local(
        &self,
        attempt: Attempt<'_>,
        home: &Path,
        report: &mut SubmitReport,
    ) -> Result<SubmitOutcome, SubmitError> {
        report.log_paths.push(attempt.job_path.clone());
        make_executable(&attempt.job_path).await?;

        // The job is submitted from the owner's home directory, the only
        // directory sure to exist and be writable by the owner beforehand.
        match tokio::fs::metadata(home).await {
            Ok(meta) if meta.is_dir() => (),
            Ok(_) => {
                return Err(SubmitError::transport(
                    "Failed to change to task owner's home directory",
                    io::Error::other(format!("{} is not a directory", home.display())),
                ))
            }
            Err(e) => {
                return Err(SubmitError::transport(
                    "Failed to change to task owner's home directory",
                    e,
                ))
            }
        }

        let placement = attempt.placement;
        let switch = OwnerSwitch::select(
            &placement.submitter.name,
            &placement.owner,
            &self.settings.owned_task_execution_method,
        )?;
        let command = switch.wrap(&placement.owner, &attempt.command)?;

        if attempt.dry_run {
            println!(" > TASK JOB SCRIPT: {}", attempt.job_path.display());
            println!(" > JOB SUBMISSION METHOD: {command}");
            return Ok(SubmitOutcome::Submitted { job_id: None });
        }

        tracing::info!(%command, "Submitting task");
        let out = self
            .runner
            .run(ShellCommand::new(&command).current_dir(home))
            .await?
            .check(&command)?;
        attempt.outcome(&out)
    }

    async fn submit_remote(
        &self,
        attempt: Attempt<'_>,
        host: &str,
    ) -> Result<SubmitOutcome, SubmitError> {
        make_executable(&attempt.job_path).await?;

        let destination =
            SshDestination::new(Some(&attempt.placement.owner), host, self.settings.ssh_port);
        let copy = destination.scp().local_path(&attempt.job_path).remote_path("").build()?;
        let exec = Some(destination).command(&attempt.command)?;

        if attempt.dry_run {
            println!(" > LOCAL TASK JOB SCRIPT: {}", attempt.job_path.display());
            println!(" > WOULD COPY TO REMOTE HOST AS: {copy}");
            println!(" > REMOTE TASK JOB SCRIPT: {}", attempt.submit_path.display());
            println!(" > REMOTE JOB SUBMISSION METHOD: {exec}");
            return Ok(SubmitOutcome::Submitted { job_id: None });
        }

        tracing::info!(command = %copy, "Copying job file to remote host");
        self.runner.run(ShellCommand::new(&copy)).await?.check(&copy)?;

        tracing::info!(command = %exec, "Submitting task");
        let out = self.runner.run(ShellCommand::new(&exec)).await?.check(&exec)?;
        attempt.outcome(&out)
    }

    /// Delete a job file left by an earlier submission. Submissions never do
    /// this themselves since job files stay registered as viewable logs.
    pub async fn remove_job_file(
        &self,
        job_file: &Path,
        target: &JobTarget,
    ) -> Result<(), SubmitError> {
        let Some(host) = &target.host else {
            return tokio::fs::remove_file(job_file).await.map_err(|e| {
                SubmitError::transport(format!("cannot delete {}", job_file.display()), e)
            });
        };

        let remote_file = home_relative(job_file).to_string_lossy().into_owned();
        let rm = shell::join(["rm", remote_file.as_str()])?;
        let ssh = Some(SshDestination::new(
            target.owner.as_deref(),
            host,
            self.settings.ssh_port,
        ));
        let line = ssh.command(&rm)?;
        tracing::info!(command = %line, "Deleting remote job file");
        self.runner.run(ShellCommand::new(&line)).await?.check(&line)?;
        Ok(())
    }
}

/// `./<file name>`: the job file once copied into a remote home directory.
fn home_relative(job_path: &Path) -> PathBuf {
    match job_path.file_name() {
        Some(name) => Path::new(".").join(name),
        None => job_path.to_owned(),
    }
}

async fn make_executable(path: &Path) -> Result<(), SubmitError> {
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o777))
        .await
        .map_err(|e| SubmitError::transport(format!("cannot chmod {}", path.display()), e))
}
