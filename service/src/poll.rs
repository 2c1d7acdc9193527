use std::sync::Arc;

use domain::{
    error::SubmitError,
    model::{
        entity::JobTarget,
        vo::{ExitKind, PollReport, ShellCommand},
    },
    service::{BatchSystems, IdentityDatabase, ShellRunner},
    shell,
};

use crate::command;
use crate::settings::SubmitSettings;

/// Polls and kills jobs that were submitted earlier, through the command
/// templates of their batch system.
pub struct JobPollService {
    settings: Arc<SubmitSettings>,
    batch_systems: Arc<BatchSystems>,
    runner: Arc<dyn ShellRunner>,
    identity: Arc<dyn IdentityDatabase>,
}

impl JobPollService {
    pub fn new(
        settings: Arc<SubmitSettings>,
        batch_systems: Arc<BatchSystems>,
        runner: Arc<dyn ShellRunner>,
        identity: Arc<dyn IdentityDatabase>,
    ) -> Self {
        Self {
            settings,
            batch_systems,
            runner,
            identity,
        }
    }

    /// Query all of `job_ids` with a single poll command.
    pub async fn poll(
        &self,
        target: &JobTarget,
        job_ids: &[String],
    ) -> Result<PollReport, SubmitError> {
        if job_ids.is_empty() {
            return Ok(PollReport::default());
        }
        let handler = self.batch_systems.get(&target.batch_system)?;
        let poll = shell::join(handler.poll_command(job_ids).iter().map(String::as_str))?;
        let line = self.route(target, &poll)?;

        tracing::debug!(command = %line, "Polling {} jobs", job_ids.len());
        let out = self.runner.run(ShellCommand::new(&line)).await?;
        let status = out.status;
        let out = match status {
            ExitKind::Exited(code) if handler.accepts_poll_exit(code, &out.stderr) => out,
            _ => out.check(&line)?,
        };

        let active = handler.extract_poll_ids(&out.stdout);
        let finished = job_ids
            .iter()
            .filter(|id| !active.contains(id.as_str()))
            .cloned()
            .collect();
        Ok(PollReport { active, finished })
    }

    /// Kill each of `job_ids` with its own command. A failure for one id
    /// doesn't stop the others.
    pub async fn kill(
        &self,
        target: &JobTarget,
        job_ids: &[String],
    ) -> Vec<(String, Result<(), SubmitError>)> {
        let kills = job_ids.iter().map(|id| async move {
            let result = self.kill_one(target, id).await;
            if let Err(e) = &result {
                tracing::error!(job_id = %id, "Failed to kill job: {e}");
            }
            (id.clone(), result)
        });
        futures::future::join_all(kills).await
    }

    async fn kill_one(&self, target: &JobTarget, job_id: &str) -> Result<(), SubmitError> {
        let handler = self.batch_systems.get(&target.batch_system)?;
        let kill = handler.kill_command(job_id)?;
        let line = self.route(target, &kill)?;
        tracing::info!(command = %line, "Killing job");
        self.runner.run(ShellCommand::new(&line)).await?.check(&line)?;
        Ok(())
    }

    fn route(&self, target: &JobTarget, line: &str) -> Result<String, SubmitError> {
        let submitter = self.identity.submitter()?;
        command::route(line, target, &submitter.name, &self.settings)
    }
}
