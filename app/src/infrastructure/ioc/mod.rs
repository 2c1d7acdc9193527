mod container;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use domain::model::vo::RemotePaths;
use domain::service::{BatchSystems, IdentityDatabase, ShellRunner};
use indexmap::IndexMap;
use service::log_file;
use service::prelude::*;

use crate::{
    config::AgentConfig,
    infrastructure::{
        command::TokioShellRunner,
        identity::PasswdIdentity,
        service::{job_scheduler::default_batch_systems, ScriptJobFileBuilder},
    },
};

pub use self::container::Container;

impl Container {
    pub fn new(
        config: &AgentConfig,
        global_environment: IndexMap<String, String>,
    ) -> anyhow::Result<Self> {
        let batch_systems: Arc<BatchSystems> = Arc::new(default_batch_systems());
        batch_systems
            .get(&config.default_batch_system)
            .context("Unsupported `default_batch_system`")?;

        let settings = Arc::new(SubmitSettings {
            default_owner: config.default_owner.clone(),
            default_remote_host: config.default_remote_host.clone(),
            ssh_port: config.ssh_port,
            failout_id: config.failout_id.clone(),
            global_pre_script: config.global_pre_script.clone(),
            global_post_script: config.global_post_script.clone(),
            ..SubmitSettings::builder()
                .run_name(config.run_name.clone())
                .shell(config.shell.clone())
                .job_log_dir(log_file::expand(&config.job_log_dir)?)
                .job_file_dir(log_file::expand(&config.job_file_dir)?)
                .remote_paths(RemotePaths {
                    tool_dir: config.remote_cylc_dir.clone(),
                    suite_dir: config.remote_suite_dir.clone(),
                })
                .owned_task_execution_method(config.owned_task_execution_method.clone())
                .simulation_mode(config.simulation_mode)
                .dummy_command(config.dummy_command.clone())
                .dummy_command_fail(config.dummy_command_fail.clone())
                .default_batch_system(config.default_batch_system.clone())
                .global_environment(global_environment)
                .build()
        });

        let runner: Arc<dyn ShellRunner> = Arc::new(TokioShellRunner::new(
            config.shell.clone(),
            Duration::from_secs(config.command_timeout),
        ));
        let identity: Arc<dyn IdentityDatabase> = Arc::new(PasswdIdentity);

        let container = Container::builder()
            .submit(Arc::new(JobSubmitService::new(
                settings.clone(),
                batch_systems.clone(),
                Arc::new(ScriptJobFileBuilder),
                runner.clone(),
                identity.clone(),
            )))
            .poll(Arc::new(JobPollService::new(settings, batch_systems, runner, identity)))
            .build();

        Ok(container)
    }
}
