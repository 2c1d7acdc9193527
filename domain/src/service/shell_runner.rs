use crate::error::SubmitError;
use crate::model::vo::{CommandOutput, ShellCommand};

#[async_trait::async_trait]
pub trait ShellRunner: Send + Sync {
    /// Run `command` through the shell and wait for it.
    ///
    /// Fails only when the command could not be run at all (spawn failure or
    /// timeout). A command that ran and failed is an `Ok` output whose status
    /// the caller classifies.
    async fn run(&self, command: ShellCommand) -> Result<CommandOutput, SubmitError>;
}
