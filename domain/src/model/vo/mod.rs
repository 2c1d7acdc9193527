pub mod command;
pub mod directive;
pub mod job;
pub mod outcome;
pub mod owner_switch;
pub mod submission;

#[rustfmt::skip]
pub use self::{
    command::{CommandOutput, ExitKind, ShellCommand},
    directive::{Directives, JobConf},
    job::{JobScript, OutputRedirect},
    outcome::{PollReport, SubmitOutcome, SubmitReport},
    owner_switch::OwnerSwitch,
    submission::{Account, RemotePaths, TaskSubmission},
};
