mod batch_system;
mod identity;
mod job_file;
mod shell_runner;

#[rustfmt::skip]
pub use self::{
    batch_system::{BatchSystemHandler, BatchSystems},
    identity::IdentityDatabase,
    job_file::JobFileBuilder,
    shell_runner::ShellRunner,
};
