mod poll_jobs;

pub mod prelude {
    #[rustfmt::skip]
    pub use super::{
        poll_jobs::{kill_jobs, poll_jobs, ActiveJobs},
    };
}
