mod job_file;
pub mod job_scheduler;

pub use self::job_file::ScriptJobFileBuilder;
