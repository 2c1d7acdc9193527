pub mod command;
#[cfg(test)]
mod fake;
pub mod log_file;
pub mod poll;
pub mod settings;
pub mod submit;

pub mod prelude {
    #[rustfmt::skip]
    pub use super::{
        poll::JobPollService,
        settings::SubmitSettings,
        submit::JobSubmitService,
    };
}
