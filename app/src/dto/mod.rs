pub mod task;

#[rustfmt::skip]
pub use self::{
    task::*,
};
