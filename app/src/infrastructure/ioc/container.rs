use std::sync::Arc;

use service::prelude::*;
use typed_builder::TypedBuilder;

#[derive(TypedBuilder)]
pub struct Container {
    pub submit: Arc<JobSubmitService>,
    pub poll: Arc<JobPollService>,
}
