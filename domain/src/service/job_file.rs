use std::path::PathBuf;

use crate::model::vo::JobScript;

#[async_trait::async_trait]
pub trait JobFileBuilder: Send + Sync {
    /// Write `script` to `script.path`, replacing anything already there, and
    /// return the path of the written file.
    async fn write(&self, script: JobScript) -> anyhow::Result<PathBuf>;
}
