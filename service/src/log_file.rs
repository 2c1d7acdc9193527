//! Job log directory normalisation and unique log file naming.

use std::io;
use std::path::{Path, PathBuf};

use domain::error::ConfigError;
use rand::Rng;

const SUFFIX_LEN: usize = 6;
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Whose home directory a job log directory ends up relative to.
#[derive(Debug, Clone, Copy)]
pub enum LogDirTarget<'a> {
    /// Local job; `owner_home` is set when the owner isn't the submitter.
    Local { owner_home: Option<&'a Path> },
    /// Remote job, whose home directory is unknown in advance.
    Remote,
}

/// Expand `~` and environment variables in a task's own log directory.
pub fn expand(dir: &Path) -> Result<PathBuf, ConfigError> {
    let raw = dir.to_string_lossy();
    shellexpand::full(&raw)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| ConfigError::LogDir {
            path: dir.to_owned(),
            reason: e.to_string(),
        })
}

/// Rebase `dir` from the submitter's home onto the home that applies to the
/// job. Directories outside `submitter_home` are left alone.
pub fn normalize(dir: &Path, submitter_home: &Path, target: LogDirTarget<'_>) -> PathBuf {
    let Ok(relative) = dir.strip_prefix(submitter_home) else {
        return dir.to_owned();
    };
    match target {
        LogDirTarget::Local {
            owner_home: Some(owner_home),
        } => owner_home.join(relative),
        LogDirTarget::Local { owner_home: None } => dir.to_owned(),
        LogDirTarget::Remote => relative.to_owned(),
    }
}

/// Atomically create an empty `<task_id>-XXXXXX<suffix>` file in `dir` and
/// return its path. The name can't collide with any existing file.
pub fn reserve(dir: &Path, task_id: &str, suffix: &str) -> io::Result<PathBuf> {
    let prefix = format!("{task_id}-");
    let (_, path) = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(suffix)
        .rand_bytes(SUFFIX_LEN)
        .tempfile_in(dir)?
        .keep()
        .map_err(|e| e.error)?;
    Ok(path)
}

/// Reserve a unique stdout file and derive its stderr partner from it.
pub fn reserve_logs(dir: &Path, task_id: &str) -> io::Result<(PathBuf, PathBuf)> {
    let stdout = reserve(dir, task_id, ".out")?;
    let stderr = stderr_for(&stdout);
    Ok((stdout, stderr))
}

/// `foo-ABC123.out` -> `foo-ABC123.err`
pub fn stderr_for(stdout: &Path) -> PathBuf {
    stdout.with_extension("err")
}

/// Log names for hosts where nothing can be reserved in advance. Collisions
/// are unlikely but possible.
pub fn random_logs(dir: &Path, task_id: &str) -> (PathBuf, PathBuf) {
    let rnd = random_suffix(&mut rand::thread_rng());
    (
        dir.join(format!("{task_id}-{rnd}.out")),
        dir.join(format!("{task_id}-{rnd}.err")),
    )
}

pub fn random_suffix<R>(rng: &mut R) -> String
where
    R: Rng + ?Sized,
{
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect()
}
