mod background;
mod pbs;
mod slurm;

use std::collections::BTreeSet;

use domain::model::vo::{Directives, JobConf};
use domain::service::BatchSystems;
use regex::Regex;

#[rustfmt::skip]
pub use self::{
    background::BackgroundHandler,
    pbs::PbsHandler,
    slurm::SlurmHandler,
};

/// Every backend the agent knows, keyed on its name.
pub fn default_batch_systems() -> BatchSystems {
    BatchSystems::new()
        .register(BackgroundHandler)
        .register(PbsHandler::default())
        .register(SlurmHandler::hetjob())
        .register(SlurmHandler::packjob())
}

/// The directive set of one job: `reserved` entries first, then the time
/// limit unless the user set `time_key` themselves, then the user's own
/// entries, which replace reserved ones in place. A zero limit means none.
fn merge_directives<'a>(
    conf: &JobConf<'_>,
    reserved: impl IntoIterator<Item = (&'a str, String)>,
    time_key: &str,
    time_value: impl FnOnce(u64) -> String,
) -> Directives {
    let mut directives: Directives = reserved.into_iter().collect();
    if let Some(limit) = conf.execution_time_limit.filter(|limit| !limit.is_zero()) {
        if !conf.directives.contains_key(time_key) {
            directives.insert(time_key, time_value(limit.as_secs()));
        }
    }
    for (key, value) in conf.directives.iter() {
        directives.insert(key, value);
    }
    directives
}

/// First capture group of `re` on every line of `stdout` that matches it.
fn ids_by_line(re: &Regex, stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .filter_map(|line| re.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|id| id.as_str().to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::default_batch_systems;

    #[test]
    fn registry() {
        assert_eq!(
            vec!["background", "pbs", "slurm", "slurm_packjob"],
            default_batch_systems().names()
        );
    }
}
