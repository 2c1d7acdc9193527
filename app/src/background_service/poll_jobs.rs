use std::collections::BTreeSet;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use domain::model::entity::JobTarget;
use infrastructure::sync::timer;

use crate::infrastructure::ioc::Container;

/// Active job ids per place they were submitted to.
pub type ActiveJobs = DashMap<JobTarget, BTreeSet<String>>;

/// Poll every target in `jobs` on each tick, dropping jobs once they leave
/// their batch system. Returns when no job is left.
pub async fn poll_jobs(container: Arc<Container>, jobs: Arc<ActiveJobs>, interval: Duration) {
    let (container, jobs) = (container.as_ref(), jobs.as_ref());
    timer::new(interval, move || async move {
        poll_once(container, jobs).await;
        if jobs.is_empty() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })
    .await;
}

async fn poll_once(container: &Container, jobs: &ActiveJobs) {
    let targets = snapshot(jobs);
    let polls = targets.iter().map(|(target, ids)| container.poll.poll(target, ids));
    let reports = futures::future::join_all(polls).await;

    for ((target, _), report) in targets.iter().zip(reports) {
        let report = match report {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(batch_system = %target.batch_system, "Poll failed: {e}");
                continue;
            }
        };
        for id in &report.finished {
            tracing::info!(job_id = %id, host = ?target.host, "Job left {}", target.batch_system);
        }
        jobs.remove_if_mut(target, |_, active| {
            active.retain(|id| !report.finished.contains(id));
            active.is_empty()
        });
    }
}

/// Kill whatever is still active.
pub async fn kill_jobs(container: &Container, jobs: &ActiveJobs) {
    for (target, ids) in snapshot(jobs) {
        for (id, result) in container.poll.kill(&target, &ids).await {
            if result.is_ok() {
                tracing::info!(job_id = %id, "Killed job");
            }
        }
    }
}

fn snapshot(jobs: &ActiveJobs) -> Vec<(JobTarget, Vec<String>)> {
    jobs.iter()
        .map(|entry| (entry.key().clone(), entry.value().iter().cloned().collect()))
        .collect()
}
