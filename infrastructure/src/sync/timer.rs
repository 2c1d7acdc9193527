use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

/// Call `f` every `interval` until it breaks, and return what it broke with.
///
/// The first call happens immediately. A call that overruns the interval
/// delays the following ticks instead of bunching them up.
pub async fn new<T, F, Fut>(interval: Duration, mut f: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ControlFlow<T>>,
{
    let mut interval = tokio::time::interval(interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        if let ControlFlow::Break(ret) = f().await {
            break ret;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ops::ControlFlow;
    use std::time::Duration;

    #[tokio::test]
    async fn runs_until_break() {
        let mut calls = 0;
        let ret = super::new(Duration::from_millis(1), || {
            calls += 1;
            let n = calls;
            async move {
                if n == 3 {
                    ControlFlow::Break(n * 10)
                } else {
                    ControlFlow::Continue(())
                }
            }
        })
        .await;
        assert_eq!(30, ret);
        assert_eq!(3, calls);
    }
}
