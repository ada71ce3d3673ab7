use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Work performed once per timer firing.
///
/// Ticks may do blocking I/O: [`spawn_periodic`] runs each one on tokio's
/// blocking pool.
pub trait Tick: Send + 'static {
    fn tick(&mut self);
}

/// Run `task` every `interval` on a tokio task until `cancel` fires.
///
/// The first tick happens immediately. Missed ticks are delayed rather than
/// burst, so a slow tick stretches the cadence instead of piling up. The task
/// is handed back through the join handle once the loop stops.
pub fn spawn_periodic<T: Tick>(
    name: &'static str,
    mut task: T,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<T> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(
            consumer = name,
            interval_ms = interval.as_millis() as u64,
            "consumer started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => task = tick_blocking(task).await,
            }
        }

        tracing::info!(consumer = name, "consumer stopped");
        task
    })
}

/// Runs one tick off the async workers and takes the task back.
///
/// A panicking tick is re-raised on the periodic task.
async fn tick_blocking<T: Tick>(mut task: T) -> T {
    let result = tokio::task::spawn_blocking(move || {
        task.tick();
        task
    })
    .await;
    match result {
        Ok(task) => task,
        // Blocking tasks are never aborted, so the only error is a panic.
        Err(e) => std::panic::resume_unwind(e.into_panic()),
    }
}
