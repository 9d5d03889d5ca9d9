use crate::{AppError, AppResult};
use std::time::Duration;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

/// Runs file-system or OS work on the blocking pool. A panic or abort of the
/// job comes back as an `AppError` tagged with `label`.
pub async fn run_blocking<T, F>(label: &'static str, job: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> AppResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .unwrap_or_else(|error| Err(join_failure(label, &error)))
}

fn join_failure(label: &'static str, error: &JoinError) -> AppError {
    let failure = if error.is_cancelled() {
        AppError::new("blocking_task_canceled", "后台任务被取消")
    } else if error.is_panic() {
        AppError::new("blocking_task_panicked", "后台任务发生 panic")
            .with_context("joinError", format!("{error:?}"))
    } else {
        AppError::new("blocking_task_failed", "后台任务执行失败")
            .with_context("joinError", format!("{error:?}"))
    };
    failure.with_context("blockingTask", label)
}

/// Sleeps for `duration` unless `cancel` fires first. Returns `false` when the
/// sleep was cut short by cancellation.
pub async fn sleep_or_cancel(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

#[cfg(test)]
#[path = "../../tests/blocking_tests.inc"]
mod blocking_tests;
