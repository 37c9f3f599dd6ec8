//! Runtime-dependent helpers
//!
//! Deadlines need a timer, which only the Tokio runtime provides here.
//! Without the `runtime-tokio` feature every future runs unbounded.

use std::future::Future;
use std::time::Duration;

/// Await `task`, giving up after `limit` if one is set.
///
/// Returns the elapsed limit on expiry.
#[cfg(feature = "runtime-tokio")]
pub(crate) async fn bounded<F: Future>(limit: Option<Duration>, task: F) -> Result<F::Output, Duration> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| limit),
        None => Ok(task.await),
    }
}

#[cfg(not(feature = "runtime-tokio"))]
pub(crate) async fn bounded<F: Future>(limit: Option<Duration>, task: F) -> Result<F::Output, Duration> {
    if limit.is_some() {
        log::debug!("Deadline ignored: built without the runtime-tokio feature");
    }
    Ok(task.await)
}
