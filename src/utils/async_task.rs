use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::NetworkError;

/// Runs `task` under `deadline`, abandoning it as soon as `root` is cancelled.
pub(crate) async fn with_deadline<F, T, E>(
    root: &CancellationToken,
    deadline: Duration,
    task: F,
) -> std::result::Result<T, NetworkError>
where
    F: Future<Output = std::result::Result<T, E>>,
    E: Into<NetworkError>,
{
    tokio::select! {
        biased;
        _ = root.cancelled() => Err(NetworkError::Cancelled),
        r = timeout(deadline, task) => match r {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(NetworkError::Timeout(deadline)),
        },
    }
}

/// Sleeps for `d` unless `root` fires first. Returns false when cancelled.
pub(crate) async fn sleep_or_cancelled(
    root: &CancellationToken,
    d: Duration,
) -> bool {
    tokio::select! {
        _ = root.cancelled() => false,
        _ = tokio::time::sleep(d) => true,
    }
}
