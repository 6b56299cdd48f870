//! Cooperative cancellation for spawned timer tasks.

use tokio_util::sync::CancellationToken;

/// Handle to a spawned timer task.
///
/// Cancellation is cooperative: the task stops at its next check point.
/// Cancelling twice is a no-op, and every clone shares the same token, so
/// whichever resolution branch runs first can cancel safely.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
