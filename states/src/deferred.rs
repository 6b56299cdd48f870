//! One-shot delayed actions.

use std::time::Duration;

use tokio::runtime::Handle;

use crate::CancelHandle;

/// Runs `action` once after `delay`, unless cancelled first.
///
/// Used for the auto-clear of transient status messages and the delayed
/// form reset after a successful registration. Callers that cannot cancel
/// (because the handle is gone by the time the state moved on) should make
/// the action itself stale-proof, e.g. via [`crate::StatusLine::clear_if`].
pub fn run_after<F>(rt: &Handle, delay: Duration, action: F) -> CancelHandle
where
    F: FnOnce() + Send + 'static,
{
    let handle = CancelHandle::new();
    let token = handle.token();
    rt.spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = tokio::time::sleep(delay) => action(),
        }
    });
    handle
}
