//! Ticking countdown shown while waiting on a slow device.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;

use crate::{CancelHandle, StatusLine};

/// A one-second countdown written into a [`StatusLine`].
///
/// The countdown is purely informational: it never aborts whatever the
/// caller is waiting on, and the wait may well outlast it. The display is
/// clamped at zero; once zero has been shown the ticker ends on its own,
/// but the handle must still be cancelled on every resolution branch
/// (cancelling an already-finished countdown is harmless).
pub struct Countdown;

impl Countdown {
    /// Writes `render(secs)` immediately, then spawns a task that writes
    /// `render(n)` for each remaining second n down to 0.
    pub fn start<F>(rt: &Handle, secs: u32, sink: &StatusLine, render: F) -> CancelHandle
    where
        F: Fn(u32) -> String + Send + 'static,
    {
        let handle = CancelHandle::new();
        let token = handle.token();
        sink.set(render(secs));

        let sink = sink.clone();
        rt.spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick of a tokio interval completes immediately.
            interval.tick().await;

            let mut remaining = secs;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        if remaining == 0 {
                            break;
                        }
                        remaining -= 1;
                        sink.set(render(remaining));
                    }
                }
            }
            log::trace!("Countdown: ticker finished at {remaining}s");
        });

        handle
    }
}
