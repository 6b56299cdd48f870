//! Timing and status primitives shared by the kiosk flows.
//!
//! The flows in `rollcall-business` show transient text to the user while
//! they wait on slow physical devices. This crate provides the three
//! building blocks they need:
//!
//! - [`StatusLine`]: a shared, versioned line of status text,
//! - [`Countdown`]: a cancellable one-second ticker writing into a line,
//! - [`run_after`]: a cancellable one-shot delayed action (auto-clears,
//!   delayed resets).
//!
//! All timers run as tokio tasks and cancel cooperatively via
//! [`CancelHandle`].

mod countdown;
mod deferred;
mod status;
mod task;

pub use countdown::Countdown;
pub use deferred::run_after;
pub use status::{StatusLine, StatusVersion};
pub use task::CancelHandle;
