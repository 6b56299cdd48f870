//! Shared status text cells.

use std::sync::{Arc, Mutex, PoisonError};

/// Identifies one particular message shown on a [`StatusLine`].
///
/// Returned by [`StatusLine::set`] and consumed by [`StatusLine::clear_if`]
/// so a deferred clear can tell whether the message it was scheduled for is
/// still the one on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusVersion(u64);

#[derive(Debug, Default)]
struct Cell {
    text: String,
    version: u64,
}

/// A shared, versioned line of status text.
///
/// Every write bumps the version. Deferred clears pass the version of the
/// message they were scheduled against; a clear whose version went stale is
/// a no-op, so a slow clear never erases a newer message.
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    cell: Arc<Mutex<Cell>>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the text and returns the version of the new message.
    pub fn set(&self, text: impl Into<String>) -> StatusVersion {
        let mut cell = self.lock();
        cell.text = text.into();
        cell.version += 1;
        StatusVersion(cell.version)
    }

    pub fn get(&self) -> String {
        self.lock().text.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().text.is_empty()
    }

    /// Version of the message currently displayed.
    pub fn version(&self) -> StatusVersion {
        StatusVersion(self.lock().version)
    }

    /// Unconditionally empties the line.
    pub fn clear(&self) -> StatusVersion {
        self.set(String::new())
    }

    /// Empties the line only if `version` is still the displayed message.
    ///
    /// Returns `true` if the line was cleared.
    pub fn clear_if(&self, version: StatusVersion) -> bool {
        let mut cell = self.lock();
        if cell.version != version.0 {
            return false;
        }
        cell.text.clear();
        cell.version += 1;
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Cell> {
        // A panicked writer leaves plain text behind, which is still safe to
        // show; keep serving it instead of wedging every status consumer.
        self.cell.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
