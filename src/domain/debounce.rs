//! Quiet-period delay for the archive search input.
//!
//! The browser owns the timer: datastar cancels and reschedules the request on
//! every keystroke, so the server only renders the modifier.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebouncePolicy {
    delay: Duration,
}

impl DebouncePolicy {
    pub fn from_millis(millis: u64) -> Self {
        Self {
            delay: Duration::from_millis(millis),
        }
    }

    /// Event modifier applied to client-side input handlers, e.g. `__debounce.200ms`.
    pub fn event_modifier(&self) -> String {
        format!("__debounce.{}ms", self.delay.as_millis())
    }
}
