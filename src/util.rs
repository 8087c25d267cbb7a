//! Timing helpers for log output.

use std::time::Instant;

/// RAII timer that logs elapsed time on drop.
///
/// # Example
/// ```ignore
/// let _t = Timed::debug("cell list build");
/// // ... do work ...
/// // logs "cell list build: 1.234ms" when _t is dropped
/// ```
pub(crate) struct Timed {
    name: &'static str,
    start: Instant,
    level: log::Level,
}

impl Timed {
    /// Create a new timer that logs at DEBUG level.
    pub(crate) fn debug(name: &'static str) -> Self {
        log::trace!("{}...", name);
        Self {
            name,
            start: Instant::now(),
            level: log::Level::Debug,
        }
    }
}

impl Drop for Timed {
    fn drop(&mut self) {
        if log::log_enabled!(self.level) {
            log::log!(self.level, "{}: {:.3?}", self.name, self.start.elapsed());
        }
    }
}
