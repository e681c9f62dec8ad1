//! Operator-facing activity log.
//!
//! Rolling policy: the first entry replaces the placeholder text, every later
//! entry is counted, and once more than `ROLLOVER_AFTER` entries have been
//! counted the log is wiped before the next append. Each entry is also echoed
//! to the `log` facade under target `vpaid::activity`.

use std::sync::{Arc, Mutex};

/// Counted entries kept before the log is wiped.
pub const ROLLOVER_AFTER: usize = 10;

/// Text shown before anything was logged.
pub const PLACEHOLDER: &str = "Waiting for the host player...";

/// Append-only text sink.
pub trait ActivityLog: Send {
    fn append(&self, message: &str);
}

#[derive(Debug)]
struct RollingState {
    lines: Vec<String>,
    counter: usize,
    fresh: bool,
}

/// Bounded activity log. Clones share the same buffer.
#[derive(Debug, Clone)]
pub struct RollingLog {
    inner: Arc<Mutex<RollingState>>,
}

impl Default for RollingLog {
    fn default() -> Self {
        Self::new()
    }
}

impl RollingLog {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RollingState {
                lines: vec![PLACEHOLDER.to_string()],
                counter: 0,
                fresh: true,
            })),
        }
    }

    /// Current visible lines (oldest first).
    pub fn entries(&self) -> Vec<String> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).lines.clone()
    }

    pub fn last(&self) -> Option<String> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).lines.last().cloned()
    }

    /// Whether any visible line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .lines
            .iter()
            .any(|l| l.contains(needle))
    }
}

impl ActivityLog for RollingLog {
    fn append(&self, message: &str) {
        log::info!(target: "vpaid::activity", "{}", message);

        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if state.fresh {
            state.lines = vec![message.to_string()];
            state.fresh = false;
            return;
        }
        if state.counter > ROLLOVER_AFTER {
            state.lines.clear();
            state.counter = 0;
        }
        state.lines.push(message.to_string());
        state.counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_entry_replaces_placeholder() {
        let log = RollingLog::new();
        assert_eq!(log.entries(), vec![PLACEHOLDER.to_string()]);

        log.append("initAd 640x480 normal 500");
        assert_eq!(log.entries(), vec!["initAd 640x480 normal 500".to_string()]);
    }

    #[test]
    fn test_rollover_clears_after_threshold() {
        let log = RollingLog::new();
        log.append("first");
        for i in 0..=ROLLOVER_AFTER {
            log.append(&format!("line {}", i));
        }
        // placeholder-replacing entry plus 11 counted lines
        assert_eq!(log.entries().len(), ROLLOVER_AFTER + 2);

        log.append("after rollover");
        assert_eq!(log.entries(), vec!["after rollover".to_string()]);
    }

    #[test]
    fn test_clones_share_buffer() {
        let log = RollingLog::new();
        let view = log.clone();
        log.append("one");
        log.append("two");
        assert_eq!(view.last().as_deref(), Some("two"));
        assert!(view.contains("one"));
    }
}
