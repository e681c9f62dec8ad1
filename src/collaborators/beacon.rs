//! Tracking beacon: one-shot, unacknowledged telemetry request.
//!
//! `HttpBeacon` runs a single detached worker thread fed by a bounded channel:
//! - `fire()` builds the hit and `try_send`s it; a full queue drops the hit
//! - the worker issues a GET per hit and only logs failures
//! - dropping the beacon closes the channel, the worker exits on its own
//!
//! Nothing flows back to the caller, so a slow or dead endpoint can never
//! delay or change protocol dispatch.

use crate::entities::AdEvent;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, trace, warn};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Pixel endpoint the probe reports quartiles to by default.
pub const DEFAULT_BEACON_URL: &str = "http://s.innovid.com/1x1.gif?project_hash=1hi0a7&client_id=231&video_id=63295&channel_id=315821&publisher_id=1942&placement_tag_id=0&project_state=2&placement_hash=1im0i9";

/// Fire-and-forget event reporter.
pub trait TrackingBeacon: Send {
    fn fire(&self, event: &AdEvent);
}

/// Build the hit URL: `base` plus cache-buster timestamp and action.
pub fn beacon_url(base: &str, event: &AdEvent, timestamp_ms: u128) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{}{}r={}&action={}", base, sep, timestamp_ms, event.as_str())
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Beacon that never sends anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBeacon;

impl TrackingBeacon for NullBeacon {
    fn fire(&self, event: &AdEvent) {
        trace!("NullBeacon: dropping {}", event);
    }
}

/// Beacon that only remembers which events it was asked to report.
#[derive(Debug, Clone, Default)]
pub struct RecordingBeacon {
    hits: Arc<Mutex<Vec<AdEvent>>>,
}

impl RecordingBeacon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hits(&self) -> Vec<AdEvent> {
        self.hits.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl TrackingBeacon for RecordingBeacon {
    fn fire(&self, event: &AdEvent) {
        self.hits.lock().unwrap_or_else(|e| e.into_inner()).push(event.clone());
    }
}

/// HTTP pixel beacon backed by a detached worker thread.
#[derive(Debug)]
pub struct HttpBeacon {
    base_url: String,
    tx: Sender<String>,
}

impl HttpBeacon {
    /// Spawn the worker. `queue` bounds pending hits, `timeout` bounds each request.
    pub fn spawn(base_url: impl Into<String>, queue: usize, timeout: Duration) -> std::io::Result<Self> {
        let (tx, rx) = bounded::<String>(queue.max(1));
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .build();

        thread::Builder::new()
            .name("vpaid-beacon".to_string())
            .spawn(move || Self::run(agent, rx))?;

        Ok(Self { base_url: base_url.into(), tx })
    }

    fn run(agent: ureq::Agent, rx: Receiver<String>) {
        trace!("Beacon worker started");
        // Ends when every sender is dropped
        for url in rx.iter() {
            match agent.get(&url).call() {
                Ok(resp) => debug!("Beacon {} -> {}", url, resp.status()),
                Err(e) => debug!("Beacon {} failed: {}", url, e),
            }
        }
        trace!("Beacon worker stopped");
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl TrackingBeacon for HttpBeacon {
    fn fire(&self, event: &AdEvent) {
        let url = beacon_url(&self.base_url, event, now_ms());
        match self.tx.try_send(url) {
            Ok(()) => trace!("Beacon queued: {}", event),
            Err(TrySendError::Full(_)) => warn!("Beacon queue full, dropping {}", event),
            Err(TrySendError::Disconnected(_)) => debug!("Beacon worker gone, dropping {}", event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beacon_url_appends_to_query() {
        let url = beacon_url(DEFAULT_BEACON_URL, &AdEvent::VideoMidpoint, 1700000000000);
        assert!(url.starts_with("http://s.innovid.com/1x1.gif?project_hash=1hi0a7&"));
        assert!(url.ends_with("&placement_hash=1im0i9&r=1700000000000&action=AdVideoMidpoint"));
    }

    #[test]
    fn test_beacon_url_without_query() {
        let url = beacon_url("http://localhost/pixel.gif", &AdEvent::Impression, 42);
        assert_eq!(url, "http://localhost/pixel.gif?r=42&action=AdImpression");
    }

    #[test]
    fn test_recording_beacon() {
        let beacon = RecordingBeacon::new();
        let view = beacon.clone();
        beacon.fire(&AdEvent::VideoStart);
        beacon.fire(&AdEvent::VideoComplete);
        assert_eq!(view.hits(), vec![AdEvent::VideoStart, AdEvent::VideoComplete]);
    }

    #[test]
    fn test_http_beacon_never_blocks() {
        // Unroutable endpoint, tiny queue: fire() must return immediately every time
        let beacon = HttpBeacon::spawn("http://127.0.0.1:9/pixel.gif", 1, Duration::from_millis(50))
            .expect("spawn beacon worker");
        let start = std::time::Instant::now();
        for _ in 0..100 {
            beacon.fire(&AdEvent::Impression);
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
