//! Simulated host player around one ad unit.
//!
//! The host subscribes with its journal as the bound context, so every
//! callback the unit raises lands in `EventJournal` together with its
//! arguments. The scenario runner and the control panel both drive an
//! `AdUnit` through a `HostPlayer`.

pub mod scenario;

pub use scenario::{Scenario, ScenarioReport, Step, StepRecord};

use crate::collaborators::{HeadlessSurface, RollingLog, TrackingBeacon};
use crate::core::{AdUnit, Collaborators};
use crate::entities::{AdEvent, EventArgs};
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// One callback invocation as seen by the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceivedEvent {
    pub event: AdEvent,
    pub args: EventArgs,
}

/// Ordered record of callbacks received. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct EventJournal {
    inner: Arc<Mutex<Vec<ReceivedEvent>>>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: AdEvent, args: EventArgs) {
        log::debug!("Host received {}{}", event, args);
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ReceivedEvent { event, args });
    }

    pub fn events(&self) -> Vec<ReceivedEvent> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// How many times `event` reached the host.
    pub fn count(&self, event: &AdEvent) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| &r.event == event)
            .count()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Host player: owns the unit, keeps handles to its headless surface and log.
pub struct HostPlayer {
    unit: AdUnit,
    journal: EventJournal,
    surface: HeadlessSurface,
    log: RollingLog,
}

impl HostPlayer {
    pub fn new(beacon: Box<dyn TrackingBeacon>) -> Self {
        let surface = HeadlessSurface::new();
        let log = RollingLog::new();
        let unit = AdUnit::with_collaborators(Collaborators {
            surface: Box::new(surface.clone()),
            activity: Box::new(log.clone()),
            beacon,
        });
        Self { unit, journal: EventJournal::new(), surface, log }
    }

    /// Subscribe the journal to `event`.
    pub fn subscribe(&mut self, event: impl Into<AdEvent>) {
        let event = event.into();
        let name = event.clone();
        self.unit.subscribe(
            move |journal: &EventJournal, args: &EventArgs| journal.record(name.clone(), args.clone()),
            event,
            self.journal.clone(),
        );
    }

    pub fn subscribe_all<'a>(&mut self, events: impl IntoIterator<Item = &'a AdEvent>) {
        for event in events {
            self.subscribe(event.clone());
        }
    }

    pub fn unit(&self) -> &AdUnit {
        &self.unit
    }

    pub fn unit_mut(&mut self) -> &mut AdUnit {
        &mut self.unit
    }

    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    pub fn surface(&self) -> &HeadlessSurface {
        &self.surface
    }

    pub fn log(&self) -> &RollingLog {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{EnvironmentVars, NullBeacon};
    use crate::core::Outcome;
    use crate::entities::ViewMode;

    fn host() -> HostPlayer {
        HostPlayer::new(Box::new(NullBeacon))
    }

    #[test]
    fn test_journal_records_callbacks_in_order() {
        let mut host = host();
        host.subscribe_all(&[AdEvent::Loaded, AdEvent::Started, AdEvent::ClickThru]);
        host.unit_mut().handshake_version("2.0");
        host.unit_mut()
            .init_ad(640, 480, ViewMode::Normal, 500, "", EnvironmentVars::default())
            .unwrap();
        host.unit_mut().start_ad().unwrap();
        host.surface().set_input("http://example.com");
        host.unit_mut().press_control("AdClickThru").unwrap();

        let events: Vec<AdEvent> = host.journal().events().into_iter().map(|r| r.event).collect();
        assert_eq!(events, vec![AdEvent::Loaded, AdEvent::Started, AdEvent::ClickThru]);
        assert_eq!(
            host.journal().events()[2].args,
            EventArgs::ClickThru { url: "http://example.com".into(), id: None, player_handles: true }
        );
    }

    #[test]
    fn test_unsubscribed_events_never_reach_journal() {
        let mut host = host();
        host.subscribe(AdEvent::Loaded);
        host.unit_mut().handshake_version("2.0");
        host.unit_mut()
            .init_ad(640, 480, ViewMode::Normal, 500, "", EnvironmentVars::default())
            .unwrap();
        assert!(host.unit_mut().expand_ad().is_err());
        assert_eq!(host.unit_mut().set_ad_volume(10.0), Outcome::Applied);
        assert_eq!(host.journal().len(), 1);
        assert_eq!(host.journal().count(&AdEvent::Expanded), 0);
        assert!(host.log().contains("Invalid callback - AdExpanded not subscribed"));
    }
}
