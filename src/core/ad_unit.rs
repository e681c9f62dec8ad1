//! The ad unit: VPAID 2.0 protocol surface and guarded event dispatch.
//!
//! **Architecture**: AdUnit owns its attributes, its event registry and its
//! lifecycle. Rendering, the operator log and the tracking pixel are
//! collaborators behind traits, so the unit runs headless under test.
//!
//! **Used by**: the host harness (`host::HostPlayer`), the scenario runner and
//! the control panel loop in `main.rs`.
//!
//! # Call order
//!
//! handshakeVersion → subscribe... → initAd → lifecycle calls / triggers.
//! Out-of-order calls return `AdError::InvalidState` and change nothing.
//!
//! # Guard policy
//!
//! | Call            | Needs subscriber | Mutates            | Without subscriber   |
//! |-----------------|------------------|--------------------|----------------------|
//! | initAd          | AdLoaded (after) | size, bitrate      | MissingSubscriber    |
//! | resizeAd        | AdSizeChange     | size (atomic)      | MissingSubscriber    |
//! | expandAd        | AdExpanded       | expanded = true    | MissingSubscriber    |
//! | collapseAd      | -                | expanded = false   | -                    |
//! | skipAd          | AdSkipped        | -                  | MissingSubscriber, inert if not skippable |
//! | start/stop/pause/resume | AdStarted/AdStopped/AdPaused/AdPlaying | - | MissingSubscriber |
//! | setAdVolume     | - (best effort)  | volume             | Applied              |
//!
//! initAd is the one call that changes state before checking for a
//! subscriber: the unit is initialized even if AdLoaded goes nowhere.

use crate::collaborators::{
    ActivityLog, EnvironmentVars, HeadlessSurface, NullBeacon, RollingLog, SlotHandle,
    SurfaceRenderer, TrackingBeacon,
};
use crate::core::error::{AdError, InertReason, Outcome, ProtocolResult};
use crate::core::event_registry::EventRegistry;
use crate::core::lifecycle::{AdState, Lifecycle, ProtocolMethod};
use crate::entities::{AdEvent, AttributeSet, ControlClass, EventArgs, ViewMode};
use log::{debug, info, warn};
use std::fmt;
use uuid::Uuid;

/// VPAID version this unit implements, whatever the host offers.
pub const VPAID_VERSION: &str = "2.0";

/// The three side-effect sinks an ad unit talks to.
pub struct Collaborators {
    pub surface: Box<dyn SurfaceRenderer>,
    pub activity: Box<dyn ActivityLog>,
    pub beacon: Box<dyn TrackingBeacon>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::new(HeadlessSurface::new(), RollingLog::new(), NullBeacon)
    }
}

impl Collaborators {
    pub fn new(
        surface: impl SurfaceRenderer + 'static,
        activity: impl ActivityLog + 'static,
        beacon: impl TrackingBeacon + 'static,
    ) -> Self {
        Self {
            surface: Box::new(surface),
            activity: Box::new(activity),
            beacon: Box::new(beacon),
        }
    }
}

/// Stand-in VPAID ad unit.
pub struct AdUnit {
    id: Uuid,
    attrs: AttributeSet,
    registry: EventRegistry,
    lifecycle: Lifecycle,
    /// Container surface from environmentVars (or the one the renderer made)
    slot: Option<SlotHandle>,
    video_slot: Option<SlotHandle>,
    creative_data: String,
    /// Controls wired at initAd, in subscription order
    bound_controls: Vec<AdEvent>,
    collab: Collaborators,
}

impl fmt::Debug for AdUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdUnit")
            .field("id", &self.id)
            .field("state", &self.lifecycle.state())
            .field("attrs", &self.attrs)
            .field("registry", &self.registry)
            .field("slot", &self.slot)
            .field("bound_controls", &self.bound_controls)
            .finish()
    }
}

impl Default for AdUnit {
    fn default() -> Self {
        Self::new()
    }
}

impl AdUnit {
    /// Headless unit: in-memory surface, rolling log, no beacon.
    pub fn new() -> Self {
        Self::with_collaborators(Collaborators::default())
    }

    pub fn with_collaborators(collab: Collaborators) -> Self {
        let id = Uuid::new_v4();
        info!("Ad unit {} created", id);
        Self {
            id,
            attrs: AttributeSet::new(),
            registry: EventRegistry::new(),
            lifecycle: Lifecycle::default(),
            slot: None,
            video_slot: None,
            creative_data: String::new(),
            bound_controls: Vec::new(),
            collab,
        }
    }

    // ========== Helpers ==========

    fn note(&self, message: impl AsRef<str>) {
        self.collab.activity.append(message.as_ref());
    }

    /// Log a failure for the operator and hand it back to the caller.
    fn report(&self, err: AdError) -> ProtocolResult {
        warn!("[{}] {}", self.id, err);
        self.note(err.to_string());
        Err(err)
    }

    fn check(&self, method: ProtocolMethod) -> Result<(), AdError> {
        match self.lifecycle.ensure_method_legal(method) {
            Ok(()) => Ok(()),
            Err(err) => self.report(err).map(|_| ()),
        }
    }

    fn fire(&self, event: AdEvent, args: EventArgs) -> ProtocolResult {
        match self.registry.fire(&event, &args) {
            Ok(()) => Ok(Outcome::Fired),
            Err(err) => self.report(err),
        }
    }

    /// Fail early (and untouched) when `event` has no subscriber.
    fn require(&self, event: AdEvent) -> Result<(), AdError> {
        if self.registry.is_subscribed(&event) {
            return Ok(());
        }
        self.report(AdError::MissingSubscriber { event }).map(|_| ())
    }

    /// Wire a control for every subscribed event that has one.
    fn bind_controls(&mut self) {
        self.bound_controls.clear();
        for event in self.registry.subscribed() {
            match event.control_class() {
                ControlClass::Ignored => debug!("Ignoring {}", event),
                ControlClass::Bindable => {
                    debug!("{} bound to {} control", event, event);
                    self.bound_controls.push(event.clone());
                }
                ControlClass::Unbound | ControlClass::Custom => {
                    debug!("Ignoring custom event {}", event)
                }
            }
        }
    }

    // ========== Protocol: handshake & init ==========

    /// Always answers "2.0"; no negotiation.
    pub fn handshake_version(&mut self, host_version: &str) -> &'static str {
        debug!("handshakeVersion({})", host_version);
        self.lifecycle.mark_handshaken();
        VPAID_VERSION
    }

    /// Store size and bitrate, capture the environment slots, render the
    /// controls, then raise AdLoaded.
    pub fn init_ad(
        &mut self,
        width: u32,
        height: u32,
        view_mode: ViewMode,
        desired_bitrate: u32,
        creative_data: &str,
        env: EnvironmentVars,
    ) -> ProtocolResult {
        debug!("initAd()");
        if let Err(err) = self.lifecycle.mark_initialized() {
            return self.report(err);
        }

        self.video_slot = env.video_slot;
        self.attrs.set_size(width, height, view_mode);
        self.attrs.set_desired_bitrate(desired_bitrate);
        self.creative_data = creative_data.to_string();

        let container = self.collab.surface.materialize(env.slot.as_ref(), &AdEvent::CONTROLS);
        self.slot = Some(container);
        self.bind_controls();

        self.note(format!(
            "initAd {}x{} {} {}",
            width, height, view_mode, desired_bitrate
        ));

        // Signals that every creative file is ready
        self.fire(AdEvent::Loaded, EventArgs::None)
    }

    // ========== Protocol: lifecycle ==========

    /// Resize atomically: either all three attributes change and AdSizeChange
    /// fires, or nothing changes.
    pub fn resize_ad(&mut self, width: u32, height: u32, view_mode: ViewMode) -> ProtocolResult {
        debug!("resizeAd({}, {}, {})", width, height, view_mode);
        self.check(ProtocolMethod::ResizeAd)?;
        self.note(format!(
            "Resizing ad to: {} x {}, viewMode: {} {{AdSizeChange}}",
            width, height, view_mode
        ));
        self.require(AdEvent::SizeChange)?;
        self.attrs.set_size(width, height, view_mode);
        self.fire(AdEvent::SizeChange, EventArgs::None)
    }

    fn plain_lifecycle(&mut self, method: ProtocolMethod, message: &str, event: AdEvent) -> ProtocolResult {
        debug!("{}()", method);
        self.check(method)?;
        self.note(message);
        self.fire(event, EventArgs::None)
    }

    pub fn start_ad(&mut self) -> ProtocolResult {
        self.plain_lifecycle(ProtocolMethod::StartAd, "Starting ad", AdEvent::Started)
    }

    pub fn stop_ad(&mut self) -> ProtocolResult {
        self.plain_lifecycle(ProtocolMethod::StopAd, "Stopping ad", AdEvent::Stopped)
    }

    pub fn pause_ad(&mut self) -> ProtocolResult {
        self.plain_lifecycle(ProtocolMethod::PauseAd, "Pausing ad {AdPaused}", AdEvent::Paused)
    }

    pub fn resume_ad(&mut self) -> ProtocolResult {
        self.plain_lifecycle(ProtocolMethod::ResumeAd, "Resuming ad {AdPlaying}", AdEvent::Playing)
    }

    pub fn expand_ad(&mut self) -> ProtocolResult {
        debug!("expandAd()");
        self.check(ProtocolMethod::ExpandAd)?;
        self.note("Expanding ad {AdExpanded}");
        self.require(AdEvent::Expanded)?;
        self.attrs.set_expanded(true);
        self.fire(AdEvent::Expanded, EventArgs::None)
    }

    /// Collapse never checks subscriptions and raises nothing.
    pub fn collapse_ad(&mut self) -> ProtocolResult {
        debug!("collapseAd()");
        self.check(ProtocolMethod::CollapseAd)?;
        self.note("Collapsing ad");
        self.attrs.set_expanded(false);
        Ok(Outcome::Applied)
    }

    /// Skip requests while not skippable are dropped silently.
    pub fn skip_ad(&mut self) -> ProtocolResult {
        debug!("skipAd()");
        self.check(ProtocolMethod::SkipAd)?;
        self.note("Skipping ad {AdSkipped}");
        if !self.attrs.skippable_state() {
            debug!("skipAd ignored: ad is not skippable");
            return Ok(Outcome::Inert(InertReason::NotSkippable));
        }
        self.fire(AdEvent::Skipped, EventArgs::None)
    }

    // ========== Protocol: subscriptions ==========

    /// Register `callback`, bound to `context`, for `event`. Replaces any
    /// earlier registration; arbitrary extension names are accepted.
    pub fn subscribe<C, F>(&mut self, callback: F, event: impl Into<AdEvent>, context: C)
    where
        C: Send + Sync + 'static,
        F: Fn(&C, &EventArgs) + Send + Sync + 'static,
    {
        let event = event.into().canonical();
        debug!("subscribe({})", event);
        self.registry.subscribe(callback, event, context);
    }

    pub fn unsubscribe(&mut self, event: impl Into<AdEvent>) {
        let event = event.into();
        debug!("unsubscribe({})", event);
        self.note(format!("Unsubscribing {}", event));
        self.registry.unsubscribe(&event);
    }

    pub fn is_subscribed(&self, event: &AdEvent) -> bool {
        self.registry.is_subscribed(event)
    }

    // ========== Protocol: properties ==========

    pub fn get_ad_linear(&self) -> bool {
        let v = self.attrs.linear();
        self.note(format!("Getting ad linear state: {}", v));
        v
    }

    pub fn get_ad_width(&self) -> u32 {
        let v = self.attrs.width();
        self.note(format!("Getting ad width: {}", v));
        v
    }

    pub fn get_ad_height(&self) -> u32 {
        let v = self.attrs.height();
        self.note(format!("Getting ad height: {}", v));
        v
    }

    pub fn get_ad_expanded(&self) -> bool {
        let v = self.attrs.expanded();
        self.note(format!("Getting ad expanded state: {}", v));
        v
    }

    pub fn get_ad_skippable_state(&self) -> bool {
        let v = self.attrs.skippable_state();
        self.note(format!("Getting ad skippable state: {}", v));
        v
    }

    pub fn get_ad_remaining_time(&self) -> f64 {
        let v = self.attrs.remaining_time();
        self.note(format!("Getting ad remaining time: {}", v));
        v
    }

    pub fn get_ad_duration(&self) -> f64 {
        let v = self.attrs.duration();
        self.note(format!("Getting ad duration: {}", v));
        v
    }

    pub fn get_ad_volume(&self) -> f64 {
        let v = self.attrs.volume();
        self.note(format!("Getting ad volume: {}", v));
        v
    }

    pub fn get_ad_companions(&self) -> String {
        let v = self.attrs.companions().to_string();
        self.note(format!("Getting ad companions: {}", v));
        v
    }

    pub fn get_ad_icons(&self) -> String {
        let v = self.attrs.icons().to_string();
        self.note(format!("Getting ad icons: {}", v));
        v
    }

    /// Always writes; AdVolumeChanged is raised only if someone listens.
    pub fn set_ad_volume(&mut self, value: f64) -> Outcome {
        debug!("setAdVolume({})", value);
        self.note(format!("Setting ad volume to: {} {{AdVolumeChanged}}", value));
        self.attrs.set_volume(value);
        match self.registry.fire(&AdEvent::VolumeChanged, &EventArgs::None) {
            Ok(()) => Outcome::Fired,
            Err(_) => Outcome::Applied,
        }
    }

    // ========== Test controls ==========

    /// Toggle skippability (test control, not exposed to the host).
    pub fn set_skippable_state(&mut self, skippable: bool) {
        self.note(format!("Setting ad skippable state: {}", skippable));
        self.attrs.set_skippable_state(skippable);
    }

    /// Raise `event` toward the host as a test control would.
    ///
    /// Click-through, error and interaction take their payload from the
    /// surface's text input; video-progress events fire the tracking beacon
    /// first, whether or not anyone listens.
    pub fn trigger_event(&mut self, event: AdEvent) -> ProtocolResult {
        let event = event.canonical();
        debug!("triggerEvent({})", event);
        self.check(ProtocolMethod::TriggerEvent)?;

        match event {
            AdEvent::ClickThru => {
                self.note("AdClickThru Handler");
                self.require(AdEvent::ClickThru)?;
                let url = self.collab.surface.input_text();
                self.note(format!("adClickThru({}, null, true)", url));
                let args = EventArgs::ClickThru { url, id: None, player_handles: true };
                self.fire(AdEvent::ClickThru, args)
            }
            AdEvent::Error => {
                self.note("AdError Handler");
                self.require(AdEvent::Error)?;
                let message = self.collab.surface.input_text();
                self.note(format!("adError({})", message));
                self.fire(AdEvent::Error, EventArgs::Error { message })
            }
            AdEvent::Interaction => {
                self.note("AdInteraction Handler");
                self.require(AdEvent::Interaction)?;
                let payload = self.collab.surface.input_text();
                self.note(format!("adInteraction({})", payload));
                self.fire(AdEvent::Interaction, EventArgs::Interaction { payload })
            }
            tracked if tracked.is_tracked() => {
                self.note(tracked.as_str());
                self.collab.beacon.fire(&tracked);
                self.fire(tracked, EventArgs::None)
            }
            other => {
                self.note(other.as_str());
                self.fire(other, EventArgs::None)
            }
        }
    }

    /// Surface entry point: a control was pressed. Controls not wired at
    /// initAd do nothing.
    pub fn press_control(&mut self, name: &str) -> ProtocolResult {
        self.check(ProtocolMethod::TriggerEvent)?;
        let event = AdEvent::parse(name);
        if !self.bound_controls.contains(&event) {
            debug!("Control {} is not bound", name);
            return Ok(Outcome::Inert(InertReason::UnboundControl));
        }
        self.trigger_event(event)
    }

    // ========== Accessors ==========

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> AdState {
        self.lifecycle.state()
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attrs
    }

    pub fn bound_controls(&self) -> &[AdEvent] {
        &self.bound_controls
    }

    pub fn slot(&self) -> Option<&SlotHandle> {
        self.slot.as_ref()
    }

    pub fn video_slot(&self) -> Option<&SlotHandle> {
        self.video_slot.as_ref()
    }

    pub fn creative_data(&self) -> &str {
        &self.creative_data
    }
}
