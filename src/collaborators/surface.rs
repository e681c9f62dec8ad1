//! Surface renderer: where the test controls live.
//!
//! The core never touches a visual surface. It hands the renderer the
//! container handle from `environmentVars` (if any) and the list of controls,
//! and later reads back the text input when a control needs a payload
//! (click-through url, error message, interaction payload).

use crate::entities::AdEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Opaque reference to a host-provided surface (container or video element).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotHandle(String);

impl SlotHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh container for units whose host passed no usable slot.
    pub fn detached() -> Self {
        Self(format!("detached-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Runtime handles the host passes to `initAd`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentVars {
    #[serde(default)]
    pub slot: Option<SlotHandle>,
    #[serde(default)]
    pub video_slot: Option<SlotHandle>,
}

impl EnvironmentVars {
    pub fn new(slot: impl Into<String>, video_slot: impl Into<String>) -> Self {
        Self {
            slot: Some(SlotHandle::new(slot)),
            video_slot: Some(SlotHandle::new(video_slot)),
        }
    }
}

pub trait SurfaceRenderer: Send {
    /// Place one control per event into `slot` (or a new container when
    /// `slot` is `None`) and return the container actually used.
    fn materialize(&self, slot: Option<&SlotHandle>, controls: &[AdEvent]) -> SlotHandle;

    /// Current contents of the text input.
    fn input_text(&self) -> String;
}

#[derive(Debug, Default)]
struct HeadlessState {
    container: Option<SlotHandle>,
    controls: Vec<AdEvent>,
    input: String,
}

/// In-memory surface. Clones share state so a test or the control panel
/// can type into the input while the ad unit owns the renderer.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    inner: Arc<Mutex<HeadlessState>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).input = text.into();
    }

    pub fn controls(&self) -> Vec<AdEvent> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).controls.clone()
    }

    pub fn container(&self) -> Option<SlotHandle> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).container.clone()
    }
}

impl SurfaceRenderer for HeadlessSurface {
    fn materialize(&self, slot: Option<&SlotHandle>, controls: &[AdEvent]) -> SlotHandle {
        let container = slot.cloned().unwrap_or_else(SlotHandle::detached);
        log::debug!("Rendering {} controls into {}", controls.len(), container);

        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.container = Some(container.clone());
        state.controls = controls.to_vec();
        container
    }

    fn input_text(&self) -> String {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).input.clone()
    }
}
