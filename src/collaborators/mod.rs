//! Side-effect collaborators the ad unit calls into.
//!
//! None of these have protocol state of their own:
//! - `surface`: test control rendering and the text input
//! - `activity_log`: operator log with rolling clear
//! - `beacon`: fire-and-forget tracking pixel

pub mod activity_log;
pub mod beacon;
pub mod surface;

pub use activity_log::{ActivityLog, RollingLog};
pub use beacon::{HttpBeacon, NullBeacon, RecordingBeacon, TrackingBeacon, DEFAULT_BEACON_URL};
pub use surface::{EnvironmentVars, HeadlessSurface, SlotHandle, SurfaceRenderer};
