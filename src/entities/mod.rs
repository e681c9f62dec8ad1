//! Entities module - protocol data types with no behavior of their own
//!
//! - `attrs`: the ad unit's attribute table
//! - `events`: event vocabulary, callback arguments, control classes

pub mod attrs;
pub mod events;

pub use attrs::{AttrKey, AttrKind, AttrValue, AttributeSet, ParseViewModeError, ViewMode};
pub use events::{AdEvent, ControlClass, EventArgs};
