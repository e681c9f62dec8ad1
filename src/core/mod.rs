//! Protocol engine - lifecycle, registry, dispatch
//!
//! These modules form the ad unit, independent of any surface or transport.

pub mod ad_unit;
pub mod error;
pub mod event_registry;
pub mod lifecycle;

// Re-exports for convenience
pub use ad_unit::{AdUnit, Collaborators, VPAID_VERSION};
pub use error::{result_code, AdError, InertReason, Outcome, ProtocolResult};
pub use event_registry::{Callback, EventRegistry};
pub use lifecycle::{AdState, Lifecycle, ProtocolMethod};
