//! VPAID-PROBE - VPAID 2.0 compliance probe library
//!
//! Re-exports all modules for use by the binary target.

// Protocol engine (lifecycle, registry, ad unit)
pub mod core;

// Side-effect sinks and the harness around the ad unit
pub mod collaborators;
pub mod host;

// App modules
pub mod cli;
pub mod config;
pub mod entities;
pub mod paths;
pub mod server;

// Re-export commonly used types from core
pub use self::core::{AdError, AdState, AdUnit, Collaborators, Outcome, ProtocolResult};

// Re-export entities
pub use entities::{AdEvent, AttrValue, AttributeSet, EventArgs, ViewMode};
