//! Protocol call ordering.
//!
//! `Loaded → Handshaken → Initialized`. handshakeVersion moves out of
//! `Loaded`, initAd is legal exactly once from `Handshaken`, and lifecycle
//! calls plus test-control triggers need `Initialized`. Getters, subscribe,
//! unsubscribe and setAdVolume are legal everywhere and are not listed.

use crate::core::error::AdError;
use serde::Serialize;
use std::fmt;

/// Where the ad unit is in the protocol sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdState {
    Loaded,
    Handshaken,
    Initialized,
}

impl AdState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdState::Loaded => "loaded",
            AdState::Handshaken => "handshaken",
            AdState::Initialized => "initialized",
        }
    }
}

impl fmt::Display for AdState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order-checked protocol entry points. handshakeVersion is legal in every
/// state and goes through `mark_handshaken` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProtocolMethod {
    InitAd,
    ResizeAd,
    StartAd,
    StopAd,
    PauseAd,
    ResumeAd,
    ExpandAd,
    CollapseAd,
    SkipAd,
    TriggerEvent,
}

impl ProtocolMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InitAd => "initAd",
            Self::ResizeAd => "resizeAd",
            Self::StartAd => "startAd",
            Self::StopAd => "stopAd",
            Self::PauseAd => "pauseAd",
            Self::ResumeAd => "resumeAd",
            Self::ExpandAd => "expandAd",
            Self::CollapseAd => "collapseAd",
            Self::SkipAd => "skipAd",
            Self::TriggerEvent => "triggerEvent",
        }
    }
}

impl fmt::Display for ProtocolMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lifecycle {
    state: AdState,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self { state: AdState::Loaded }
    }
}

impl Lifecycle {
    pub fn state(&self) -> AdState {
        self.state
    }

    pub fn ensure_method_legal(&self, method: ProtocolMethod) -> Result<(), AdError> {
        if legal_states_for_method(method).contains(&self.state) {
            return Ok(());
        }
        Err(AdError::InvalidState { method, state: self.state })
    }

    /// Handshake only advances a freshly loaded unit; repeats are harmless.
    pub fn mark_handshaken(&mut self) {
        if self.state == AdState::Loaded {
            self.state = AdState::Handshaken;
        }
    }

    pub fn mark_initialized(&mut self) -> Result<(), AdError> {
        self.ensure_method_legal(ProtocolMethod::InitAd)?;
        self.state = AdState::Initialized;
        Ok(())
    }
}

fn legal_states_for_method(method: ProtocolMethod) -> &'static [AdState] {
    use AdState as S;
    match method {
        ProtocolMethod::InitAd => &[S::Handshaken],
        ProtocolMethod::ResizeAd
        | ProtocolMethod::StartAd
        | ProtocolMethod::StopAd
        | ProtocolMethod::PauseAd
        | ProtocolMethod::ResumeAd
        | ProtocolMethod::ExpandAd
        | ProtocolMethod::CollapseAd
        | ProtocolMethod::SkipAd
        | ProtocolMethod::TriggerEvent => &[S::Initialized],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_legality_matrix_enforced() {
        let mut lifecycle = Lifecycle::default();
        assert_eq!(lifecycle.state(), AdState::Loaded);
        assert!(lifecycle.ensure_method_legal(ProtocolMethod::InitAd).is_err());
        assert!(lifecycle.ensure_method_legal(ProtocolMethod::StartAd).is_err());

        lifecycle.mark_handshaken();
        assert!(lifecycle.ensure_method_legal(ProtocolMethod::InitAd).is_ok());
        assert!(lifecycle.ensure_method_legal(ProtocolMethod::SkipAd).is_err());

        lifecycle.mark_initialized().expect("handshaken -> initialized");
        assert!(lifecycle.ensure_method_legal(ProtocolMethod::StartAd).is_ok());
        assert!(lifecycle.ensure_method_legal(ProtocolMethod::TriggerEvent).is_ok());
        assert!(lifecycle.ensure_method_legal(ProtocolMethod::InitAd).is_err());
    }

    #[test]
    fn test_init_requires_handshake() {
        let mut lifecycle = Lifecycle::default();
        let err = lifecycle.mark_initialized().expect_err("init before handshake");
        assert_eq!(
            err,
            AdError::InvalidState { method: ProtocolMethod::InitAd, state: AdState::Loaded }
        );
        assert_eq!(lifecycle.state(), AdState::Loaded);
    }

    #[test]
    fn test_second_init_rejected() {
        let mut lifecycle = Lifecycle::default();
        lifecycle.mark_handshaken();
        lifecycle.mark_initialized().expect("first init");
        assert!(lifecycle.mark_initialized().is_err());
        // Late handshake does not roll the state back
        lifecycle.mark_handshaken();
        assert_eq!(lifecycle.state(), AdState::Initialized);
    }
}
