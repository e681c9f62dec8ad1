//! Protocol call results.
//!
//! Every protocol method returns `Result<Outcome, AdError>`:
//! - `Ok(Fired)`: the subscribed callback ran
//! - `Ok(Applied)`: state changed, no event (collapseAd, unsubscribed setAdVolume)
//! - `Ok(Inert(_))`: guarded no-op, intentionally silent
//! - `Err(_)`: reported failure, state untouched
//!
//! Nothing here panics; a host can drop the result without consequence.

use crate::core::lifecycle::{AdState, ProtocolMethod};
use crate::entities::AdEvent;
use serde::Serialize;

/// Failures reported back to the caller (and echoed to the activity log).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdError {
    /// An event the host never subscribed to was asked to fire.
    #[error("Invalid callback - {event} not subscribed")]
    MissingSubscriber { event: AdEvent },

    /// Protocol method called out of order.
    #[error("{method} is not allowed while the ad is {state}")]
    InvalidState { method: ProtocolMethod, state: AdState },
}

impl AdError {
    /// Short machine name, used by scenario expectations and the HTTP API.
    pub fn code(&self) -> &'static str {
        match self {
            AdError::MissingSubscriber { .. } => "missing_subscriber",
            AdError::InvalidState { .. } => "invalid_state",
        }
    }
}

/// Why a call did nothing on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InertReason {
    /// skipAd while `skippableState` is false
    NotSkippable,
    /// Control pressed that was never bound at initAd
    UnboundControl,
}

/// Successful protocol call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Fired,
    Applied,
    Inert(InertReason),
}

impl Outcome {
    pub fn code(&self) -> &'static str {
        match self {
            Outcome::Fired => "fired",
            Outcome::Applied => "applied",
            Outcome::Inert(_) => "inert",
        }
    }
}

pub type ProtocolResult = Result<Outcome, AdError>;

/// Machine name of any call result.
pub fn result_code(result: &ProtocolResult) -> &'static str {
    match result {
        Ok(outcome) => outcome.code(),
        Err(e) => e.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AdError::MissingSubscriber { event: AdEvent::SizeChange };
        assert_eq!(err.to_string(), "Invalid callback - AdSizeChange not subscribed");

        let err = AdError::InvalidState {
            method: ProtocolMethod::StartAd,
            state: AdState::Handshaken,
        };
        assert_eq!(err.to_string(), "startAd is not allowed while the ad is handshaken");
    }

    #[test]
    fn test_result_codes() {
        assert_eq!(result_code(&Ok(Outcome::Fired)), "fired");
        assert_eq!(result_code(&Ok(Outcome::Inert(InertReason::NotSkippable))), "inert");
        assert_eq!(
            result_code(&Err(AdError::MissingSubscriber { event: AdEvent::Started })),
            "missing_subscriber"
        );
    }
}
