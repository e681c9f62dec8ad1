//! VPAID event vocabulary.
//!
//! `AdEvent` names every event the protocol defines plus `Custom(String)` for
//! host-specific extension names. Parsing never fails: unknown names become
//! `Custom`, so the registry keyspace stays open.
//!
//! # Control classes
//!
//! Test controls exist for 18 events (the trigger panel). When binding
//! controls at `initAd`, every subscribed name falls in one class:
//!
//! | Class       | Meaning                                          |
//! |-------------|--------------------------------------------------|
//! | `Ignored`   | protocol event the unit never raises from a control |
//! | `Bindable`  | has a trigger control                            |
//! | `Unbound`   | protocol event raised by lifecycle calls only    |
//! | `Custom`    | host extension name, never bound                 |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol event name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AdEvent {
    Loaded,
    Started,
    Stopped,
    Skipped,
    SizeChange,
    Expanded,
    Paused,
    Playing,
    VolumeChanged,
    ClickThru,
    Error,
    Interaction,
    Impression,
    VideoStart,
    VideoFirstQuartile,
    VideoMidpoint,
    VideoThirdQuartile,
    VideoComplete,
    DurationChange,
    ExpandedChange,
    VolumeChange,
    SkippableStateChange,
    LinearChange,
    RemainingTimeChange,
    UserAcceptInvitation,
    UserMinimize,
    UserClose,
    Log,
    /// Host-defined extension event.
    Custom(String),
}

/// How a subscribed event relates to the trigger controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlClass {
    Ignored,
    Bindable,
    Unbound,
    Custom,
}

impl AdEvent {
    /// Events with a trigger control, in panel order.
    pub const CONTROLS: [AdEvent; 18] = [
        AdEvent::Impression,
        AdEvent::VideoFirstQuartile,
        AdEvent::VideoMidpoint,
        AdEvent::VideoThirdQuartile,
        AdEvent::VideoComplete,
        AdEvent::Started,
        AdEvent::VideoStart,
        AdEvent::Stopped,
        AdEvent::Skipped,
        AdEvent::SizeChange,
        AdEvent::DurationChange,
        AdEvent::ExpandedChange,
        AdEvent::VolumeChange,
        AdEvent::ClickThru,
        AdEvent::Interaction,
        AdEvent::Paused,
        AdEvent::Playing,
        AdEvent::Error,
    ];

    /// Protocol events never bound to a control.
    pub const IGNORED: [AdEvent; 8] = [
        AdEvent::Loaded,
        AdEvent::SkippableStateChange,
        AdEvent::LinearChange,
        AdEvent::RemainingTimeChange,
        AdEvent::UserAcceptInvitation,
        AdEvent::UserMinimize,
        AdEvent::UserClose,
        AdEvent::Log,
    ];

    /// Every known protocol event (no `Custom`).
    pub const KNOWN: [AdEvent; 28] = [
        AdEvent::Loaded,
        AdEvent::Started,
        AdEvent::Stopped,
        AdEvent::Skipped,
        AdEvent::SizeChange,
        AdEvent::Expanded,
        AdEvent::Paused,
        AdEvent::Playing,
        AdEvent::VolumeChanged,
        AdEvent::ClickThru,
        AdEvent::Error,
        AdEvent::Interaction,
        AdEvent::Impression,
        AdEvent::VideoStart,
        AdEvent::VideoFirstQuartile,
        AdEvent::VideoMidpoint,
        AdEvent::VideoThirdQuartile,
        AdEvent::VideoComplete,
        AdEvent::DurationChange,
        AdEvent::ExpandedChange,
        AdEvent::VolumeChange,
        AdEvent::SkippableStateChange,
        AdEvent::LinearChange,
        AdEvent::RemainingTimeChange,
        AdEvent::UserAcceptInvitation,
        AdEvent::UserMinimize,
        AdEvent::UserClose,
        AdEvent::Log,
    ];

    /// Wire name as used by the protocol (`AdVideoMidpoint`, ...).
    pub fn as_str(&self) -> &str {
        match self {
            AdEvent::Loaded => "AdLoaded",
            AdEvent::Started => "AdStarted",
            AdEvent::Stopped => "AdStopped",
            AdEvent::Skipped => "AdSkipped",
            AdEvent::SizeChange => "AdSizeChange",
            AdEvent::Expanded => "AdExpanded",
            AdEvent::Paused => "AdPaused",
            AdEvent::Playing => "AdPlaying",
            AdEvent::VolumeChanged => "AdVolumeChanged",
            AdEvent::ClickThru => "AdClickThru",
            AdEvent::Error => "AdError",
            AdEvent::Interaction => "AdInteraction",
            AdEvent::Impression => "AdImpression",
            AdEvent::VideoStart => "AdVideoStart",
            AdEvent::VideoFirstQuartile => "AdVideoFirstQuartile",
            AdEvent::VideoMidpoint => "AdVideoMidpoint",
            AdEvent::VideoThirdQuartile => "AdVideoThirdQuartile",
            AdEvent::VideoComplete => "AdVideoComplete",
            AdEvent::DurationChange => "AdDurationChange",
            AdEvent::ExpandedChange => "AdExpandedChange",
            AdEvent::VolumeChange => "AdVolumeChange",
            AdEvent::SkippableStateChange => "AdSkippableStateChange",
            AdEvent::LinearChange => "AdLinearChange",
            AdEvent::RemainingTimeChange => "AdRemainingTimeChange",
            AdEvent::UserAcceptInvitation => "AdUserAcceptInvitation",
            AdEvent::UserMinimize => "AdUserMinimize",
            AdEvent::UserClose => "AdUserClose",
            AdEvent::Log => "AdLog",
            AdEvent::Custom(name) => name,
        }
    }

    /// Parse a wire name. Unknown names become `Custom`.
    pub fn parse(name: &str) -> AdEvent {
        AdEvent::KNOWN
            .into_iter()
            .find(|e| e.as_str() == name)
            .unwrap_or_else(|| AdEvent::Custom(name.to_string()))
    }

    /// Fold a `Custom` that spells a protocol name onto the protocol variant.
    pub fn canonical(self) -> AdEvent {
        match self {
            AdEvent::Custom(name) => AdEvent::from(name),
            known => known,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, AdEvent::Custom(_))
    }

    pub fn control_class(&self) -> ControlClass {
        if self.is_custom() {
            ControlClass::Custom
        } else if AdEvent::IGNORED.contains(self) {
            ControlClass::Ignored
        } else if AdEvent::CONTROLS.contains(self) {
            ControlClass::Bindable
        } else {
            ControlClass::Unbound
        }
    }

    /// Video-progress events that fire the tracking beacon before dispatch.
    pub fn is_tracked(&self) -> bool {
        matches!(
            self,
            AdEvent::Impression
                | AdEvent::VideoStart
                | AdEvent::VideoFirstQuartile
                | AdEvent::VideoMidpoint
                | AdEvent::VideoThirdQuartile
                | AdEvent::VideoComplete
        )
    }
}

impl fmt::Display for AdEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for AdEvent {
    fn from(name: &str) -> Self {
        AdEvent::parse(name)
    }
}

impl From<String> for AdEvent {
    fn from(name: String) -> Self {
        match AdEvent::parse(&name) {
            AdEvent::Custom(_) => AdEvent::Custom(name),
            known => known,
        }
    }
}

impl From<AdEvent> for String {
    fn from(event: AdEvent) -> Self {
        match event {
            AdEvent::Custom(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// Arguments a callback receives, by event.
///
/// Everything except click-through, error and interaction carries no arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventArgs {
    None,
    ClickThru {
        url: String,
        /// Click-through id; the probe never sets one.
        id: Option<String>,
        /// True when the player should open the url itself.
        player_handles: bool,
    },
    Error {
        message: String,
    },
    Interaction {
        payload: String,
    },
}

impl fmt::Display for EventArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventArgs::None => write!(f, "()"),
            EventArgs::ClickThru { url, id, player_handles } => write!(
                f,
                "({}, {}, {})",
                url,
                id.as_deref().unwrap_or("null"),
                player_handles
            ),
            EventArgs::Error { message } => write!(f, "({})", message),
            EventArgs::Interaction { payload } => write!(f, "({})", payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_and_custom() {
        assert_eq!(AdEvent::parse("AdVideoMidpoint"), AdEvent::VideoMidpoint);
        assert_eq!(AdEvent::parse("AdLoaded"), AdEvent::Loaded);
        assert_eq!(
            AdEvent::parse("PlayerSpecificThing"),
            AdEvent::Custom("PlayerSpecificThing".into())
        );
        // Case matters on the wire
        assert!(AdEvent::parse("adloaded").is_custom());
    }

    #[test]
    fn test_canonical_folds_protocol_spellings() {
        assert_eq!(AdEvent::Custom("AdSizeChange".into()).canonical(), AdEvent::SizeChange);
        assert_eq!(AdEvent::Custom("VendorPing".into()).canonical(), AdEvent::Custom("VendorPing".into()));
        assert_eq!(AdEvent::Expanded.canonical(), AdEvent::Expanded);
    }

    #[test]
    fn test_known_names_are_unique() {
        let mut names: Vec<&str> = AdEvent::KNOWN.iter().map(|e| e.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), AdEvent::KNOWN.len());
    }

    #[test]
    fn test_control_classes() {
        assert_eq!(AdEvent::Loaded.control_class(), ControlClass::Ignored);
        assert_eq!(AdEvent::Log.control_class(), ControlClass::Ignored);
        assert_eq!(AdEvent::ClickThru.control_class(), ControlClass::Bindable);
        assert_eq!(AdEvent::VolumeChange.control_class(), ControlClass::Bindable);
        // Raised by expandAd / setAdVolume only
        assert_eq!(AdEvent::Expanded.control_class(), ControlClass::Unbound);
        assert_eq!(AdEvent::VolumeChanged.control_class(), ControlClass::Unbound);
        assert_eq!(AdEvent::Custom("x".into()).control_class(), ControlClass::Custom);

        let bindable = AdEvent::KNOWN
            .iter()
            .filter(|e| e.control_class() == ControlClass::Bindable)
            .count();
        assert_eq!(bindable, AdEvent::CONTROLS.len());
    }

    #[test]
    fn test_tracked_events() {
        let tracked: Vec<_> = AdEvent::KNOWN.iter().filter(|e| e.is_tracked()).collect();
        assert_eq!(tracked.len(), 6);
        assert!(AdEvent::VideoComplete.is_tracked());
        assert!(!AdEvent::Started.is_tracked());
    }

    #[test]
    fn test_serde_as_wire_name() {
        let json = serde_json::to_string(&AdEvent::VideoStart).unwrap();
        assert_eq!(json, "\"AdVideoStart\"");
        let custom: AdEvent = serde_json::from_str("\"MyEvent\"").unwrap();
        assert_eq!(custom, AdEvent::Custom("MyEvent".into()));
    }

    #[test]
    fn test_click_thru_args_display() {
        let args = EventArgs::ClickThru {
            url: "http://example.com".into(),
            id: None,
            player_handles: true,
        };
        assert_eq!(args.to_string(), "(http://example.com, null, true)");
    }
}
