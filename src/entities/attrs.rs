//! Ad unit attribute storage.
//!
//! Fixed key set from the VPAID 2.0 property table, typed values.
//! Notes:
//! - Keys are `AttrKey`; the protocol name (`desiredBitrate`, `viewMode`, ...)
//!   is only used at the edges (logs, JSON snapshots, scenario expectations).
//! - Only typed setters are public, so a key always holds its declared type.
//! - Serializes as a JSON object keyed by protocol name.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Player view mode passed by `initAd` / `resizeAd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Normal,
    Thumbnail,
    Fullscreen,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Normal => "normal",
            ViewMode::Thumbnail => "thumbnail",
            ViewMode::Fullscreen => "fullscreen",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected view mode string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown view mode '{0}' (expected normal, thumbnail or fullscreen)")]
pub struct ParseViewModeError(pub String);

impl FromStr for ViewMode {
    type Err = ParseViewModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(ViewMode::Normal),
            "thumbnail" => Ok(ViewMode::Thumbnail),
            "fullscreen" => Ok(ViewMode::Fullscreen),
            other => Err(ParseViewModeError(other.to_string())),
        }
    }
}

/// Declared type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Bool,
    UInt,
    Number,
    Text,
    ViewMode,
}

/// Attribute keys, ordered like the protocol property table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttrKey {
    Companions,
    DesiredBitrate,
    Duration,
    Expanded,
    Height,
    Icons,
    Linear,
    RemainingTime,
    SkippableState,
    ViewMode,
    Width,
    Volume,
}

impl AttrKey {
    pub const ALL: [AttrKey; 12] = [
        AttrKey::Companions,
        AttrKey::DesiredBitrate,
        AttrKey::Duration,
        AttrKey::Expanded,
        AttrKey::Height,
        AttrKey::Icons,
        AttrKey::Linear,
        AttrKey::RemainingTime,
        AttrKey::SkippableState,
        AttrKey::ViewMode,
        AttrKey::Width,
        AttrKey::Volume,
    ];

    /// Protocol property name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttrKey::Companions => "companions",
            AttrKey::DesiredBitrate => "desiredBitrate",
            AttrKey::Duration => "duration",
            AttrKey::Expanded => "expanded",
            AttrKey::Height => "height",
            AttrKey::Icons => "icons",
            AttrKey::Linear => "linear",
            AttrKey::RemainingTime => "remainingTime",
            AttrKey::SkippableState => "skippableState",
            AttrKey::ViewMode => "viewMode",
            AttrKey::Width => "width",
            AttrKey::Volume => "volume",
        }
    }

    pub fn from_name(name: &str) -> Option<AttrKey> {
        AttrKey::ALL.into_iter().find(|k| k.as_str() == name)
    }

    pub fn kind(&self) -> AttrKind {
        match self {
            AttrKey::Companions | AttrKey::Icons => AttrKind::Text,
            AttrKey::DesiredBitrate | AttrKey::Height | AttrKey::Width => AttrKind::UInt,
            AttrKey::Duration | AttrKey::RemainingTime | AttrKey::Volume => AttrKind::Number,
            AttrKey::Expanded | AttrKey::Linear | AttrKey::SkippableState => AttrKind::Bool,
            AttrKey::ViewMode => AttrKind::ViewMode,
        }
    }
}

impl fmt::Display for AttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute value.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    UInt(u32),
    Number(f64),
    Text(String),
    ViewMode(ViewMode),
}

impl AttrValue {
    pub fn kind(&self) -> AttrKind {
        match self {
            AttrValue::Bool(_) => AttrKind::Bool,
            AttrValue::UInt(_) => AttrKind::UInt,
            AttrValue::Number(_) => AttrKind::Number,
            AttrValue::Text(_) => AttrKind::Text,
            AttrValue::ViewMode(_) => AttrKind::ViewMode,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(v) => write!(f, "{}", v),
            AttrValue::UInt(v) => write!(f, "{}", v),
            AttrValue::Number(v) => write!(f, "{}", v),
            AttrValue::Text(v) => f.write_str(v),
            AttrValue::ViewMode(v) => f.write_str(v.as_str()),
        }
    }
}

/// Attribute container: `AttrKey` → typed value, every key always present.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSet {
    map: BTreeMap<AttrKey, AttrValue>,
}

impl Default for AttributeSet {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeSet {
    /// Attribute table with the initial values the ad unit starts from.
    pub fn new() -> Self {
        let mut attrs = Self { map: BTreeMap::new() };
        attrs.set(AttrKey::Companions, AttrValue::Text(String::new()));
        attrs.set(AttrKey::DesiredBitrate, AttrValue::UInt(256));
        attrs.set(AttrKey::Duration, AttrValue::Number(15.0));
        attrs.set(AttrKey::Expanded, AttrValue::Bool(false));
        attrs.set(AttrKey::Height, AttrValue::UInt(0));
        attrs.set(AttrKey::Icons, AttrValue::Text(String::new()));
        attrs.set(AttrKey::Linear, AttrValue::Bool(true));
        attrs.set(AttrKey::RemainingTime, AttrValue::Number(5.0));
        attrs.set(AttrKey::SkippableState, AttrValue::Bool(false));
        attrs.set(AttrKey::ViewMode, AttrValue::ViewMode(ViewMode::Normal));
        attrs.set(AttrKey::Width, AttrValue::UInt(0));
        attrs.set(AttrKey::Volume, AttrValue::Number(50.0));
        attrs
    }

    fn set(&mut self, key: AttrKey, value: AttrValue) {
        debug_assert_eq!(key.kind(), value.kind(), "attribute {} type mismatch", key);
        self.map.insert(key, value);
    }

    pub fn get(&self, key: AttrKey) -> &AttrValue {
        // Every key is inserted by new() and never removed
        &self.map[&key]
    }

    /// Lookup by protocol name (`viewMode`, `desiredBitrate`, ...).
    pub fn get_by_name(&self, name: &str) -> Option<&AttrValue> {
        AttrKey::from_name(name).map(|k| self.get(k))
    }

    pub fn get_bool(&self, key: AttrKey) -> Option<bool> {
        match self.map.get(&key) {
            Some(AttrValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_u32(&self, key: AttrKey) -> Option<u32> {
        match self.map.get(&key) {
            Some(AttrValue::UInt(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_number(&self, key: AttrKey) -> Option<f64> {
        match self.map.get(&key) {
            Some(AttrValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_text(&self, key: AttrKey) -> Option<&str> {
        match self.map.get(&key) {
            Some(AttrValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    // Typed accessors (keys are fixed, so the defaults are unreachable)

    pub fn width(&self) -> u32 {
        self.get_u32(AttrKey::Width).unwrap_or(0)
    }

    pub fn height(&self) -> u32 {
        self.get_u32(AttrKey::Height).unwrap_or(0)
    }

    pub fn desired_bitrate(&self) -> u32 {
        self.get_u32(AttrKey::DesiredBitrate).unwrap_or(256)
    }

    pub fn view_mode(&self) -> ViewMode {
        match self.map.get(&AttrKey::ViewMode) {
            Some(AttrValue::ViewMode(v)) => *v,
            _ => ViewMode::Normal,
        }
    }

    pub fn expanded(&self) -> bool {
        self.get_bool(AttrKey::Expanded).unwrap_or(false)
    }

    pub fn linear(&self) -> bool {
        self.get_bool(AttrKey::Linear).unwrap_or(true)
    }

    pub fn skippable_state(&self) -> bool {
        self.get_bool(AttrKey::SkippableState).unwrap_or(false)
    }

    pub fn duration(&self) -> f64 {
        self.get_number(AttrKey::Duration).unwrap_or(15.0)
    }

    pub fn remaining_time(&self) -> f64 {
        self.get_number(AttrKey::RemainingTime).unwrap_or(5.0)
    }

    pub fn volume(&self) -> f64 {
        self.get_number(AttrKey::Volume).unwrap_or(50.0)
    }

    pub fn companions(&self) -> &str {
        self.get_text(AttrKey::Companions).unwrap_or_default()
    }

    pub fn icons(&self) -> &str {
        self.get_text(AttrKey::Icons).unwrap_or_default()
    }

    // Typed setters

    /// Write the three size attributes together (init / resize).
    pub fn set_size(&mut self, width: u32, height: u32, view_mode: ViewMode) {
        self.set(AttrKey::Width, AttrValue::UInt(width));
        self.set(AttrKey::Height, AttrValue::UInt(height));
        self.set(AttrKey::ViewMode, AttrValue::ViewMode(view_mode));
    }

    pub fn set_desired_bitrate(&mut self, kbps: u32) {
        self.set(AttrKey::DesiredBitrate, AttrValue::UInt(kbps));
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        self.set(AttrKey::Expanded, AttrValue::Bool(expanded));
    }

    pub fn set_skippable_state(&mut self, skippable: bool) {
        self.set(AttrKey::SkippableState, AttrValue::Bool(skippable));
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.set(AttrKey::Volume, AttrValue::Number(volume));
    }

    /// Iterate over all attributes in table order.
    pub fn iter(&self) -> impl Iterator<Item = (AttrKey, &AttrValue)> {
        self.map.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Serialize for AttributeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.map.len()))?;
        for (key, value) in &self.map {
            map.serialize_entry(key.as_str(), value)?;
        }
        map.end()
    }
}
