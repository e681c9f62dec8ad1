//! JSON-described protocol scenarios.
//!
//! A scenario is a named list of steps, each tagged by `op`. Action steps
//! drive the unit and remember the last result; `expect_*` steps check it.
//! Every step runs, failures are collected into the report rather than
//! aborting the run.
//!
//! ```json
//! { "name": "resize guard",
//!   "steps": [
//!     { "op": "handshake", "version": "2.0" },
//!     { "op": "subscribe", "events": ["AdLoaded"] },
//!     { "op": "init", "width": 640, "height": 480 },
//!     { "op": "resize", "width": 800, "height": 600, "view_mode": "fullscreen" },
//!     { "op": "expect_outcome", "outcome": "missing_subscriber" }
//!   ] }
//! ```

use super::HostPlayer;
use crate::collaborators::EnvironmentVars;
use crate::core::{result_code, ProtocolResult};
use crate::entities::{AdEvent, ViewMode};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_host_version() -> String {
    "2.0".to_string()
}

fn default_bitrate() -> u32 {
    256
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Handshake {
        #[serde(default = "default_host_version")]
        version: String,
    },
    Subscribe {
        events: Vec<AdEvent>,
    },
    Unsubscribe {
        events: Vec<AdEvent>,
    },
    Init {
        width: u32,
        height: u32,
        #[serde(default)]
        view_mode: ViewMode,
        #[serde(default = "default_bitrate")]
        desired_bitrate: u32,
        #[serde(default)]
        creative_data: String,
        #[serde(default)]
        environment: EnvironmentVars,
    },
    Resize {
        width: u32,
        height: u32,
        #[serde(default)]
        view_mode: ViewMode,
    },
    Start,
    Stop,
    Pause,
    Resume,
    Expand,
    Collapse,
    Skip,
    SetVolume {
        value: f64,
    },
    SetSkippable {
        value: bool,
    },
    SetInput {
        text: String,
    },
    Trigger {
        event: AdEvent,
    },
    Press {
        control: String,
    },
    /// Code of the last call: fired, applied, inert, missing_subscriber, invalid_state
    ExpectOutcome {
        outcome: String,
    },
    /// Attribute by protocol name, compared as JSON
    ExpectAttr {
        name: String,
        value: serde_json::Value,
    },
    /// Times the host received `event` so far
    ExpectFired {
        event: AdEvent,
        count: usize,
    },
    /// Version answered by the last handshake
    ExpectVersion {
        version: String,
    },
}

impl Step {
    pub fn op(&self) -> &'static str {
        match self {
            Step::Handshake { .. } => "handshake",
            Step::Subscribe { .. } => "subscribe",
            Step::Unsubscribe { .. } => "unsubscribe",
            Step::Init { .. } => "init",
            Step::Resize { .. } => "resize",
            Step::Start => "start",
            Step::Stop => "stop",
            Step::Pause => "pause",
            Step::Resume => "resume",
            Step::Expand => "expand",
            Step::Collapse => "collapse",
            Step::Skip => "skip",
            Step::SetVolume { .. } => "set_volume",
            Step::SetSkippable { .. } => "set_skippable",
            Step::SetInput { .. } => "set_input",
            Step::Trigger { .. } => "trigger",
            Step::Press { .. } => "press",
            Step::ExpectOutcome { .. } => "expect_outcome",
            Step::ExpectAttr { .. } => "expect_attr",
            Step::ExpectFired { .. } => "expect_fired",
            Step::ExpectVersion { .. } => "expect_version",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<Step>,
}

/// Result of one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub op: &'static str,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub passed: bool,
    pub steps: Vec<StepRecord>,
}

impl ScenarioReport {
    pub fn failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(|s| !s.passed)
    }
}

/// What the last action step produced.
#[derive(Debug, Default)]
struct LastCall {
    code: Option<&'static str>,
    version: Option<String>,
}

impl LastCall {
    fn record(&mut self, result: &ProtocolResult) -> (bool, String) {
        self.code = Some(result_code(result));
        let detail = match result {
            Ok(outcome) => outcome.code().to_string(),
            Err(e) => e.to_string(),
        };
        (true, detail)
    }
}

/// JSON equality, treating all numbers as f64 (640 == 640.0). Attribute
/// values serialize untagged, so expectations read like protocol values.
fn json_matches(actual: &serde_json::Value, expected: &serde_json::Value) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

fn check(passed: bool, expected: impl std::fmt::Display, got: impl std::fmt::Display) -> (bool, String) {
    (passed, format!("expected {}, got {}", expected, got))
}

impl Scenario {
    /// Read a scenario from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse scenario: {}", path.display()))
    }

    /// Built-in compliance run: the guard, atomicity, skip, volume and
    /// handshake properties every probe build must satisfy.
    pub fn compliance() -> Self {
        use Step::*;
        let attr = |name: &str, value: serde_json::Value| ExpectAttr { name: name.to_string(), value };
        let outcome = |code: &str| ExpectOutcome { outcome: code.to_string() };
        let fired = |event: AdEvent, count: usize| ExpectFired { event, count };

        let steps = vec![
            // Calls before init are rejected
            Start,
            outcome("invalid_state"),
            Handshake { version: "1.0".into() },
            ExpectVersion { version: "2.0".into() },
            // Init stores attributes and raises AdLoaded once
            Subscribe { events: vec![AdEvent::Loaded, AdEvent::Skipped] },
            Init {
                width: 640,
                height: 480,
                view_mode: ViewMode::Normal,
                desired_bitrate: 500,
                creative_data: String::new(),
                environment: EnvironmentVars::new("slot", "videoSlot"),
            },
            outcome("fired"),
            fired(AdEvent::Loaded, 1),
            attr("width", 640.into()),
            attr("height", 480.into()),
            attr("viewMode", "normal".into()),
            attr("desiredBitrate", 500.into()),
            // Second init is rejected
            Init {
                width: 1,
                height: 1,
                view_mode: ViewMode::Thumbnail,
                desired_bitrate: 1,
                creative_data: String::new(),
                environment: EnvironmentVars::default(),
            },
            outcome("invalid_state"),
            attr("width", 640.into()),
            // Resize without AdSizeChange leaves everything untouched
            Resize { width: 800, height: 600, view_mode: ViewMode::Fullscreen },
            outcome("missing_subscriber"),
            attr("width", 640.into()),
            attr("height", 480.into()),
            attr("viewMode", "normal".into()),
            // Guarded lifecycle without subscribers
            Start,
            outcome("missing_subscriber"),
            Expand,
            outcome("missing_subscriber"),
            attr("expanded", false.into()),
            // Skip is inert until skippable
            Skip,
            outcome("inert"),
            fired(AdEvent::Skipped, 0),
            SetSkippable { value: true },
            Skip,
            outcome("fired"),
            fired(AdEvent::Skipped, 1),
            // Volume always writes
            SetVolume { value: 0.0 },
            outcome("applied"),
            attr("volume", 0.into()),
            // Subscribe / unsubscribe round trip
            Subscribe { events: vec![AdEvent::SizeChange] },
            Resize { width: 800, height: 600, view_mode: ViewMode::Fullscreen },
            outcome("fired"),
            attr("width", 800.into()),
            Unsubscribe { events: vec![AdEvent::SizeChange] },
            Unsubscribe { events: vec![AdEvent::SizeChange] },
            Resize { width: 320, height: 240, view_mode: ViewMode::Normal },
            outcome("missing_subscriber"),
            attr("width", 800.into()),
            // Collapse needs no subscriber
            Collapse,
            outcome("applied"),
            // Unbound controls do nothing
            Press { control: "AdStarted".into() },
            outcome("inert"),
        ];

        Self { name: "compliance".to_string(), steps }
    }

    /// Run every step against `host`.
    pub fn run(&self, host: &mut HostPlayer) -> ScenarioReport {
        log::info!("Running scenario '{}' ({} steps)", self.name, self.steps.len());
        let mut last = LastCall::default();

        let steps: Vec<StepRecord> = self
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let (passed, detail) = Self::apply(step, host, &mut last);
                if passed {
                    log::debug!("#{} {}: {}", index, step.op(), detail);
                } else {
                    log::warn!("#{} {} FAILED: {}", index, step.op(), detail);
                }
                StepRecord { index, op: step.op(), passed, detail }
            })
            .collect();

        let passed = steps.iter().all(|s| s.passed);
        ScenarioReport { name: self.name.clone(), passed, steps }
    }

    fn apply(step: &Step, host: &mut HostPlayer, last: &mut LastCall) -> (bool, String) {
        match step {
            Step::Handshake { version } => {
                let answer = host.unit_mut().handshake_version(version);
                last.version = Some(answer.to_string());
                (true, answer.to_string())
            }
            Step::Subscribe { events } => {
                host.subscribe_all(events);
                (true, format!("{} event(s)", events.len()))
            }
            Step::Unsubscribe { events } => {
                for event in events {
                    host.unit_mut().unsubscribe(event.clone());
                }
                (true, format!("{} event(s)", events.len()))
            }
            Step::Init { width, height, view_mode, desired_bitrate, creative_data, environment } => {
                let r = host.unit_mut().init_ad(
                    *width,
                    *height,
                    *view_mode,
                    *desired_bitrate,
                    creative_data,
                    environment.clone(),
                );
                last.record(&r)
            }
            Step::Resize { width, height, view_mode } => {
                let r = host.unit_mut().resize_ad(*width, *height, *view_mode);
                last.record(&r)
            }
            Step::Start => last.record(&host.unit_mut().start_ad()),
            Step::Stop => last.record(&host.unit_mut().stop_ad()),
            Step::Pause => last.record(&host.unit_mut().pause_ad()),
            Step::Resume => last.record(&host.unit_mut().resume_ad()),
            Step::Expand => last.record(&host.unit_mut().expand_ad()),
            Step::Collapse => last.record(&host.unit_mut().collapse_ad()),
            Step::Skip => last.record(&host.unit_mut().skip_ad()),
            Step::SetVolume { value } => last.record(&Ok(host.unit_mut().set_ad_volume(*value))),
            Step::SetSkippable { value } => {
                host.unit_mut().set_skippable_state(*value);
                (true, value.to_string())
            }
            Step::SetInput { text } => {
                host.surface().set_input(text.as_str());
                (true, text.clone())
            }
            Step::Trigger { event } => last.record(&host.unit_mut().trigger_event(event.clone())),
            Step::Press { control } => last.record(&host.unit_mut().press_control(control)),
            Step::ExpectOutcome { outcome } => {
                let got = last.code.unwrap_or("nothing");
                check(got == outcome.as_str(), outcome, got)
            }
            Step::ExpectAttr { name, value } => match host.unit().attributes().get_by_name(name) {
                Some(attr) => {
                    let actual = serde_json::to_value(attr).unwrap_or(serde_json::Value::Null);
                    check(json_matches(&actual, value), format!("{} = {}", name, value), &actual)
                }
                None => (false, format!("unknown attribute {}", name)),
            },
            Step::ExpectFired { event, count } => {
                let got = host.journal().count(event);
                check(got == *count, format!("{} x{}", event, count), format!("x{}", got))
            }
            Step::ExpectVersion { version } => {
                let got = last.version.as_deref().unwrap_or("nothing");
                check(got == version.as_str(), version, got)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::NullBeacon;

    fn host() -> HostPlayer {
        HostPlayer::new(Box::new(NullBeacon))
    }

    #[test]
    fn test_compliance_scenario_passes() {
        let mut host = host();
        let report = Scenario::compliance().run(&mut host);
        let failures: Vec<_> = report.failures().collect();
        assert!(failures.is_empty(), "failed steps: {:?}", failures);
        assert!(report.passed);
    }

    #[test]
    fn test_bundled_scenario_file_passes() {
        let scenario: Scenario =
            serde_json::from_str(include_str!("../../scenarios/compliance.json")).unwrap();
        let report = scenario.run(&mut host());
        let failures: Vec<_> = report.failures().collect();
        assert!(failures.is_empty(), "failed steps: {:?}", failures);
    }

    #[test]
    fn test_failed_expectation_reported_not_aborted() {
        let scenario = Scenario {
            name: "wrong".into(),
            steps: vec![
                Step::Handshake { version: "2.0".into() },
                Step::ExpectVersion { version: "1.0".into() },
                Step::ExpectAttr { name: "volume".into(), value: 50.into() },
            ],
        };
        let report = scenario.run(&mut host());
        assert!(!report.passed);
        assert_eq!(report.steps.len(), 3);
        assert!(!report.steps[1].passed);
        assert_eq!(report.steps[1].detail, "expected 1.0, got 2.0");
        assert!(report.steps[2].passed);
    }

    #[test]
    fn test_parse_step_json() {
        let steps: Vec<Step> = serde_json::from_str(
            r#"[
                {"op": "handshake"},
                {"op": "init", "width": 640, "height": 480, "view_mode": "thumbnail",
                 "environment": {"slot": "div", "videoSlot": "video"}},
                {"op": "trigger", "event": "VendorPing"},
                {"op": "expect_fired", "event": "AdLoaded", "count": 1}
            ]"#,
        )
        .unwrap();

        assert_eq!(steps[0], Step::Handshake { version: "2.0".into() });
        assert_eq!(
            steps[1],
            Step::Init {
                width: 640,
                height: 480,
                view_mode: ViewMode::Thumbnail,
                desired_bitrate: 256,
                creative_data: String::new(),
                environment: EnvironmentVars::new("div", "video"),
            }
        );
        assert_eq!(steps[2], Step::Trigger { event: AdEvent::Custom("VendorPing".into()) });
        assert_eq!(steps[3].op(), "expect_fired");
    }

    #[test]
    fn test_click_thru_via_input_and_press() {
        let scenario = Scenario {
            name: "click".into(),
            steps: vec![
                Step::Handshake { version: "2.0".into() },
                Step::Subscribe { events: vec![AdEvent::Loaded, AdEvent::ClickThru] },
                Step::Init {
                    width: 300,
                    height: 250,
                    view_mode: ViewMode::Normal,
                    desired_bitrate: 256,
                    creative_data: String::new(),
                    environment: EnvironmentVars::default(),
                },
                Step::SetInput { text: "http://example.com".into() },
                Step::Press { control: "AdClickThru".into() },
                Step::ExpectOutcome { outcome: "fired".into() },
                Step::ExpectFired { event: AdEvent::ClickThru, count: 1 },
            ],
        };
        let mut host = host();
        assert!(scenario.run(&mut host).passed);
        assert_eq!(host.journal().len(), 2);
    }

    #[test]
    fn test_init_without_bitrate_uses_protocol_default() {
        let scenario: Scenario = serde_json::from_str(
            r#"{ "name": "bitrate", "steps": [
                {"op": "handshake"},
                {"op": "subscribe", "events": ["AdLoaded"]},
                {"op": "init", "width": 640, "height": 480},
                {"op": "expect_outcome", "outcome": "fired"},
                {"op": "expect_attr", "name": "desiredBitrate", "value": 256}
            ] }"#,
        )
        .unwrap();
        let mut host = host();
        let report = scenario.run(&mut host);
        assert!(report.passed, "{:?}", report.failures().collect::<Vec<_>>());
        assert_eq!(host.unit().attributes().desired_bitrate(), 256);
    }
}
