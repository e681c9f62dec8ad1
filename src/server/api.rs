//! Control panel HTTP API using rouille.
//!
//! # Key types
//!
//! - [`PanelServer`] - HTTP server runner, spawns background thread
//! - [`PanelCommand`] - commands sent to the thread owning the ad unit
//! - [`SharedPanelState`] - snapshots (status, attributes, log, journal) updated by that thread
//!
//! # Thread safety
//!
//! - `SharedPanelState` uses `RwLock` for each field - owner thread writes, HTTP handlers read
//! - `PanelCommand` sent via `mpsc::Sender` - handlers never touch the unit
//! - CORS headers added to all responses for browser access

use crate::collaborators::{SlotHandle, SurfaceRenderer};
use crate::core::{result_code, AdState, ProtocolResult};
use crate::entities::{AdEvent, AttributeSet};
use crate::host::{HostPlayer, ReceivedEvent};
use rouille::{Request, Response};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock, mpsc};
use std::thread;
use uuid::Uuid;

/// Commands sent from HTTP handlers to the owner thread
#[derive(Debug, Clone, PartialEq)]
pub enum PanelCommand {
    /// Replace the text input contents
    SetInput(String),
    /// Press a test control by event name
    Press(String),
    /// Host-side setAdVolume
    SetVolume(f64),
    /// Test control for skippableState
    SetSkippable(bool),
}

impl PanelCommand {
    /// Apply to the host's unit and describe what happened.
    pub fn apply(self, host: &mut HostPlayer) -> CallSnapshot {
        let (command, result): (String, Option<ProtocolResult>) = match self {
            PanelCommand::SetInput(text) => {
                host.surface().set_input(text.as_str());
                ("setInput".to_string(), None)
            }
            PanelCommand::Press(name) => {
                let r = host.unit_mut().press_control(&name);
                (format!("press {}", name), Some(r))
            }
            PanelCommand::SetVolume(value) => {
                let outcome = host.unit_mut().set_ad_volume(value);
                (format!("setAdVolume {}", value), Some(Ok(outcome)))
            }
            PanelCommand::SetSkippable(value) => {
                host.unit_mut().set_skippable_state(value);
                (format!("skippableState {}", value), None)
            }
        };

        match result {
            Some(r) => CallSnapshot {
                command,
                code: result_code(&r).to_string(),
                detail: match &r {
                    Ok(o) => o.code().to_string(),
                    Err(e) => e.to_string(),
                },
            },
            None => CallSnapshot { command, code: "applied".to_string(), detail: String::new() },
        }
    }
}

/// Outcome of the last panel command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSnapshot {
    pub command: String,
    pub code: String,
    pub detail: String,
}

/// One test control as shown on the panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSnapshot {
    pub name: AdEvent,
    pub bound: bool,
}

/// Unit status for `/api/status`
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub unit_id: Uuid,
    pub state: AdState,
    pub slot: Option<SlotHandle>,
    pub input: String,
    pub controls: Vec<ControlSnapshot>,
    pub last_call: Option<CallSnapshot>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            unit_id: Uuid::nil(),
            state: AdState::Loaded,
            slot: None,
            input: String::new(),
            controls: Vec::new(),
            last_call: None,
        }
    }
}

/// Shared state readable by HTTP handlers (updated by the owner thread)
pub struct SharedPanelState {
    pub status: RwLock<StatusSnapshot>,
    pub attributes: RwLock<AttributeSet>,
    pub log: RwLock<Vec<String>>,
    pub journal: RwLock<Vec<ReceivedEvent>>,
}

impl Default for SharedPanelState {
    fn default() -> Self {
        Self {
            status: RwLock::new(StatusSnapshot::default()),
            attributes: RwLock::new(AttributeSet::new()),
            log: RwLock::new(Vec::new()),
            journal: RwLock::new(Vec::new()),
        }
    }
}

impl SharedPanelState {
    /// Copy everything the panel shows out of `host`.
    pub fn publish(&self, host: &HostPlayer, last_call: Option<CallSnapshot>) {
        let unit = host.unit();
        let controls = AdEvent::CONTROLS
            .iter()
            .map(|e| ControlSnapshot { name: e.clone(), bound: unit.bound_controls().contains(e) })
            .collect();

        {
            let mut status = self.status.write().unwrap_or_else(|e| e.into_inner());
            status.unit_id = unit.id();
            status.state = unit.state();
            status.slot = unit.slot().cloned();
            status.input = host.surface().input_text();
            status.controls = controls;
            if last_call.is_some() {
                status.last_call = last_call;
            }
        }
        *self.attributes.write().unwrap_or_else(|e| e.into_inner()) = unit.attributes().clone();
        *self.log.write().unwrap_or_else(|e| e.into_inner()) = host.log().entries();
        *self.journal.write().unwrap_or_else(|e| e.into_inner()) = host.journal().events();
    }
}

/// Request body for the text input
#[derive(Debug, Deserialize)]
struct InputRequest {
    text: String,
}

/// Generic API response
#[derive(Serialize)]
struct ApiResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiResponse {
    fn ok() -> Self {
        Self { success: true, message: None, error: None }
    }

    fn ok_msg(msg: &str) -> Self {
        Self { success: true, message: Some(msg.to_string()), error: None }
    }

    fn err(msg: &str) -> Self {
        Self { success: false, message: None, error: Some(msg.to_string()) }
    }
}

const PANEL_HTML: &str = include_str!("panel.html");

/// Control panel HTTP server
pub struct PanelServer {
    port: u16,
    state: Arc<SharedPanelState>,
    command_tx: mpsc::Sender<PanelCommand>,
}

impl PanelServer {
    /// Start the server in a background thread.
    /// Returns the command receiver for the owner thread to drain.
    pub fn start(port: u16, state: Arc<SharedPanelState>) -> std::io::Result<mpsc::Receiver<PanelCommand>> {
        let (tx, rx) = mpsc::channel();

        let server = PanelServer { port, state, command_tx: tx };

        thread::Builder::new()
            .name("panel-server".to_string())
            .spawn(move || server.run())?;

        Ok(rx)
    }

    fn run(self) {
        let addr = format!("127.0.0.1:{}", self.port);
        log::info!("Control panel on http://{}", addr);

        let state = self.state;
        let tx = self.command_tx;

        rouille::start_server(&addr, move |request| Self::handle_request(request, &state, &tx));
    }

    fn handle_request(
        request: &Request,
        state: &Arc<SharedPanelState>,
        tx: &mpsc::Sender<PanelCommand>,
    ) -> Response {
        // Handle preflight
        if request.method() == "OPTIONS" {
            return Response::empty_204()
                .with_additional_header("Access-Control-Allow-Origin", "*")
                .with_additional_header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
                .with_additional_header("Access-Control-Allow-Headers", "Content-Type");
        }

        // Handle paths with parameters manually (router! doesn't capture well)
        let path = request.url();
        if request.method() == "POST" {
            // /api/control/{name}
            if let Some(name) = path.strip_prefix("/api/control/") {
                if name.is_empty() {
                    return Self::cors(Response::json(&ApiResponse::err("Missing control name")).with_status_code(400));
                }
                return Self::cors(Self::send_command(tx, PanelCommand::Press(name.to_string())));
            }
            // /api/volume/{n}
            if let Some(value) = path.strip_prefix("/api/volume/") {
                return Self::cors(match value.parse::<f64>() {
                    Ok(v) => Self::send_command(tx, PanelCommand::SetVolume(v)),
                    Err(_) => Response::json(&ApiResponse::err("Invalid volume")).with_status_code(400),
                });
            }
            // /api/skippable/{0,1}
            if let Some(flag) = path.strip_prefix("/api/skippable/") {
                return Self::cors(match flag {
                    "0" | "false" => Self::send_command(tx, PanelCommand::SetSkippable(false)),
                    "1" | "true" => Self::send_command(tx, PanelCommand::SetSkippable(true)),
                    _ => Response::json(&ApiResponse::err("Expected 0 or 1")).with_status_code(400),
                });
            }
        }

        let response = rouille::router!(request,
            (GET) ["/"] => {
                Response::html(PANEL_HTML)
            },
            (GET) ["/api/status"] => {
                Response::json(&*state.status.read().unwrap_or_else(|e| e.into_inner()))
            },
            (GET) ["/api/attributes"] => {
                Response::json(&*state.attributes.read().unwrap_or_else(|e| e.into_inner()))
            },
            (GET) ["/api/log"] => {
                Response::json(&*state.log.read().unwrap_or_else(|e| e.into_inner()))
            },
            (GET) ["/api/journal"] => {
                Response::json(&*state.journal.read().unwrap_or_else(|e| e.into_inner()))
            },
            (POST) ["/api/input"] => {
                Self::handle_input(request, tx)
            },

            // Health check
            (GET) ["/api/health"] => {
                Response::json(&ApiResponse::ok_msg("vpaid-probe control panel"))
            },

            // Fallback
            _ => {
                Response::json(&ApiResponse::err("Not found")).with_status_code(404)
            }
        );

        Self::cors(response)
    }

    fn cors(response: Response) -> Response {
        response.with_additional_header("Access-Control-Allow-Origin", "*")
    }

    fn send_command(tx: &mpsc::Sender<PanelCommand>, cmd: PanelCommand) -> Response {
        match tx.send(cmd) {
            Ok(_) => Response::json(&ApiResponse::ok()),
            Err(e) => Response::json(&ApiResponse::err(&format!("Failed to send command: {}", e)))
                .with_status_code(500),
        }
    }

    fn handle_input(request: &Request, tx: &mpsc::Sender<PanelCommand>) -> Response {
        match rouille::input::json_input::<InputRequest>(request) {
            Ok(req) => Self::send_command(tx, PanelCommand::SetInput(req.text)),
            Err(e) => Response::json(&ApiResponse::err(&format!("Invalid JSON: {}", e)))
                .with_status_code(400),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{EnvironmentVars, NullBeacon};
    use crate::entities::ViewMode;
    use std::io::Read;

    fn body(response: Response) -> String {
        let (mut reader, _) = response.data.into_reader_and_size();
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        text
    }

    fn call(method: &str, url: &str, data: &str) -> (Response, mpsc::Receiver<PanelCommand>) {
        let (tx, rx) = mpsc::channel();
        let state = Arc::new(SharedPanelState::default());
        let headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        let request = Request::fake_http(method, url, headers, data.as_bytes().to_vec());
        (PanelServer::handle_request(&request, &state, &tx), rx)
    }

    fn ready_host() -> HostPlayer {
        let mut host = HostPlayer::new(Box::new(NullBeacon));
        host.subscribe_all(&AdEvent::KNOWN);
        host.unit_mut().handshake_version("2.0");
        host.unit_mut()
            .init_ad(640, 480, ViewMode::Normal, 500, "", EnvironmentVars::default())
            .unwrap();
        host
    }

    #[test]
    fn test_health() {
        let (response, _) = call("GET", "/api/health", "");
        assert_eq!(response.status_code, 200);
        assert!(body(response).contains("vpaid-probe control panel"));
    }

    #[test]
    fn test_control_path_sends_press() {
        let (response, rx) = call("POST", "/api/control/AdClickThru", "");
        assert_eq!(response.status_code, 200);
        assert_eq!(rx.try_recv().unwrap(), PanelCommand::Press("AdClickThru".into()));
    }

    #[test]
    fn test_volume_and_skippable_paths() {
        let (response, rx) = call("POST", "/api/volume/12.5", "");
        assert_eq!(response.status_code, 200);
        assert_eq!(rx.try_recv().unwrap(), PanelCommand::SetVolume(12.5));

        let (response, rx) = call("POST", "/api/volume/loud", "");
        assert_eq!(response.status_code, 400);
        assert!(rx.try_recv().is_err());

        let (_, rx) = call("POST", "/api/skippable/1", "");
        assert_eq!(rx.try_recv().unwrap(), PanelCommand::SetSkippable(true));
    }

    #[test]
    fn test_input_body() {
        let (response, rx) = call("POST", "/api/input", r#"{"text":"http://example.com"}"#);
        assert_eq!(response.status_code, 200);
        assert_eq!(rx.try_recv().unwrap(), PanelCommand::SetInput("http://example.com".into()));
    }

    #[test]
    fn test_unknown_route_is_404_with_cors() {
        let (response, _) = call("GET", "/api/nothing", "");
        assert_eq!(response.status_code, 404);
        assert!(response
            .headers
            .iter()
            .any(|(k, v)| k == "Access-Control-Allow-Origin" && v == "*"));
    }

    #[test]
    fn test_commands_apply_to_host() {
        let mut host = ready_host();

        PanelCommand::SetInput("http://example.com".into()).apply(&mut host);
        let call = PanelCommand::Press("AdClickThru".into()).apply(&mut host);
        assert_eq!(call.code, "fired");
        assert_eq!(host.journal().count(&AdEvent::ClickThru), 1);

        let call = PanelCommand::Press("AdLoaded".into()).apply(&mut host);
        assert_eq!(call.code, "inert");

        let call = PanelCommand::SetVolume(30.0).apply(&mut host);
        assert_eq!(call.code, "fired");
        assert_eq!(host.unit().attributes().volume(), 30.0);
    }

    #[test]
    fn test_publish_snapshots() {
        let host = ready_host();
        let state = SharedPanelState::default();
        state.publish(&host, None);

        let status = state.status.read().unwrap();
        assert_eq!(status.unit_id, host.unit().id());
        assert_eq!(status.state, AdState::Initialized);
        assert_eq!(status.controls.len(), AdEvent::CONTROLS.len());
        assert!(status.controls.iter().all(|c| c.bound));
        assert_eq!(state.journal.read().unwrap().len(), 1);
        assert_eq!(state.attributes.read().unwrap().width(), 640);
    }
}
