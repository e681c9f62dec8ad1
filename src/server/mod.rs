//! HTTP control panel for one ad unit.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────┐       mpsc::channel         ┌──────────────────────┐
//! │   Panel Server Thread   │  ──── PanelCommand ──────▶  │   Owner Thread       │
//! │   (rouille HTTP)        │                             │   (HostPlayer)       │
//! │                         │                             │                      │
//! │  POST /api/control/X    │  ──▶ Press("X") ─────────▶  │  unit.press_control  │
//! │  POST /api/volume/30    │  ──▶ SetVolume(30) ──────▶  │  unit.set_ad_volume  │
//! └─────────────────────────┘                             └──────────────────────┘
//!          │                                                      │
//!          │  Arc<SharedPanelState>                               │
//!          │◀──────────── read snapshots ─────────────────────────│
//!          │                                       after every command
//! ```
//!
//! The ad unit is single-threaded; HTTP handlers only ever see snapshots.
//!
//! # Endpoints
//!
//! | Method | Path                    | Description                     |
//! |--------|-------------------------|---------------------------------|
//! | GET    | `/`                     | HTML control panel              |
//! | GET    | `/api/health`           | Health check                    |
//! | GET    | `/api/status`           | Unit id, state, controls, last call |
//! | GET    | `/api/attributes`       | Attribute snapshot              |
//! | GET    | `/api/log`              | Activity log lines              |
//! | GET    | `/api/journal`          | Events the host received        |
//! | POST   | `/api/input`            | Set text input (`{"text": ..}`) |
//! | POST   | `/api/control/{name}`   | Press a control                 |
//! | POST   | `/api/volume/{n}`       | Host-side setAdVolume           |
//! | POST   | `/api/skippable/{0,1}`  | Toggle skippableState           |

mod api;

pub use api::{CallSnapshot, ControlSnapshot, PanelCommand, PanelServer, SharedPanelState, StatusSnapshot};
