use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::Toggle;

/// Telemetry events emitted by the session engine and the settings store.
///
/// Sinks receive these fire-and-forget; nothing in the engine waits on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStart {
        total_seconds: u32,
        at: DateTime<Utc>,
    },
    SessionComplete {
        total_seconds: u32,
        at: DateTime<Utc>,
    },
    /// Session left in the background while still running. The countdown
    /// keeps going; this only records the drop-off point.
    SessionAbandon {
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    ToggleChanged {
        toggle: Toggle,
        enabled: bool,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Event::SessionStart { .. } => "session_start",
            Event::SessionComplete { .. } => "session_complete",
            Event::SessionAbandon { .. } => "session_abandon",
            Event::ToggleChanged { .. } => "toggle_changed",
        }
    }
}
