//! User toggles for audio and haptic cues.
//!
//! The store lives outside the session engine. A session takes a copy of
//! [`CueSettings`] when it starts and never looks at the store again, so
//! flipping a toggle mid-session affects the next session only.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::events::Event;
use crate::outputs::TelemetrySink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    Sound,
    Vibration,
}

impl std::str::FromStr for Toggle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sound" | "audio" => Ok(Toggle::Sound),
            "vibration" | "haptic" | "haptics" => Ok(Toggle::Vibration),
            other => Err(format!("unknown toggle: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueSettings {
    #[serde(default = "default_true")]
    pub sound: bool,
    #[serde(default = "default_true")]
    pub vibration: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CueSettings {
    fn default() -> Self {
        Self {
            sound: true,
            vibration: true,
        }
    }
}

impl CueSettings {
    pub fn get(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::Sound => self.sound,
            Toggle::Vibration => self.vibration,
        }
    }
}

/// Holds the current toggles and reports changes to telemetry.
#[derive(Clone, Default)]
pub struct SettingsStore {
    settings: CueSettings,
    telemetry: Option<Arc<dyn TelemetrySink>>,
}

impl SettingsStore {
    pub fn new(settings: CueSettings) -> Self {
        Self {
            settings,
            telemetry: None,
        }
    }

    pub fn with_telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    /// Copy handed to a session at start.
    pub fn snapshot(&self) -> CueSettings {
        self.settings
    }

    /// Set a toggle. Returns `true` and emits `toggle_changed` only when the
    /// value actually changed.
    pub fn set(&mut self, toggle: Toggle, enabled: bool) -> bool {
        if self.settings.get(toggle) == enabled {
            return false;
        }
        match toggle {
            Toggle::Sound => self.settings.sound = enabled,
            Toggle::Vibration => self.settings.vibration = enabled,
        }
        info!(?toggle, enabled, "cue toggle changed");
        if let Some(sink) = &self.telemetry {
            sink.send(&Event::ToggleChanged {
                toggle,
                enabled,
                at: Utc::now(),
            });
        }
        true
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("settings", &self.settings)
            .field("telemetry", &self.telemetry.is_some())
            .finish()
    }
}
