//! Collaborator contracts driven by the session engine.
//!
//! The engine never reads anything back from these. Renderers draw, cue
//! emitters make noise or buzz, telemetry sinks ship events somewhere. Each
//! has a no-op implementation so a front end can plug in only what it has.

mod cue;

pub use cue::{CueDispatcher, HapticPattern, ToneCue};

use serde::{Deserialize, Serialize};

use crate::error::CueError;
use crate::events::Event;
use crate::timer::PacerMode;

/// Enabled state of the start control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlState {
    Enabled,
    Disabled,
}

/// Visual output of the widget.
pub trait Renderer: Send {
    /// Countdown text, already formatted as `M:SS`.
    fn set_countdown_text(&mut self, text: &str);

    /// Elapsed share of the session, 0.0 ..= 1.0.
    fn set_progress_ring_fraction(&mut self, fraction: f64);

    fn set_pacer_animation(&mut self, mode: PacerMode, duration_ms: u64);

    /// Empty text clears the label.
    fn set_phase_label(&mut self, text: &str);

    fn set_dot_count(&mut self, count: u32);

    /// Zero-based dot index.
    fn fill_dot(&mut self, index: u32);

    fn set_start_control_state(&mut self, state: ControlState, label: &str);
}

/// Audio and haptic output.
///
/// Errors are reported so emitters can say why, but the engine treats any
/// error as a cue that simply did not fire.
pub trait CueEmitter: Send {
    fn emit_tone_cue(&mut self, frequency_hz: f64, duration_secs: f64) -> Result<(), CueError>;

    fn emit_haptic_cue(&mut self, pattern_ms: &[u64]) -> Result<(), CueError>;
}

/// Fire-and-forget analytics.
pub trait TelemetrySink: Send + Sync {
    fn send(&self, event: &Event);
}

/// Renderer for headless sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn set_countdown_text(&mut self, _text: &str) {}
    fn set_progress_ring_fraction(&mut self, _fraction: f64) {}
    fn set_pacer_animation(&mut self, _mode: PacerMode, _duration_ms: u64) {}
    fn set_phase_label(&mut self, _text: &str) {}
    fn set_dot_count(&mut self, _count: u32) {}
    fn fill_dot(&mut self, _index: u32) {}
    fn set_start_control_state(&mut self, _state: ControlState, _label: &str) {}
}

/// Emitter for devices with neither speaker nor vibration motor.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCues;

impl CueEmitter for NoCues {
    fn emit_tone_cue(&mut self, _frequency_hz: f64, _duration_secs: f64) -> Result<(), CueError> {
        Err(CueError::Unavailable("audio"))
    }

    fn emit_haptic_cue(&mut self, _pattern_ms: &[u64]) -> Result<(), CueError> {
        Err(CueError::Unavailable("haptic"))
    }
}
