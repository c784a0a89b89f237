//! Terminal implementations of the session collaborators.

use std::io::Write;

use breathpacer_core::{ControlState, CueEmitter, CueError, Event, PacerMode, Renderer, TelemetrySink};

const NEUTRAL_SCALE: f64 = 0.8;

/// Redraws a single status line on every change.
pub struct TerminalRenderer {
    title: String,
    countdown: String,
    ring: f64,
    label: String,
    dots: u32,
    filled: u32,
    pacer: PacerMode,
    scale: f64,
}

impl TerminalRenderer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            countdown: String::new(),
            ring: 0.0,
            label: String::new(),
            dots: 0,
            filled: 0,
            pacer: PacerMode::Neutral,
            scale: NEUTRAL_SCALE,
        }
    }

    /// Circle sized by the scale the pacer is heading to. Holds keep the
    /// previous size and add a bar.
    fn pacer_glyph(&self) -> &'static str {
        let hold = self.pacer == PacerMode::Hold;
        match (self.scale, hold) {
            (s, false) if s >= 0.95 => "( O )",
            (s, true) if s >= 0.95 => "(-O-)",
            (s, false) if s <= 0.65 => " (o) ",
            (s, true) if s <= 0.65 => " -o- ",
            (_, false) => "  o  ",
            (_, true) => " -o- ",
        }
    }

    fn line(&self) -> String {
        let dots: String = (0..self.dots)
            .map(|i| if i < self.filled { '●' } else { '○' })
            .collect();
        format!(
            "{} {:>5} {:>3.0}% {} {:<22} {}",
            self.title,
            self.countdown,
            self.ring * 100.0,
            self.pacer_glyph(),
            self.label,
            dots
        )
    }

    fn redraw(&self) {
        let mut out = std::io::stdout().lock();
        // Clear to end of line so shorter redraws leave no residue.
        let _ = write!(out, "\r{}\x1b[K", self.line());
        let _ = out.flush();
    }
}

impl Renderer for TerminalRenderer {
    fn set_countdown_text(&mut self, text: &str) {
        self.countdown = text.to_string();
        self.redraw();
    }

    fn set_progress_ring_fraction(&mut self, fraction: f64) {
        self.ring = fraction.clamp(0.0, 1.0);
        self.redraw();
    }

    fn set_pacer_animation(&mut self, mode: PacerMode, _duration_ms: u64) {
        self.pacer = mode;
        if let Some(scale) = mode.target_scale() {
            self.scale = scale;
        }
        self.redraw();
    }

    fn set_phase_label(&mut self, text: &str) {
        self.label = text.to_string();
        self.redraw();
    }

    fn set_dot_count(&mut self, count: u32) {
        self.dots = count;
        self.filled = 0;
        self.redraw();
    }

    fn fill_dot(&mut self, index: u32) {
        self.filled = self.filled.max(index + 1);
        self.redraw();
    }

    fn set_start_control_state(&mut self, state: ControlState, label: &str) {
        if state == ControlState::Enabled {
            println!();
            println!("[{label}]");
        }
    }
}

/// Rings the terminal bell for tones; terminals cannot vibrate.
#[derive(Debug, Default)]
pub struct BellCues;

impl CueEmitter for BellCues {
    fn emit_tone_cue(&mut self, _frequency_hz: f64, _duration_secs: f64) -> Result<(), CueError> {
        let mut out = std::io::stdout().lock();
        out.write_all(b"\x07")
            .and_then(|_| out.flush())
            .map_err(|e| CueError::Failed(e.to_string()))
    }

    fn emit_haptic_cue(&mut self, _pattern_ms: &[u64]) -> Result<(), CueError> {
        Err(CueError::Unavailable("haptic"))
    }
}

/// Writes each event as one JSON line on stderr.
#[derive(Debug, Default)]
pub struct JsonLinesTelemetry;

impl TelemetrySink for JsonLinesTelemetry {
    fn send(&self, event: &Event) {
        match serde_json::to_string(event) {
            Ok(line) => eprintln!("{line}"),
            Err(e) => tracing::debug!(error = %e, "dropping telemetry event"),
        }
    }
}
