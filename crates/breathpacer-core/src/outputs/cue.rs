use tracing::debug;

use super::CueEmitter;
use crate::settings::CueSettings;
use crate::timer::Phase;

const INHALE_HZ: f64 = 440.0;
const EXHALE_HZ: f64 = 220.0;
/// Share of the phase the tone rings for.
const TONE_SPAN: f64 = 0.9;
const MIN_TONE_SECS: f64 = 0.2;

/// Tone parameters for a phase start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneCue {
    pub frequency_hz: f64,
    pub duration_secs: f64,
}

impl ToneCue {
    /// Only inhale and exhale get a tone.
    pub fn for_phase(phase: Phase, seconds: u32) -> Option<Self> {
        let frequency_hz = match phase {
            Phase::Inhale => INHALE_HZ,
            Phase::Exhale => EXHALE_HZ,
            Phase::Hold | Phase::Settle => return None,
        };
        Some(Self {
            frequency_hz,
            duration_secs: (seconds as f64 * TONE_SPAN).max(MIN_TONE_SECS),
        })
    }
}

/// Vibration pattern (on/off/on... milliseconds) for a phase start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HapticPattern(pub Vec<u64>);

impl HapticPattern {
    pub fn for_phase(phase: Phase) -> Option<Self> {
        match phase {
            Phase::Inhale => Some(Self(vec![80])),
            Phase::Exhale => Some(Self(vec![40, 60, 40])),
            Phase::Hold | Phase::Settle => None,
        }
    }
}

/// Gates a cue emitter behind the user's toggles and swallows its failures.
pub struct CueDispatcher {
    emitter: Box<dyn CueEmitter>,
    settings: CueSettings,
}

impl CueDispatcher {
    pub fn new(emitter: Box<dyn CueEmitter>) -> Self {
        Self {
            emitter,
            settings: CueSettings::default(),
        }
    }

    pub fn settings(&self) -> CueSettings {
        self.settings
    }

    /// Settings are fixed for the length of a session; replace them at start.
    pub fn apply(&mut self, settings: CueSettings) {
        self.settings = settings;
    }

    /// Fire the phase-start cues, if any.
    pub fn phase_started(&mut self, phase: Phase, seconds: u32) {
        if self.settings.sound {
            if let Some(tone) = ToneCue::for_phase(phase, seconds) {
                if let Err(e) = self.emitter.emit_tone_cue(tone.frequency_hz, tone.duration_secs) {
                    debug!(?phase, error = %e, "tone cue skipped");
                }
            }
        }
        if self.settings.vibration {
            if let Some(HapticPattern(pattern)) = HapticPattern::for_phase(phase) {
                if let Err(e) = self.emitter.emit_haptic_cue(&pattern) {
                    debug!(?phase, error = %e, "haptic cue skipped");
                }
            }
        }
    }
}

impl std::fmt::Debug for CueDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CueDispatcher")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::recording::{Call, Recorder};
    use crate::outputs::NoCues;

    #[test]
    fn tone_frequencies_follow_direction() {
        assert_eq!(ToneCue::for_phase(Phase::Inhale, 4).unwrap().frequency_hz, 440.0);
        assert_eq!(ToneCue::for_phase(Phase::Exhale, 6).unwrap().frequency_hz, 220.0);
        assert!(ToneCue::for_phase(Phase::Hold, 4).is_none());
        assert!(ToneCue::for_phase(Phase::Settle, 30).is_none());
    }

    #[test]
    fn tone_duration_scales_with_phase() {
        let tone = ToneCue::for_phase(Phase::Exhale, 10).unwrap();
        assert!((tone.duration_secs - 9.0).abs() < 1e-9);
    }

    #[test]
    fn toggles_gate_each_output() {
        let rec = Recorder::default();
        let mut cues = CueDispatcher::new(Box::new(rec.clone()));
        cues.apply(CueSettings { sound: false, vibration: true });
        cues.phase_started(Phase::Inhale, 4);
        assert_eq!(rec.calls(), vec![Call::Haptic(vec![80])]);

        rec.clear();
        cues.apply(CueSettings { sound: true, vibration: false });
        cues.phase_started(Phase::Exhale, 6);
        assert!(matches!(rec.calls().as_slice(), [Call::Tone(hz, _)] if *hz == 220.0));
    }

    #[test]
    fn hold_fires_nothing() {
        let rec = Recorder::default();
        let mut cues = CueDispatcher::new(Box::new(rec.clone()));
        cues.phase_started(Phase::Hold, 4);
        assert!(rec.calls().is_empty());
    }

    #[test]
    fn unavailable_outputs_are_silent() {
        let mut cues = CueDispatcher::new(Box::new(NoCues));
        cues.phase_started(Phase::Inhale, 4);
        cues.phase_started(Phase::Exhale, 6);
    }
}
