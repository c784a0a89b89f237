//! Single-phase runner.
//!
//! A phase is started with [`PhaseScheduler::begin`] and then advanced one
//! second at a time with [`PhaseScheduler::tick`]. The scheduler never looks
//! at the session itself. When the session ends the owner calls
//! [`PhaseScheduler::cancel`], and no further boundary is reached.

use serde::{Deserialize, Serialize};

use super::schedule::PlannedPhase;
use crate::outputs::{CueDispatcher, Renderer};

/// Transition length for hold phases, which are visually static.
pub const HOLD_TRANSITION_MS: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Inhale,
    Hold,
    Exhale,
    /// Unpaced stage after a paced loop.
    Settle,
}

impl Phase {
    /// Text shown while the phase runs.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Inhale => "Breathe in",
            Phase::Hold => "Hold",
            Phase::Exhale => "Breathe out",
            Phase::Settle => "Relax, breathe freely",
        }
    }

    pub fn pacer_mode(self) -> PacerMode {
        match self {
            Phase::Inhale => PacerMode::Expand,
            Phase::Hold => PacerMode::Hold,
            Phase::Exhale => PacerMode::Contract,
            Phase::Settle => PacerMode::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacerMode {
    Expand,
    Contract,
    Hold,
    Neutral,
}

impl PacerMode {
    /// Scale the pacer animates towards. `None` keeps the current scale.
    pub fn target_scale(self) -> Option<f64> {
        match self {
            PacerMode::Expand => Some(1.0),
            PacerMode::Contract => Some(0.6),
            PacerMode::Neutral => Some(0.8),
            PacerMode::Hold => None,
        }
    }

    pub fn transition_ms(self, seconds: u32) -> u64 {
        match self {
            PacerMode::Hold => HOLD_TRANSITION_MS,
            _ => u64::from(seconds) * 1000,
        }
    }
}

/// Result of asking the scheduler to start a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStart {
    /// Zero-length phase: nothing rendered, nothing emitted.
    Skipped,
    Started,
}

/// Outcome of one second of an active phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTick {
    Progress { elapsed: u32 },
    Completed(PlannedPhase),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePhase {
    pub planned: PlannedPhase,
    pub elapsed: u32,
}

#[derive(Debug, Default)]
pub struct PhaseScheduler {
    active: Option<ActivePhase>,
}

impl PhaseScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActivePhase> {
        self.active.as_ref()
    }

    /// Start a phase, replacing any phase still in flight.
    pub fn begin(
        &mut self,
        planned: PlannedPhase,
        renderer: &mut dyn Renderer,
        cues: &mut CueDispatcher,
    ) -> PhaseStart {
        self.active = None;
        if planned.seconds == 0 {
            return PhaseStart::Skipped;
        }

        let mode = planned.phase.pacer_mode();
        renderer.set_phase_label(planned.phase.label());
        renderer.set_dot_count(planned.seconds);
        renderer.set_pacer_animation(mode, mode.transition_ms(planned.seconds));
        cues.phase_started(planned.phase, planned.seconds);

        self.active = Some(ActivePhase {
            planned,
            elapsed: 0,
        });
        PhaseStart::Started
    }

    /// Advance the active phase by one second.
    ///
    /// Returns `None` when no phase is active.
    pub fn tick(&mut self, renderer: &mut dyn Renderer) -> Option<PhaseTick> {
        let active = self.active.as_mut()?;
        active.elapsed += 1;
        renderer.fill_dot(active.elapsed - 1);

        if active.elapsed >= active.planned.seconds {
            let planned = active.planned;
            self.active = None;
            Some(PhaseTick::Completed(planned))
        } else {
            Some(PhaseTick::Progress {
                elapsed: active.elapsed,
            })
        }
    }

    /// Drop the active phase without completing it. Already filled dots stay
    /// filled. Idempotent.
    pub fn cancel(&mut self) -> Option<ActivePhase> {
        self.active.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::recording::{Call, Recorder};

    fn planned(phase: Phase, seconds: u32) -> PlannedPhase {
        PlannedPhase { phase, seconds }
    }

    #[test]
    fn zero_length_phase_is_skipped_silently() {
        let rec = Recorder::default();
        let mut renderer = rec.clone();
        let mut cues = CueDispatcher::new(Box::new(rec.clone()));
        let mut sched = PhaseScheduler::new();

        let start = sched.begin(planned(Phase::Hold, 0), &mut renderer, &mut cues);
        assert_eq!(start, PhaseStart::Skipped);
        assert!(sched.active().is_none());
        assert!(rec.calls().is_empty());
        assert!(sched.tick(&mut renderer).is_none());
    }

    #[test]
    fn inhale_renders_then_cues() {
        let rec = Recorder::default();
        let mut renderer = rec.clone();
        let mut cues = CueDispatcher::new(Box::new(rec.clone()));
        let mut sched = PhaseScheduler::new();

        sched.begin(planned(Phase::Inhale, 4), &mut renderer, &mut cues);
        let calls = rec.calls();
        assert_eq!(calls[0], Call::Label("Breathe in".into()));
        assert_eq!(calls[1], Call::Dots(4));
        assert_eq!(calls[2], Call::Pacer(PacerMode::Expand, 4000));
        assert!(matches!(calls[3], Call::Tone(hz, _) if hz == 440.0));
        assert_eq!(calls[4], Call::Haptic(vec![80]));
    }

    #[test]
    fn completes_after_last_second() {
        let rec = Recorder::default();
        let mut renderer = rec.clone();
        let mut cues = CueDispatcher::new(Box::new(rec.clone()));
        let mut sched = PhaseScheduler::new();
        sched.begin(planned(Phase::Exhale, 3), &mut renderer, &mut cues);
        rec.clear();

        assert_eq!(sched.tick(&mut renderer), Some(PhaseTick::Progress { elapsed: 1 }));
        assert_eq!(sched.tick(&mut renderer), Some(PhaseTick::Progress { elapsed: 2 }));
        assert_eq!(
            sched.tick(&mut renderer),
            Some(PhaseTick::Completed(planned(Phase::Exhale, 3)))
        );
        assert_eq!(rec.calls(), vec![Call::Fill(0), Call::Fill(1), Call::Fill(2)]);
        assert!(sched.tick(&mut renderer).is_none());
    }

    #[test]
    fn cancel_ends_phase_without_rollback() {
        let rec = Recorder::default();
        let mut renderer = rec.clone();
        let mut cues = CueDispatcher::new(Box::new(rec.clone()));
        let mut sched = PhaseScheduler::new();
        sched.begin(planned(Phase::Inhale, 4), &mut renderer, &mut cues);
        sched.tick(&mut renderer);
        rec.clear();

        let cancelled = sched.cancel().unwrap();
        assert_eq!(cancelled.planned, planned(Phase::Inhale, 4));
        assert_eq!(cancelled.elapsed, 1);
        assert!(rec.calls().is_empty());
        assert!(sched.tick(&mut renderer).is_none());
        assert!(sched.cancel().is_none());
    }

    #[test]
    fn hold_uses_short_transition() {
        assert_eq!(PacerMode::Hold.transition_ms(7), HOLD_TRANSITION_MS);
        assert_eq!(PacerMode::Neutral.transition_ms(30), 30_000);
        assert_eq!(Phase::Settle.pacer_mode(), PacerMode::Neutral);
        assert!(PacerMode::Hold.target_scale().is_none());
    }
}
