//! Session orchestrator.
//!
//! A pure state machine composing the session clock and the phase scheduler.
//! It owns no timers: the driver feeds it [`Input`]s and reads back which
//! timers it wants armed via [`SessionOrchestrator::timers`].
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Ending -> Idle
//!           |                   ^
//!           +------- stop ------+
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut orch = SessionOrchestrator::new(config, Box::new(renderer));
//! orch.start(settings);
//! // Once per second, clock first:
//! orch.clock_tick();
//! orch.phase_tick();
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::clock::{format_countdown, SessionClock};
use super::phase::{PacerMode, Phase, PhaseScheduler, PhaseStart, PhaseTick};
use super::schedule::{CyclePlan, SessionConfig};
use crate::events::Event;
use crate::outputs::{ControlState, CueDispatcher, CueEmitter, NoCues, Renderer, TelemetrySink};
use crate::settings::CueSettings;

/// Visual settle time between session end and the idle reset.
pub const COOL_DOWN: Duration = Duration::from_millis(900);

const START_LABEL: &str = "Start";
const RUNNING_LABEL: &str = "Breathing";
const DONE_LABEL: &str = "Done";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Idle,
    Running,
    /// Session finished; waiting out the cool-down before resetting.
    Ending,
}

/// Everything that can happen to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Start(CueSettings),
    ClockTick,
    PhaseTick,
    Stop,
    /// The widget went out of view.
    Hidden,
    CoolDownElapsed,
}

/// Timers the orchestrator currently needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerDemand {
    pub clock: bool,
    /// Generation of the active phase. A new value means a new phase timer.
    pub phase: Option<u64>,
    pub cool_down: bool,
}

/// Mutable per-session bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub running: bool,
    pub seconds_remaining: u32,
    pub current_phase: Option<Phase>,
    pub phase_elapsed: u32,
    pub paced_seconds_remaining: Option<u32>,
}

impl SessionState {
    fn idle(config: &SessionConfig) -> Self {
        Self {
            running: false,
            seconds_remaining: config.total_seconds,
            current_phase: None,
            phase_elapsed: 0,
            paced_seconds_remaining: None,
        }
    }

    fn fresh(config: &SessionConfig) -> Self {
        Self {
            running: true,
            seconds_remaining: config.total_seconds,
            current_phase: None,
            phase_elapsed: 0,
            paced_seconds_remaining: config.two_stage.map(|t| t.paced_seconds),
        }
    }
}

/// Serializable view of the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub lifecycle: Lifecycle,
    pub running: bool,
    pub seconds_remaining: u32,
    pub countdown: String,
    pub current_phase: Option<Phase>,
    pub phase_elapsed: u32,
    pub paced_seconds_remaining: Option<u32>,
    pub cycles_completed: u32,
    pub sessions_completed: u32,
}

pub struct SessionOrchestrator {
    config: SessionConfig,
    lifecycle: Lifecycle,
    state: SessionState,
    clock: SessionClock,
    phases: PhaseScheduler,
    plan: Option<CyclePlan>,
    cycles_completed: u32,
    sessions_completed: u32,
    phase_generation: u64,
    renderer: Box<dyn Renderer>,
    cues: CueDispatcher,
    telemetry: Option<Arc<dyn TelemetrySink>>,
}

impl SessionOrchestrator {
    /// Create an idle orchestrator and draw the idle widget.
    pub fn new(config: SessionConfig, renderer: Box<dyn Renderer>) -> Self {
        let mut orch = Self {
            state: SessionState::idle(&config),
            config,
            lifecycle: Lifecycle::Idle,
            clock: SessionClock::new(),
            phases: PhaseScheduler::new(),
            plan: None,
            cycles_completed: 0,
            sessions_completed: 0,
            phase_generation: 0,
            renderer,
            cues: CueDispatcher::new(Box::new(NoCues)),
            telemetry: None,
        };
        orch.render_idle();
        orch
    }

    pub fn with_cues(mut self, emitter: Box<dyn CueEmitter>) -> Self {
        self.cues = CueDispatcher::new(emitter);
        self
    }

    pub fn with_telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Session running with time left. Phases check this at every boundary.
    pub fn still_active(&self) -> bool {
        self.state.running && self.state.seconds_remaining > 0
    }

    pub fn timers(&self) -> TimerDemand {
        let running = self.lifecycle == Lifecycle::Running;
        TimerDemand {
            clock: running && self.clock.is_armed(),
            phase: match self.phases.active() {
                Some(_) if running => Some(self.phase_generation),
                _ => None,
            },
            cool_down: self.lifecycle == Lifecycle::Ending,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            lifecycle: self.lifecycle,
            running: self.state.running,
            seconds_remaining: self.state.seconds_remaining,
            countdown: format_countdown(self.state.seconds_remaining),
            current_phase: self.state.current_phase,
            phase_elapsed: self.state.phase_elapsed,
            paced_seconds_remaining: self.state.paced_seconds_remaining,
            cycles_completed: self.cycles_completed,
            sessions_completed: self.sessions_completed,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn handle(&mut self, input: Input) {
        match input {
            Input::Start(settings) => {
                self.start(settings);
            }
            Input::ClockTick => self.clock_tick(),
            Input::PhaseTick => self.phase_tick(),
            Input::Stop => {
                self.stop();
            }
            Input::Hidden => self.hidden(),
            Input::CoolDownElapsed => self.cool_down_elapsed(),
        }
    }

    /// Begin a session. Ignored unless idle; returns whether it started.
    pub fn start(&mut self, settings: CueSettings) -> bool {
        if self.lifecycle != Lifecycle::Idle {
            debug!(lifecycle = ?self.lifecycle, "start ignored");
            return false;
        }

        self.cues.apply(settings);
        self.state = SessionState::fresh(&self.config);
        self.cycles_completed = 0;
        self.clock.start(self.config.total_seconds);
        self.lifecycle = Lifecycle::Running;

        self.renderer
            .set_start_control_state(ControlState::Disabled, RUNNING_LABEL);
        self.render_clock();
        info!(
            total_seconds = self.config.total_seconds,
            two_stage = self.config.two_stage.is_some(),
            "session started"
        );
        self.emit(Event::SessionStart {
            total_seconds: self.config.total_seconds,
            at: Utc::now(),
        });

        self.plan = Some(CyclePlan::new(&self.config));
        self.advance_cycle();
        true
    }

    pub fn clock_tick(&mut self) {
        if self.lifecycle != Lifecycle::Running {
            return;
        }
        let Some(tick) = self.clock.tick() else {
            return;
        };
        self.state.seconds_remaining = tick.seconds_remaining;
        self.render_clock();
        if tick.expired {
            self.finish();
        }
    }

    pub fn phase_tick(&mut self) {
        if self.lifecycle != Lifecycle::Running {
            return;
        }
        match self.phases.tick(self.renderer.as_mut()) {
            None => {}
            Some(PhaseTick::Progress { elapsed }) => self.state.phase_elapsed = elapsed,
            Some(PhaseTick::Completed(planned)) => {
                self.state.phase_elapsed = planned.seconds;
                if let Some(plan) = self.plan.as_mut() {
                    plan.complete(planned);
                    self.state.paced_seconds_remaining = plan.paced_remaining();
                    self.cycles_completed = plan.cycles_completed();
                }
                self.advance_cycle();
            }
        }
    }

    /// Explicit stop: halt both timers and reset at once. Returns whether
    /// there was anything to stop.
    pub fn stop(&mut self) -> bool {
        if self.lifecycle == Lifecycle::Idle {
            return false;
        }
        info!(seconds_remaining = self.state.seconds_remaining, "session stopped");
        self.halt();
        self.reset_to_idle();
        true
    }

    /// Record drop-off. Never pauses or stops the session.
    pub fn hidden(&mut self) {
        if self.lifecycle != Lifecycle::Running || !self.still_active() {
            return;
        }
        info!(seconds_remaining = self.state.seconds_remaining, "session hidden while running");
        self.emit(Event::SessionAbandon {
            seconds_remaining: self.state.seconds_remaining,
            at: Utc::now(),
        });
    }

    pub fn cool_down_elapsed(&mut self) {
        if self.lifecycle == Lifecycle::Ending {
            self.reset_to_idle();
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Start the next non-empty phase, or unwind once the plan is exhausted.
    ///
    /// Only reached while running. Expiry and stop cancel the active phase
    /// through [`Self::halt`] before another boundary can come up.
    fn advance_cycle(&mut self) {
        loop {
            let Some(planned) = self.plan.as_mut().and_then(CyclePlan::next_phase) else {
                debug!("phase plan exhausted, waiting for session clock");
                self.unwind_cycle();
                return;
            };
            match self
                .phases
                .begin(planned, self.renderer.as_mut(), &mut self.cues)
            {
                PhaseStart::Started => {
                    self.phase_generation += 1;
                    self.state.current_phase = Some(planned.phase);
                    self.state.phase_elapsed = 0;
                    debug!(phase = ?planned.phase, seconds = planned.seconds, "phase started");
                    return;
                }
                PhaseStart::Skipped => {
                    if let Some(plan) = self.plan.as_mut() {
                        plan.complete(planned);
                    }
                }
            }
        }
    }

    fn unwind_cycle(&mut self) {
        self.phases.cancel();
        self.plan = None;
        self.state.current_phase = None;
    }

    fn finish(&mut self) {
        self.halt();
        self.lifecycle = Lifecycle::Ending;
        self.sessions_completed += 1;
        info!(total_seconds = self.config.total_seconds, "session complete");
        self.emit(Event::SessionComplete {
            total_seconds: self.config.total_seconds,
            at: Utc::now(),
        });

        self.renderer.set_countdown_text(&format_countdown(0));
        self.renderer.set_progress_ring_fraction(1.0);
        self.renderer.set_phase_label(DONE_LABEL);
        self.renderer
            .set_pacer_animation(PacerMode::Neutral, COOL_DOWN.as_millis() as u64);
        self.renderer
            .set_start_control_state(ControlState::Disabled, DONE_LABEL);
    }

    fn halt(&mut self) {
        self.clock.stop();
        self.unwind_cycle();
        self.state.running = false;
    }

    fn reset_to_idle(&mut self) {
        self.lifecycle = Lifecycle::Idle;
        self.state = SessionState::idle(&self.config);
        self.render_idle();
    }

    fn render_clock(&mut self) {
        self.renderer
            .set_countdown_text(&format_countdown(self.state.seconds_remaining));
        self.renderer
            .set_progress_ring_fraction(self.clock.elapsed_fraction());
    }

    fn render_idle(&mut self) {
        self.renderer
            .set_countdown_text(&format_countdown(self.config.total_seconds));
        self.renderer.set_progress_ring_fraction(0.0);
        self.renderer.set_phase_label("");
        self.renderer.set_dot_count(0);
        self.renderer.set_pacer_animation(PacerMode::Neutral, 0);
        self.renderer
            .set_start_control_state(ControlState::Enabled, START_LABEL);
    }

    fn emit(&self, event: Event) {
        if let Some(sink) = &self.telemetry {
            sink.send(&event);
        }
    }
}

impl std::fmt::Debug for SessionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOrchestrator")
            .field("config", &self.config)
            .field("lifecycle", &self.lifecycle)
            .field("state", &self.state)
            .field("phase_generation", &self.phase_generation)
            .finish_non_exhaustive()
    }
}
