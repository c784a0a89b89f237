mod clock;
mod driver;
mod engine;
mod phase;
mod schedule;

pub use clock::{format_countdown, ClockTick, SessionClock};
pub use driver::{Command, SessionDriver, SessionHandle};
pub use engine::{
    Input, Lifecycle, SessionOrchestrator, SessionSnapshot, SessionState, TimerDemand, COOL_DOWN,
};
pub use phase::{
    ActivePhase, PacerMode, Phase, PhaseScheduler, PhaseStart, PhaseTick, HOLD_TRANSITION_MS,
};
pub use schedule::{
    keys, plan_iter, plan_phases, BreathPattern, ConfigSource, CyclePlan, PlanEntry, PlanIter,
    PlannedPhase, SessionConfig, TwoStage, DEFAULT_TITLE, DEFAULT_TOTAL_SECONDS, MAX_PLAN_ENTRIES,
};
