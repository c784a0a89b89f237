//! # Breathpacer Core Library
//!
//! This library provides the session engine behind a guided breathing
//! widget: a countdown, a pulsing pacer and a progress ring kept in step with
//! an inhale / hold / exhale / hold pattern, optionally followed by an unpaced
//! settle stage.
//!
//! ## Architecture
//!
//! - **Session clock**: whole-session countdown, one tick per second
//! - **Phase scheduler**: runs one breathing phase at a time and can be
//!   cancelled at any one-second boundary
//! - **Orchestrator**: pure state machine composing the two and routing every
//!   transition to the renderer, cue emitter and telemetry sink
//! - **Driver**: tokio task owning the tick sources
//!
//! ## Key Components
//!
//! - [`SessionOrchestrator`]: session state machine
//! - [`SessionDriver`] / [`SessionHandle`]: async runtime glue
//! - [`Renderer`], [`CueEmitter`], [`TelemetrySink`]: collaborator traits
//! - [`Config`]: TOML configuration management

pub mod error;
pub mod events;
pub mod outputs;
pub mod settings;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, CueError, ValidationError};
pub use events::Event;
pub use outputs::{ControlState, CueEmitter, NoCues, NullRenderer, Renderer, TelemetrySink};
pub use settings::{CueSettings, SettingsStore, Toggle};
pub use storage::Config;
pub use timer::{
    format_countdown, plan_phases, BreathPattern, Lifecycle, PacerMode, Phase, SessionConfig,
    SessionDriver, SessionHandle, SessionOrchestrator, SessionSnapshot,
};
