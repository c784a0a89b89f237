use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::phase::Phase;
use crate::error::ValidationError;

pub const DEFAULT_TOTAL_SECONDS: u32 = 60;
pub const DEFAULT_TITLE: &str = "Breathe";

/// Configuration keys understood by [`SessionConfig::resolve`].
pub mod keys {
    pub const TOTAL: &str = "total_seconds";
    pub const INHALE: &str = "inhale_seconds";
    pub const HOLD1: &str = "hold1_seconds";
    pub const EXHALE: &str = "exhale_seconds";
    pub const HOLD2: &str = "hold2_seconds";
    pub const PACED: &str = "paced_seconds";
    pub const SETTLE: &str = "settle_seconds";
    pub const TITLE: &str = "title";
}

/// Lengths of the four sub-phases of one breathing cycle, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathPattern {
    pub inhale: u32,
    pub hold1: u32,
    pub exhale: u32,
    pub hold2: u32,
}

impl Default for BreathPattern {
    fn default() -> Self {
        Self {
            inhale: 4,
            hold1: 0,
            exhale: 6,
            hold2: 0,
        }
    }
}

impl BreathPattern {
    pub fn cycle_seconds(&self) -> u32 {
        self.inhale
            .saturating_add(self.hold1)
            .saturating_add(self.exhale)
            .saturating_add(self.hold2)
    }

    /// Sub-phase at `index` (0..4) of the cycle.
    pub fn step(&self, index: usize) -> PlannedPhase {
        let (phase, seconds) = match index % 4 {
            0 => (Phase::Inhale, self.inhale),
            1 => (Phase::Hold, self.hold1),
            2 => (Phase::Exhale, self.exhale),
            _ => (Phase::Hold, self.hold2),
        };
        PlannedPhase { phase, seconds }
    }

    fn rest_of_cycle_is_empty(&self, from: usize) -> bool {
        (from..4).all(|i| self.step(i).seconds == 0)
    }
}

/// Paced loop followed by an unpaced settle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoStage {
    pub paced_seconds: u32,
    pub settle_seconds: u32,
}

/// Immutable input to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub total_seconds: u32,
    pub pattern: BreathPattern,
    pub two_stage: Option<TwoStage>,
    pub title: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            total_seconds: DEFAULT_TOTAL_SECONDS,
            pattern: BreathPattern::default(),
            two_stage: None,
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Anything that can hand out configuration values as strings.
pub trait ConfigSource {
    fn value(&self, key: &str) -> Option<String>;
}

impl ConfigSource for HashMap<String, String> {
    fn value(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl ConfigSource for BTreeMap<String, String> {
    fn value(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl ConfigSource for [(&str, &str)] {
    fn value(&self, key: &str) -> Option<String> {
        self.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    }
}

impl SessionConfig {
    /// Strict constructor.
    ///
    /// # Errors
    ///
    /// Rejects a zero total, an all-zero pattern, and half of a two-stage pair.
    pub fn new(
        total_seconds: u32,
        pattern: BreathPattern,
        paced_seconds: Option<u32>,
        settle_seconds: Option<u32>,
    ) -> Result<Self, ValidationError> {
        if total_seconds == 0 {
            return Err(ValidationError::InvalidValue {
                field: keys::TOTAL.into(),
                message: "must be greater than zero".into(),
            });
        }
        if pattern.cycle_seconds() == 0 {
            return Err(ValidationError::EmptyPattern);
        }
        let two_stage = match (paced_seconds, settle_seconds) {
            (None, None) => None,
            (Some(p), Some(s)) if p > 0 && s > 0 => Some(TwoStage {
                paced_seconds: p,
                settle_seconds: s,
            }),
            (Some(0), _) | (_, Some(0)) => {
                return Err(ValidationError::InvalidValue {
                    field: format!("{}/{}", keys::PACED, keys::SETTLE),
                    message: "must be greater than zero".into(),
                })
            }
            _ => return Err(ValidationError::IncompleteTwoStage),
        };
        Ok(Self {
            total_seconds,
            pattern,
            two_stage,
            title: DEFAULT_TITLE.to_string(),
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Lenient constructor: anything missing or malformed falls back to its
    /// default instead of failing.
    pub fn resolve(source: &(impl ConfigSource + ?Sized)) -> Self {
        let defaults = BreathPattern::default();

        let total_seconds = positive(source, keys::TOTAL).unwrap_or(DEFAULT_TOTAL_SECONDS);
        let mut pattern = BreathPattern {
            inhale: non_negative(source, keys::INHALE).unwrap_or(defaults.inhale),
            hold1: non_negative(source, keys::HOLD1).unwrap_or(defaults.hold1),
            exhale: non_negative(source, keys::EXHALE).unwrap_or(defaults.exhale),
            hold2: non_negative(source, keys::HOLD2).unwrap_or(defaults.hold2),
        };
        if pattern.cycle_seconds() == 0 {
            warn!("breathing pattern is all zeros, using default pattern");
            pattern = defaults;
        }

        let two_stage = match (positive(source, keys::PACED), positive(source, keys::SETTLE)) {
            (Some(paced_seconds), Some(settle_seconds)) => Some(TwoStage {
                paced_seconds,
                settle_seconds,
            }),
            (None, None) => None,
            _ => {
                warn!("paced and settle seconds must be given together, running a single loop");
                None
            }
        };

        let title = source
            .value(keys::TITLE)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        Self {
            total_seconds,
            pattern,
            two_stage,
            title,
        }
    }
}

fn parse_seconds(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    })
}

fn read(source: &(impl ConfigSource + ?Sized), key: &str, min: i64) -> Option<u32> {
    let raw = source.value(key)?;
    let parsed = parse_seconds(&raw)
        .filter(|n| *n >= min)
        .and_then(|n| u32::try_from(n).ok());
    if parsed.is_none() {
        warn!(key, value = %raw, "ignoring invalid configuration value");
    }
    parsed
}

fn positive(source: &(impl ConfigSource + ?Sized), key: &str) -> Option<u32> {
    read(source, key, 1)
}

fn non_negative(source: &(impl ConfigSource + ?Sized), key: &str) -> Option<u32> {
    read(source, key, 0)
}

/// One phase the cycling procedure wants to run next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedPhase {
    pub phase: Phase,
    pub seconds: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Cycling,
    Settle(u32),
    Finished,
}

/// The phase-cycling procedure as an explicit cursor.
///
/// Call [`CyclePlan::next_phase`] to get the next non-empty phase and
/// [`CyclePlan::complete`] when it has run in full. The paced budget only
/// shrinks on completion, so an aborted phase costs nothing.
#[derive(Debug, Clone)]
pub struct CyclePlan {
    pattern: BreathPattern,
    stage: Stage,
    step: usize,
    paced_remaining: Option<u32>,
    settle_seconds: Option<u32>,
    cycles_completed: u32,
}

impl CyclePlan {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            pattern: config.pattern,
            stage: Stage::Cycling,
            step: 0,
            paced_remaining: config.two_stage.map(|t| t.paced_seconds),
            settle_seconds: config.two_stage.map(|t| t.settle_seconds),
            cycles_completed: 0,
        }
    }

    /// `None` once the paced loop and settle stage are both done. An
    /// unbounded loop never returns `None`.
    pub fn next_phase(&mut self) -> Option<PlannedPhase> {
        loop {
            match self.stage {
                Stage::Finished => return None,
                Stage::Settle(seconds) => {
                    self.stage = Stage::Finished;
                    return Some(PlannedPhase {
                        phase: Phase::Settle,
                        seconds,
                    });
                }
                Stage::Cycling => {
                    if self.step == 0 {
                        if let Some(budget) = self.paced_remaining {
                            if self.pattern.cycle_seconds() > budget {
                                self.stage = match self.settle_seconds {
                                    Some(s) => Stage::Settle(s),
                                    None => Stage::Finished,
                                };
                                continue;
                            }
                        }
                    }
                    let planned = self.pattern.step(self.step);
                    self.step = (self.step + 1) % 4;
                    if planned.seconds > 0 {
                        return Some(planned);
                    }
                }
            }
        }
    }

    pub fn complete(&mut self, planned: PlannedPhase) {
        if planned.phase == Phase::Settle {
            return;
        }
        if let Some(budget) = self.paced_remaining.as_mut() {
            *budget = budget.saturating_sub(planned.seconds);
        }
        if self.step == 0 || self.pattern.rest_of_cycle_is_empty(self.step) {
            self.cycles_completed += 1;
        }
    }

    pub fn paced_remaining(&self) -> Option<u32> {
        self.paced_remaining
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }
}

/// A phase as it would run in an uninterrupted session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub phase: Phase,
    pub seconds: u32,
    /// Offset from session start.
    pub starts_at: u32,
    /// Shorter than `seconds` when the session clock runs out mid-phase.
    pub runs_for: u32,
}

/// Upper bound on the entries [`plan_phases`] collects.
pub const MAX_PLAN_ENTRIES: usize = 10_000;

/// Lazy phase sequence of a full session, for previews.
#[derive(Debug, Clone)]
pub struct PlanIter {
    plan: CyclePlan,
    total_seconds: u32,
    elapsed: u32,
}

impl Iterator for PlanIter {
    type Item = PlanEntry;

    fn next(&mut self) -> Option<PlanEntry> {
        if self.elapsed >= self.total_seconds {
            return None;
        }
        let planned = self.plan.next_phase()?;
        let runs_for = planned.seconds.min(self.total_seconds - self.elapsed);
        let entry = PlanEntry {
            phase: planned.phase,
            seconds: planned.seconds,
            starts_at: self.elapsed,
            runs_for,
        };
        self.elapsed += runs_for;
        self.plan.complete(planned);
        Some(entry)
    }
}

pub fn plan_iter(config: &SessionConfig) -> PlanIter {
    PlanIter {
        plan: CyclePlan::new(config),
        total_seconds: config.total_seconds,
        elapsed: 0,
    }
}

/// Phase sequence of a full session, cut off after [`MAX_PLAN_ENTRIES`].
pub fn plan_phases(config: &SessionConfig) -> Vec<PlanEntry> {
    plan_iter(config).take(MAX_PLAN_ENTRIES).collect()
}
