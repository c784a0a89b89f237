//! Async driver for [`SessionOrchestrator`].
//!
//! Owns the tick sources: a one-second interval for the session clock, a
//! one-second interval for the active phase, and the cool-down sleep. All of
//! them live on one task, so the orchestrator has a single writer and needs
//! no locking.
//!
//! Phase intervals are armed from the instant of the tick that finished the
//! previous phase, which keeps session and phase boundaries on the same
//! grid. When both fire at the same instant the clock is handled first, so a
//! session that runs out never starts one more phase.

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior, Sleep};
use tracing::debug;

use super::engine::{Input, SessionOrchestrator, SessionSnapshot, TimerDemand, COOL_DOWN};
use crate::error::{CoreError, Result};
use crate::settings::CueSettings;

const TICK: Duration = Duration::from_secs(1);

/// Requests accepted from outside the driver task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start(CueSettings),
    Stop,
    Hidden,
}

impl From<Command> for Input {
    fn from(cmd: Command) -> Self {
        match cmd {
            Command::Start(settings) => Input::Start(settings),
            Command::Stop => Input::Stop,
            Command::Hidden => Input::Hidden,
        }
    }
}

/// Cloneable control surface of a running driver.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// # Errors
    ///
    /// Fails only if the driver task is gone.
    pub fn start(&self, settings: CueSettings) -> Result<()> {
        self.send(Command::Start(settings))
    }

    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    /// Report that the widget went out of view.
    pub fn hidden(&self) -> Result<()> {
        self.send(Command::Hidden)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver updated after every handled input.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.commands
            .send(cmd)
            .map_err(|_| CoreError::Custom("session driver has shut down".into()))
    }
}

/// What woke the driver up.
enum Wake {
    Command(Command),
    Clock(Instant),
    Phase(Instant),
    CoolDown,
}

pub struct SessionDriver {
    orchestrator: SessionOrchestrator,
    commands: mpsc::UnboundedReceiver<Command>,
    snapshots: watch::Sender<SessionSnapshot>,
    clock: Option<Interval>,
    phase: Option<(u64, Interval)>,
    cool_down: Option<Pin<Box<Sleep>>>,
}

impl SessionDriver {
    pub fn new(orchestrator: SessionOrchestrator) -> (Self, SessionHandle) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (snap_tx, snap_rx) = watch::channel(orchestrator.snapshot());
        let driver = Self {
            orchestrator,
            commands: cmd_rx,
            snapshots: snap_tx,
            clock: None,
            phase: None,
            cool_down: None,
        };
        let handle = SessionHandle {
            commands: cmd_tx,
            snapshots: snap_rx,
        };
        (driver, handle)
    }

    /// Spawn onto the current runtime. The task ends, handing back the
    /// orchestrator, once every handle is dropped.
    pub fn spawn(orchestrator: SessionOrchestrator) -> (SessionHandle, JoinHandle<SessionOrchestrator>) {
        let (driver, handle) = Self::new(orchestrator);
        (handle, tokio::spawn(driver.run()))
    }

    pub async fn run(mut self) -> SessionOrchestrator {
        let mut anchor = Instant::now();
        loop {
            self.reconcile(anchor);

            let wake = tokio::select! {
                biased;
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => Wake::Command(cmd),
                    None => break,
                },
                at = next_tick(&mut self.clock) => Wake::Clock(at),
                at = next_phase_tick(&mut self.phase) => Wake::Phase(at),
                _ = wait(&mut self.cool_down) => Wake::CoolDown,
            };

            let input = match wake {
                Wake::Command(cmd) => {
                    anchor = Instant::now();
                    cmd.into()
                }
                Wake::Clock(at) => {
                    anchor = at;
                    Input::ClockTick
                }
                Wake::Phase(at) => {
                    anchor = at;
                    Input::PhaseTick
                }
                Wake::CoolDown => {
                    self.cool_down = None;
                    anchor = Instant::now();
                    Input::CoolDownElapsed
                }
            };
            self.orchestrator.handle(input);
            self.snapshots.send_replace(self.orchestrator.snapshot());
        }
        debug!("all session handles dropped, driver exiting");
        self.orchestrator
    }

    /// Arm or disarm timers to match what the orchestrator wants.
    fn reconcile(&mut self, anchor: Instant) {
        let TimerDemand {
            clock,
            phase,
            cool_down,
        } = self.orchestrator.timers();

        match (clock, self.clock.is_some()) {
            (true, false) => self.clock = Some(ticker(anchor)),
            (false, true) => self.clock = None,
            _ => {}
        }

        match phase {
            Some(generation) if self.phase.as_ref().map(|(g, _)| *g) != Some(generation) => {
                self.phase = Some((generation, ticker(anchor)));
            }
            Some(_) => {}
            None => self.phase = None,
        }

        match (cool_down, self.cool_down.is_some()) {
            (true, false) => self.cool_down = Some(Box::pin(sleep_until(anchor + COOL_DOWN))),
            (false, true) => self.cool_down = None,
            _ => {}
        }
    }
}

fn ticker(anchor: Instant) -> Interval {
    let mut interval = interval_at(anchor + TICK, TICK);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn next_tick(interval: &mut Option<Interval>) -> Instant {
    match interval {
        Some(interval) => interval.tick().await,
        None => pending().await,
    }
}

async fn next_phase_tick(phase: &mut Option<(u64, Interval)>) -> Instant {
    match phase {
        Some((_, interval)) => interval.tick().await,
        None => pending().await,
    }
}

async fn wait(sleep: &mut Option<Pin<Box<Sleep>>>) {
    match sleep {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}
