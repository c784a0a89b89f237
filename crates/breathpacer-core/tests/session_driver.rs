//! Driver tests on a paused tokio clock.
//!
//! Virtual time auto-advances whenever every task is idle, so a 20-second
//! session completes instantly while still seeing every tick in order.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use breathpacer_core::{
    BreathPattern, ControlState, CueEmitter, CueError, CueSettings, Event, Lifecycle, PacerMode,
    Renderer, SessionConfig, SessionDriver, SessionOrchestrator, TelemetrySink,
};
use tokio::time::sleep;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Label(String),
    Fill(u32),
    Control(ControlState, String),
    Tone(f64),
    Other,
}

#[derive(Clone, Default)]
struct Capture {
    calls: Arc<Mutex<Vec<Call>>>,
    events: Arc<Mutex<Vec<Event>>>,
}

impl Capture {
    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn labels(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Label(l) if !l.is_empty() => Some(l),
                _ => None,
            })
            .collect()
    }

    fn fills(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Fill(_)))
            .count()
    }

    fn event_names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(Event::name).collect()
    }
}

impl Renderer for Capture {
    fn set_countdown_text(&mut self, _text: &str) {
        self.push(Call::Other);
    }
    fn set_progress_ring_fraction(&mut self, _fraction: f64) {
        self.push(Call::Other);
    }
    fn set_pacer_animation(&mut self, _mode: PacerMode, _duration_ms: u64) {
        self.push(Call::Other);
    }
    fn set_phase_label(&mut self, text: &str) {
        self.push(Call::Label(text.to_string()));
    }
    fn set_dot_count(&mut self, _count: u32) {
        self.push(Call::Other);
    }
    fn fill_dot(&mut self, index: u32) {
        self.push(Call::Fill(index));
    }
    fn set_start_control_state(&mut self, state: ControlState, label: &str) {
        self.push(Call::Control(state, label.to_string()));
    }
}

impl CueEmitter for Capture {
    fn emit_tone_cue(&mut self, frequency_hz: f64, _duration_secs: f64) -> Result<(), CueError> {
        self.push(Call::Tone(frequency_hz));
        Ok(())
    }
    fn emit_haptic_cue(&mut self, _pattern_ms: &[u64]) -> Result<(), CueError> {
        Err(CueError::Unavailable("haptic"))
    }
}

impl TelemetrySink for Capture {
    fn send(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}

fn orchestrator(config: SessionConfig, capture: &Capture) -> SessionOrchestrator {
    SessionOrchestrator::new(config, Box::new(capture.clone()))
        .with_cues(Box::new(capture.clone()))
        .with_telemetry(Arc::new(capture.clone()))
}

fn config(total: u32, paced: Option<u32>, settle: Option<u32>) -> SessionConfig {
    SessionConfig::new(total, BreathPattern::default(), paced, settle).unwrap()
}

#[tokio::test(start_paused = true)]
async fn twenty_second_session_end_to_end() {
    let capture = Capture::default();
    let (handle, task) = SessionDriver::spawn(orchestrator(config(20, None, None), &capture));

    handle.start(CueSettings::default()).unwrap();
    sleep(Duration::from_millis(20_500)).await;

    assert_eq!(
        capture.labels(),
        vec!["Breathe in", "Breathe out", "Breathe in", "Breathe out", "Done"]
    );
    assert_eq!(capture.event_names(), vec!["session_start", "session_complete"]);
    let snap = handle.snapshot();
    assert_eq!(snap.lifecycle, Lifecycle::Ending);
    assert_eq!(snap.seconds_remaining, 0);
    assert_eq!(snap.sessions_completed, 1);

    // Cool-down is 900 ms after the final tick.
    sleep(Duration::from_millis(500)).await;
    assert_eq!(handle.snapshot().lifecycle, Lifecycle::Idle);
    assert_eq!(
        capture.calls().last(),
        Some(&Call::Control(ControlState::Enabled, "Start".into()))
    );

    drop(handle);
    let orch = task.await.unwrap();
    assert_eq!(orch.state().seconds_remaining, 20);
}

#[tokio::test(start_paused = true)]
async fn double_start_runs_one_session() {
    let capture = Capture::default();
    let (handle, _task) = SessionDriver::spawn(orchestrator(config(10, None, None), &capture));

    handle.start(CueSettings::default()).unwrap();
    handle.start(CueSettings::default()).unwrap();
    sleep(Duration::from_millis(5_500)).await;

    assert_eq!(capture.event_names(), vec!["session_start"]);
    // One fill per elapsed second, not two.
    assert_eq!(capture.fills(), 5);
}

#[tokio::test(start_paused = true)]
async fn stop_mid_phase_halts_ticks_and_resets() {
    let capture = Capture::default();
    let (handle, _task) = SessionDriver::spawn(orchestrator(config(60, None, None), &capture));

    handle.start(CueSettings::default()).unwrap();
    sleep(Duration::from_millis(2_500)).await;
    handle.stop().unwrap();
    sleep(Duration::from_millis(100)).await;

    let fills_at_stop = capture.fills();
    assert_eq!(fills_at_stop, 2);
    assert_eq!(handle.snapshot().lifecycle, Lifecycle::Idle);
    assert_eq!(
        capture.calls().last(),
        Some(&Call::Control(ControlState::Enabled, "Start".into()))
    );

    sleep(Duration::from_secs(10)).await;
    assert_eq!(capture.fills(), fills_at_stop);
    assert_eq!(capture.event_names(), vec!["session_start"]);
}

#[tokio::test(start_paused = true)]
async fn hidden_widget_is_reported_not_stopped() {
    let capture = Capture::default();
    let (handle, _task) = SessionDriver::spawn(orchestrator(config(30, None, None), &capture));

    handle.start(CueSettings::default()).unwrap();
    sleep(Duration::from_millis(3_500)).await;
    handle.hidden().unwrap();
    sleep(Duration::from_secs(5)).await;

    let events = capture.events.lock().unwrap().clone();
    assert!(matches!(
        events.as_slice(),
        [Event::SessionStart { total_seconds: 30, .. }, Event::SessionAbandon { seconds_remaining: 27, .. }]
    ));
    let snap = handle.snapshot();
    assert_eq!(snap.lifecycle, Lifecycle::Running);
    assert_eq!(snap.seconds_remaining, 22);
}

#[tokio::test(start_paused = true)]
async fn paced_loop_then_settle() {
    let capture = Capture::default();
    let (handle, _task) =
        SessionDriver::spawn(orchestrator(config(35, Some(25), Some(10)), &capture));

    handle.start(CueSettings::default()).unwrap();
    sleep(Duration::from_millis(36_000)).await;

    assert_eq!(
        capture.labels(),
        vec![
            "Breathe in",
            "Breathe out",
            "Breathe in",
            "Breathe out",
            "Relax, breathe freely",
            "Done"
        ]
    );
    // Tones only for the paced phases.
    let tones: Vec<_> = capture
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Tone(_)))
        .collect();
    assert_eq!(
        tones,
        vec![Call::Tone(440.0), Call::Tone(220.0), Call::Tone(440.0), Call::Tone(220.0)]
    );
    assert_eq!(handle.snapshot().lifecycle, Lifecycle::Idle);
}

#[tokio::test(start_paused = true)]
async fn session_can_be_restarted_after_cool_down() {
    let capture = Capture::default();
    let (handle, _task) = SessionDriver::spawn(orchestrator(config(3, None, None), &capture));

    handle.start(CueSettings::default()).unwrap();
    sleep(Duration::from_secs(5)).await;
    handle.start(CueSettings { sound: false, vibration: false }).unwrap();
    sleep(Duration::from_secs(5)).await;

    assert_eq!(
        capture.event_names(),
        vec!["session_start", "session_complete", "session_start", "session_complete"]
    );
    assert_eq!(handle.snapshot().sessions_completed, 2);
    let tones = capture
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::Tone(_)))
        .count();
    assert_eq!(tones, 1);
}

#[tokio::test(start_paused = true)]
async fn handle_reports_dead_driver() {
    let capture = Capture::default();
    let (handle, task) = SessionDriver::spawn(orchestrator(config(3, None, None), &capture));
    task.abort();
    let _ = task.await;
    assert!(handle.start(CueSettings::default()).is_err());
}
