use std::future::Future;
use std::sync::Arc;

use breathpacer_core::{
    Config, CoreError, Lifecycle, SessionDriver, SessionHandle, SessionOrchestrator, SettingsStore,
    TelemetrySink, Toggle,
};
use clap::Args;

use super::SessionArgs;
use crate::terminal::{BellCues, JsonLinesTelemetry, TerminalRenderer};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Mute tone cues for this session
    #[arg(long)]
    pub no_sound: bool,
    /// Disable vibration cues for this session
    #[arg(long)]
    pub no_vibration: bool,
    /// Print telemetry events as JSON lines on stderr
    #[arg(long)]
    pub telemetry: bool,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let session = args.session.resolve(&config);

    let telemetry: Option<Arc<dyn TelemetrySink>> = args
        .telemetry
        .then(|| Arc::new(JsonLinesTelemetry) as Arc<dyn TelemetrySink>);

    let mut settings = SettingsStore::new(config.cues);
    if let Some(sink) = &telemetry {
        settings = settings.with_telemetry(sink.clone());
    }
    if args.no_sound {
        settings.set(Toggle::Sound, false);
    }
    if args.no_vibration {
        settings.set(Toggle::Vibration, false);
    }

    println!("{} -- {}s", session.title, session.total_seconds);
    let renderer = TerminalRenderer::new(session.title.clone());
    let mut orchestrator =
        SessionOrchestrator::new(session, Box::new(renderer)).with_cues(Box::new(BellCues));
    if let Some(sink) = telemetry {
        orchestrator = orchestrator.with_telemetry(sink);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let (handle, task) = SessionDriver::spawn(orchestrator);
        handle.start(settings.snapshot())?;
        watch_session(&handle, tokio::signal::ctrl_c()).await?;
        drop(handle);
        task.await?;
        Ok::<_, Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}

/// How a watched session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    Interrupted,
}

/// Follow snapshots until the session has completed and cooled down, or
/// stop it once `interrupt` resolves. The interrupt future is created by the
/// caller and polled across every pass, so a signal between redraws is kept.
async fn watch_session<F: Future>(
    handle: &SessionHandle,
    interrupt: F,
) -> Result<Outcome, CoreError> {
    let mut updates = handle.subscribe();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            _ = &mut interrupt => {
                handle.stop()?;
                return Ok(Outcome::Interrupted);
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    return Err(CoreError::Custom("session driver has shut down".into()));
                }
                let snap = updates.borrow_and_update().clone();
                if snap.sessions_completed > 0 && snap.lifecycle == Lifecycle::Idle {
                    return Ok(Outcome::Completed);
                }
            }
        }
    }
}
