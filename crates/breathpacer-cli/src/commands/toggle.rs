use std::sync::Arc;

use breathpacer_core::{Config, SettingsStore, Toggle};
use clap::{Args, ValueEnum};

use crate::terminal::JsonLinesTelemetry;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

#[derive(Args, Debug)]
pub struct ToggleArgs {
    /// Cue to change (sound or vibration)
    pub toggle: Toggle,
    pub state: Switch,
    /// Print the toggle_changed event as a JSON line on stderr
    #[arg(long)]
    pub telemetry: bool,
}

pub fn run(args: ToggleArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    let mut store = SettingsStore::new(config.cues);
    if args.telemetry {
        store = store.with_telemetry(Arc::new(JsonLinesTelemetry));
    }

    let enabled = matches!(args.state, Switch::On);
    if store.set(args.toggle, enabled) {
        config.cues = store.snapshot();
        config.save()?;
    }
    println!(
        "{}: {}",
        serde_json::to_string(&args.toggle)?.trim_matches('"'),
        if enabled { "on" } else { "off" }
    );
    Ok(())
}
