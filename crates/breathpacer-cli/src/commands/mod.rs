pub mod config;
pub mod plan;
pub mod run;
pub mod toggle;

use std::collections::BTreeMap;

use breathpacer_core::timer::{keys, ConfigSource};
use breathpacer_core::{Config, SessionConfig};
use clap::Args;

/// Session overrides shared by `run` and `plan`. Anything left out comes
/// from the config file.
#[derive(Args, Debug, Default)]
pub struct SessionArgs {
    /// Total session length in seconds
    #[arg(long)]
    pub total: Option<String>,
    /// Inhale length in seconds
    #[arg(long)]
    pub inhale: Option<String>,
    /// Hold after inhale, in seconds
    #[arg(long)]
    pub hold1: Option<String>,
    /// Exhale length in seconds
    #[arg(long)]
    pub exhale: Option<String>,
    /// Hold after exhale, in seconds
    #[arg(long)]
    pub hold2: Option<String>,
    /// Paced-loop budget in seconds (needs --settle)
    #[arg(long)]
    pub paced: Option<String>,
    /// Settle stage length in seconds (needs --paced)
    #[arg(long)]
    pub settle: Option<String>,
    /// Title shown above the countdown
    #[arg(long)]
    pub title: Option<String>,
}

impl SessionArgs {
    /// Merge command-line values over the config file and resolve.
    pub fn resolve(&self, config: &Config) -> SessionConfig {
        let mut values = BTreeMap::new();
        let all = [
            keys::TOTAL,
            keys::INHALE,
            keys::HOLD1,
            keys::EXHALE,
            keys::HOLD2,
            keys::PACED,
            keys::SETTLE,
            keys::TITLE,
        ];
        for key in all {
            if let Some(v) = config.session.value(key) {
                values.insert(key.to_string(), v);
            }
        }

        let overrides = [
            (keys::TOTAL, &self.total),
            (keys::INHALE, &self.inhale),
            (keys::HOLD1, &self.hold1),
            (keys::EXHALE, &self.exhale),
            (keys::HOLD2, &self.hold2),
            (keys::PACED, &self.paced),
            (keys::SETTLE, &self.settle),
            (keys::TITLE, &self.title),
        ];
        for (key, value) in overrides {
            if let Some(v) = value {
                values.insert(key.to_string(), v.clone());
            }
        }

        SessionConfig::resolve(&values)
    }
}
