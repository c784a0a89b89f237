//! TOML-based application configuration.
//!
//! Stores:
//! - Session defaults (total length, breathing pattern, two-stage split, title)
//! - Cue toggles (sound, vibration)
//!
//! Configuration is stored at `~/.config/breathpacer/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError, Result};
use crate::settings::CueSettings;
use crate::timer::{keys, ConfigSource, SessionConfig};

/// Session defaults as written by the user.
///
/// Kept as signed integers so out-of-range values survive parsing and are
/// corrected when resolved into a [`SessionConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSection {
    #[serde(default = "default_total")]
    pub total_seconds: i64,
    #[serde(default = "default_inhale")]
    pub inhale_seconds: i64,
    #[serde(default)]
    pub hold1_seconds: i64,
    #[serde(default = "default_exhale")]
    pub exhale_seconds: i64,
    #[serde(default)]
    pub hold2_seconds: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paced_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_seconds: Option<i64>,
    #[serde(default = "default_title")]
    pub title: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breathpacer/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub cues: CueSettings,
}

// Default functions
fn default_total() -> i64 {
    crate::timer::DEFAULT_TOTAL_SECONDS as i64
}
fn default_inhale() -> i64 {
    4
}
fn default_exhale() -> i64 {
    6
}
fn default_title() -> String {
    crate::timer::DEFAULT_TITLE.into()
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            total_seconds: default_total(),
            inhale_seconds: default_inhale(),
            hold1_seconds: 0,
            exhale_seconds: default_exhale(),
            hold2_seconds: 0,
            paced_seconds: None,
            settle_seconds: None,
            title: default_title(),
        }
    }
}

impl ConfigSource for SessionSection {
    fn value(&self, key: &str) -> Option<String> {
        match key {
            keys::TOTAL => Some(self.total_seconds.to_string()),
            keys::INHALE => Some(self.inhale_seconds.to_string()),
            keys::HOLD1 => Some(self.hold1_seconds.to_string()),
            keys::EXHALE => Some(self.exhale_seconds.to_string()),
            keys::HOLD2 => Some(self.hold2_seconds.to_string()),
            keys::PACED => self.paced_seconds.map(|v| v.to_string()),
            keys::SETTLE => self.settle_seconds.map(|v| v.to_string()),
            keys::TITLE => Some(self.title.clone()),
            _ => None,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Optional keys (`session.paced_seconds`) are absent from the JSON view
    /// until set, so the leaf may be missing as long as its parent exists.
    fn set_json_value_by_path(root: &mut serde_json::Value, key: &str, value: &str) -> Result<()> {
        let unknown = || CoreError::from(ConfigError::UnknownKey(key.to_string()));
        let invalid = |message: String| {
            CoreError::from(ConfigError::InvalidValue {
                key: key.to_string(),
                message,
            })
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut parent = &mut *root;
        if let Some(path) = parent_path {
            for part in path.split('.') {
                parent = parent.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = parent.as_object_mut().ok_or_else(unknown)?;

        let new_value = match obj.get(leaf) {
            Some(serde_json::Value::Bool(_)) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            ),
            Some(serde_json::Value::Number(_)) | None => {
                if obj.get(leaf).is_none() && !Self::optional_leaf(key) {
                    return Err(unknown());
                }
                let n = value
                    .parse::<i64>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as integer")))?;
                serde_json::Value::Number(n.into())
            }
            Some(serde_json::Value::Object(_)) | Some(serde_json::Value::Array(_)) => {
                serde_json::from_str(value)?
            }
            Some(_) => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    fn optional_leaf(key: &str) -> bool {
        matches!(key, "session.paced_seconds" | "session.settle_seconds")
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Where the config lives on this machine.
    pub fn location() -> Result<PathBuf> {
        Self::path()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Returns error if key is unknown
    /// or the value has the wrong type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json)?;
        Ok(())
    }

    /// Resolve the session section, falling back to defaults for anything
    /// out of range.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::resolve(&self.session)
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::BreathPattern;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.session.total_seconds, 60);
        assert!(parsed.cues.sound);
        assert!(parsed.session.paced_seconds.is_none());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("cues.sound").as_deref(), Some("true"));
        assert_eq!(cfg.get("session.inhale_seconds").as_deref(), Some("4"));
        assert_eq!(cfg.get("session.title").as_deref(), Some("Breathe"));
        assert!(cfg.get("session.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("cues.vibration", "false").unwrap();
        cfg.set("session.exhale_seconds", "8").unwrap();
        cfg.set("session.title", "Box breathing").unwrap();
        assert!(!cfg.cues.vibration);
        assert_eq!(cfg.session.exhale_seconds, 8);
        assert_eq!(cfg.session.title, "Box breathing");
    }

    #[test]
    fn set_fills_optional_stage_keys() {
        let mut cfg = Config::default();
        cfg.set("session.paced_seconds", "40").unwrap();
        cfg.set("session.settle_seconds", "20").unwrap();
        let session = cfg.session_config();
        assert_eq!(session.two_stage.map(|t| t.paced_seconds), Some(40));
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("session.nonexistent", "1").is_err());
        assert!(cfg.set("cues.sound", "loud").is_err());
        assert!(cfg.set("session.total_seconds", "a minute").is_err());
        assert!(cfg.set("", "1").is_err());
    }

    #[test]
    fn out_of_range_values_resolve_to_defaults() {
        let mut cfg = Config::default();
        cfg.session.total_seconds = -5;
        cfg.session.inhale_seconds = 5;
        cfg.session.paced_seconds = Some(30);
        let session = cfg.session_config();
        assert_eq!(session.total_seconds, 60);
        assert_eq!(session.pattern, BreathPattern { inhale: 5, hold1: 0, exhale: 6, hold2: 0 });
        assert!(session.two_stage.is_none());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str("[session]\ntotal_seconds = 120\n").unwrap();
        assert_eq!(cfg.session.total_seconds, 120);
        assert_eq!(cfg.session.exhale_seconds, 6);
        assert!(cfg.cues.vibration);
    }

    #[test]
    fn save_and_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.session.hold1_seconds = 4;
        cfg.cues.sound = false;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.session.hold1_seconds, 4);
        assert!(!loaded.cues.sound);
    }

    #[test]
    fn load_from_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(&dir.path().join("absent.toml")).is_err());
    }
}
