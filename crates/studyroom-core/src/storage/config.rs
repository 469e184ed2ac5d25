//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Session store location (backend base URL)
//! - Default preset and long-break cadence
//! - Default course/topic selection
//! - Whether hand-offs are journaled locally
//!
//! Configuration is stored at `~/.config/studyroom/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::session::Selection;
use crate::timer::{Preset, TimerSettings, PRESETS};

/// External session store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// When false, hand-offs only reach the local journal.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Connect timeout for the HTTP client. Requests themselves have none.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

/// Timer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Index into the built-in presets.
    #[serde(default)]
    pub preset: usize,
    #[serde(default = "default_long_break")]
    pub long_break: u32,
    #[serde(default = "default_sessions_before_long")]
    pub sessions_before_long: u32,
}

/// Default course/topic for new timers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyConfig {
    #[serde(default)]
    pub course_id: Option<i64>,
    #[serde(default)]
    pub topic_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/studyroom/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub study: StudyConfig,
    #[serde(default)]
    pub journal: JournalConfig,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_base_url() -> String {
    "http://localhost:8080".into()
}
fn default_long_break() -> u32 {
    15
}
fn default_sessions_before_long() -> u32 {
    4
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_base_url(),
            connect_timeout_secs: None,
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            preset: 0,
            long_break: default_long_break(),
            sessions_before_long: default_sessions_before_long(),
        }
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self { enabled: true }
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

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = if value == "null" {
                    serde_json::Value::Null
                } else {
                    match existing {
                        serde_json::Value::Bool(_) => serde_json::Value::Bool(
                            value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                        ),
                        serde_json::Value::Number(_) | serde_json::Value::Null => {
                            Self::parse_number(value).ok_or_else(|| {
                                invalid(format!("cannot parse '{value}' as number"))
                            })?
                        }
                        serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                            serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                        }
                        serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                    }
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn parse_number(value: &str) -> Option<serde_json::Value> {
        if let Ok(n) = value.parse::<u64>() {
            Some(serde_json::Value::Number(n.into()))
        } else if let Ok(n) = value.parse::<i64>() {
            Some(serde_json::Value::Number(n.into()))
        } else {
            value
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
        }
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the data directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
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

    /// Set a config value by dot-separated key. `"null"` clears optional keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit it.
    /// The config is left unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Reject values that would only fail later, at timer start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timer.preset >= PRESETS.len() {
            return Err(ConfigError::InvalidValue {
                key: "timer.preset".into(),
                message: format!("must be below {}", PRESETS.len()),
            });
        }
        if self.timer.sessions_before_long == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timer.sessions_before_long".into(),
                message: "must be at least 1".into(),
            });
        }
        url::Url::parse(&self.backend.base_url).map_err(|e| ConfigError::InvalidValue {
            key: "backend.base_url".into(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    pub fn preset(&self) -> Preset {
        Preset::builtin(self.timer.preset).unwrap_or_default()
    }

    pub fn timer_settings(&self) -> TimerSettings {
        TimerSettings::new(self.timer.sessions_before_long, self.timer.long_break)
    }

    pub fn selection(&self) -> Selection {
        Selection::new(self.study.course_id, self.study.topic_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert!(parsed.study.course_id.is_none());
    }

    #[test]
    fn empty_file_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.backend.base_url, "http://localhost:8080");
        assert_eq!(cfg.timer.sessions_before_long, 4);
        assert_eq!(cfg.timer.long_break, 15);
        assert!(cfg.journal.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("backend.enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("timer.long_break").as_deref(), Some("15"));
        assert_eq!(cfg.get("study.course_id").as_deref(), Some("null"));
        assert!(cfg.get("timer.missing_key").is_none());
    }

    #[test]
    fn set_fills_optional_id() {
        let mut cfg = Config::default();
        cfg.set("study.course_id", "3").unwrap();
        cfg.set("study.topic_id", "7").unwrap();
        assert_eq!(cfg.selection(), Selection::of(3, 7));

        cfg.set("study.topic_id", "null").unwrap();
        assert_eq!(cfg.study.topic_id, None);
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("backend.enabled", "false").unwrap();
        cfg.set("backend.base_url", "https://study.example.com").unwrap();
        cfg.set("timer.preset", "2").unwrap();
        assert!(!cfg.backend.enabled);
        assert_eq!(cfg.backend.base_url, "https://study.example.com");
        assert_eq!(cfg.preset(), Preset::new(100, 20));
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.set("timer.nonexistent_key", "1").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey(_)));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("backend.enabled", "not_a_bool").is_err());
        assert!(cfg.set("timer.long_break", "soon").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn set_rejects_out_of_range_preset() {
        let mut cfg = Config::default();
        assert!(cfg.set("timer.preset", "3").is_err());
        assert!(cfg.set("timer.sessions_before_long", "0").is_err());
        assert_eq!(cfg.timer.preset, 0);
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("backend.connect_timeout_secs", "5").unwrap();
        changed.save_to(&path).unwrap();
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.backend.connect_timeout_secs, Some(5));
    }

    #[test]
    fn load_from_rejects_broken_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[timer\npreset = ").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::LoadFailed { .. }));
    }

    #[test]
    fn timer_settings_follow_config() {
        let mut cfg = Config::default();
        cfg.set("timer.sessions_before_long", "3").unwrap();
        cfg.set("timer.long_break", "20").unwrap();
        assert_eq!(cfg.timer_settings(), TimerSettings::new(3, 20));
    }
}
