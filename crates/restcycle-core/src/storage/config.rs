//! TOML-based application configuration.
//!
//! Stores:
//! - How many accounts to track and their default goal/interval/rest
//! - Per-account overrides
//! - Scheduler cadence
//! - Notification preferences (volume, vibration fallback)
//!
//! Configuration is stored at `~/.config/restcycle/config.toml`.
//! Timer state itself is never persisted.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::account::{AccountId, AccountSettings};
use crate::error::ConfigError;

/// Account defaults and overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountsConfig {
    #[serde(default = "default_account_count")]
    pub count: u32,
    #[serde(default = "default_goal_hours")]
    pub goal_hours: u32,
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,
    #[serde(default = "default_rest_minutes")]
    pub rest_minutes: u32,
    /// Settings for individual accounts; unset fields use the defaults above.
    #[serde(default)]
    pub overrides: Vec<AccountOverride>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountOverride {
    pub id: u32,
    #[serde(default)]
    pub goal_hours: Option<u32>,
    #[serde(default)]
    pub interval_minutes: Option<u32>,
    #[serde(default)]
    pub rest_minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_50")]
    pub volume: u32,
    #[serde(default = "default_true")]
    pub vibration: bool,
    /// Play the alert sound once when an interactive session starts.
    #[serde(default)]
    pub startup_sound_check: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/restcycle/config.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub accounts: AccountsConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

// Default functions
fn default_account_count() -> u32 {
    6
}
fn default_goal_hours() -> u32 {
    8
}
fn default_interval_minutes() -> u32 {
    25
}
fn default_rest_minutes() -> u32 {
    5
}
fn default_tick_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}
fn default_50() -> u32 {
    50
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            count: default_account_count(),
            goal_hours: default_goal_hours(),
            interval_minutes: default_interval_minutes(),
            rest_minutes: default_rest_minutes(),
            overrides: Vec::new(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 50,
            vibration: true,
            startup_sound_check: false,
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
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => value
                        .parse::<bool>()
                        .map(serde_json::Value::Bool)
                        .map_err(|e| invalid(e.to_string()))?,
                    serde_json::Value::Number(_) => value
                        .trim()
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("'{value}' is not a non-negative integer")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;
        let cfg: Config = toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to the default location.
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

    /// Set a config value by dot-separated key. The change is validated but
    /// not saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is rejected; the
    /// config is left unchanged in that case.
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

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.accounts.count == 0 {
            return Err(ConfigError::InvalidValue {
                key: "accounts.count".into(),
                message: "at least one account is required".into(),
            });
        }
        if self.scheduler.tick_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.tick_ms".into(),
                message: "tick interval must be positive".into(),
            });
        }
        if self.notifications.volume > 100 {
            return Err(ConfigError::InvalidValue {
                key: "notifications.volume".into(),
                message: "volume must be between 0 and 100".into(),
            });
        }
        Ok(())
    }

    /// Settings for accounts `1..=count`, with overrides applied.
    pub fn account_settings(&self) -> Vec<(AccountId, AccountSettings)> {
        let accounts = &self.accounts;
        (1..=accounts.count)
            .map(|n| {
                let over = accounts.overrides.iter().find(|o| o.id == n);
                let settings = AccountSettings {
                    goal_hours: over
                        .and_then(|o| o.goal_hours)
                        .unwrap_or(accounts.goal_hours),
                    interval_minutes: over
                        .and_then(|o| o.interval_minutes)
                        .unwrap_or(accounts.interval_minutes),
                    rest_minutes: over
                        .and_then(|o| o.rest_minutes)
                        .unwrap_or(accounts.rest_minutes),
                };
                (AccountId(n), settings)
            })
            .collect()
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

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.accounts.count, 6);
        assert_eq!(cfg.accounts.goal_hours, 8);
        assert_eq!(cfg.accounts.interval_minutes, 25);
        assert_eq!(cfg.accounts.rest_minutes, 5);
        assert_eq!(cfg.scheduler.tick_ms, 1000);
        assert_eq!(cfg.notifications.volume, 50);
        assert!(cfg.notifications.enabled);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let cfg: Config = toml::from_str("[accounts]\ncount = 2\n").unwrap();
        assert_eq!(cfg.accounts.count, 2);
        assert_eq!(cfg.accounts.rest_minutes, 5);
        assert_eq!(cfg.notifications.volume, 50);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("accounts.count").as_deref(), Some("6"));
        assert_eq!(cfg.get("notifications.enabled").as_deref(), Some("true"));
        assert!(cfg.get("accounts.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_number_and_bool() {
        let mut cfg = Config::default();
        cfg.set("accounts.interval_minutes", "50").unwrap();
        cfg.set("notifications.vibration", "false").unwrap();
        assert_eq!(cfg.accounts.interval_minutes, 50);
        assert!(!cfg.notifications.vibration);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        let result = cfg.set("accounts.nonexistent_key", "1");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_negative_and_non_numeric() {
        let mut cfg = Config::default();
        assert!(cfg.set("accounts.goal_hours", "-1").is_err());
        assert!(cfg.set("accounts.goal_hours", "lots").is_err());
        assert_eq!(cfg.accounts.goal_hours, 8);
    }

    #[test]
    fn set_rejects_out_of_range_volume() {
        let mut cfg = Config::default();
        assert!(cfg.set("notifications.volume", "150").is_err());
        assert_eq!(cfg.notifications.volume, 50);
    }

    #[test]
    fn overrides_apply_per_account() {
        let mut cfg = Config::default();
        cfg.accounts.count = 3;
        cfg.accounts.overrides.push(AccountOverride {
            id: 2,
            goal_hours: Some(1),
            interval_minutes: None,
            rest_minutes: Some(10),
        });
        let settings = cfg.account_settings();
        assert_eq!(settings.len(), 3);
        assert_eq!(settings[0].1, AccountSettings::default());
        assert_eq!(
            settings[1].1,
            AccountSettings {
                goal_hours: 1,
                interval_minutes: 25,
                rest_minutes: 10,
            }
        );
    }

    #[test]
    fn save_and_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.accounts.count = 2;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[accounts]\ncount = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
