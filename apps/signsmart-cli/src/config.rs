//! CLI configuration
//!
//! Settings come from a TOML file (`signsmart.toml` in the working directory
//! unless `--config` names another), then environment overrides.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use signsmart_core::ReminderSchedule;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "signsmart.toml";

pub const ENV_DATA_DIR: &str = "SIGNSMART_DATA_DIR";
pub const ENV_BASE_URL: &str = "SIGNSMART_BASE_URL";

fn default_data_dir() -> PathBuf {
    PathBuf::from(".signsmart")
}

fn default_base_url() -> String {
    "http://localhost:3000/".to_string()
}

fn default_text_generation() -> String {
    "template".to_string()
}

fn default_notifier() -> String {
    "log".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the document and contact blobs
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// App URL that signing links point at
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Refuse to open the wizard for a signer whose turn has not come
    #[serde(default)]
    pub enforce_sequential_order: bool,
    /// `template` or `disabled`
    #[serde(default = "default_text_generation")]
    pub text_generation: String,
    /// Completion notices: `log`, `outbox` or `none`
    #[serde(default = "default_notifier")]
    pub notifier: String,
    #[serde(default)]
    pub reminders: ReminderSchedule,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            base_url: default_base_url(),
            enforce_sequential_order: false,
            text_generation: default_text_generation(),
            notifier: default_notifier(),
            reminders: ReminderSchedule::default(),
        }
    }
}

impl Config {
    /// Resolve configuration for this run. An explicit path must exist; the
    /// default file is optional.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };
        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    /// Apply environment overrides through `lookup`
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.notifier, "log");
        assert_eq!(config.reminders.offsets_hours, vec![24, 48, 72]);
        assert_eq!(config.reminders.escalate_after_days, 4);
    }

    #[test]
    fn test_full_file() {
        let config = Config::from_toml(
            r#"
            data_dir = "/var/lib/signsmart"
            base_url = "https://sign.example.com/app"
            enforce_sequential_order = true
            text_generation = "disabled"
            notifier = "outbox"

            [reminders]
            offsets_hours = [12, 36]
            expire_after_days = 14
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/signsmart"));
        assert_eq!(config.base_url, "https://sign.example.com/app");
        assert!(config.enforce_sequential_order);
        assert_eq!(config.text_generation, "disabled");
        assert_eq!(config.notifier, "outbox");
        assert_eq!(config.reminders.offsets_hours, vec![12, 36]);
        assert_eq!(config.reminders.escalate_after_days, 4);
        assert_eq!(config.reminders.expire_after_days, Some(14));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(Config::from_toml("data_dir = [").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default().with_env(|key| match key {
            ENV_DATA_DIR => Some("/tmp/docs".to_string()),
            ENV_BASE_URL => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.data_dir, PathBuf::from("/tmp/docs"));
        assert_eq!(config.base_url, default_base_url());
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.toml");
        assert!(Config::load(Some(&missing)).is_err());

        let present = tmp.path().join("signsmart.toml");
        std::fs::write(&present, "base_url = \"https://x.test/\"").unwrap();
        assert_eq!(Config::from_file(&present).unwrap().base_url, "https://x.test/");
    }
}
