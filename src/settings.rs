//! Process-wide automod settings

use crate::CONSOLE_TARGET;
use crate::automod::{DEFAULT_CAPACITY, DEFAULT_TTL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::time::Duration;
use tracing::{info, warn};

/// Settings file read at startup
pub const SETTINGS_FILE: &str = "config/automod.yaml";

pub const ENV_CONFIG_DIR: &str = "AUTOMOD_CONFIG_DIR";
pub const ENV_CACHE_TTL_SECS: &str = "AUTOMOD_CACHE_TTL_SECS";
pub const ENV_CACHE_CAPACITY: &str = "AUTOMOD_CACHE_CAPACITY";
pub const ENV_ENABLED: &str = "AUTOMOD_ENABLED";

/// Automod settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomodSettings {
    /// Global switch for the whole feature
    pub enabled: bool,
    /// Directory holding one `<guild_id>.yaml` per guild
    pub config_dir: PathBuf,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    /// How often expired configs and idle spam windows are reclaimed
    pub reap_interval_secs: u64,
    /// Buffer size of the invalidation channel
    pub invalidation_buffer: usize,
}

impl Default for AutomodSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            config_dir: PathBuf::from("data/automod"),
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
            cache_capacity: DEFAULT_CAPACITY,
            reap_interval_secs: 60,
            invalidation_buffer: 100,
        }
    }
}

impl AutomodSettings {
    /// Load settings from [`SETTINGS_FILE`] and the environment
    ///
    /// # Errors
    /// Returns an error if the settings file exists but cannot be read or parsed.
    pub async fn load() -> Result<Self, crate::Error> {
        let mut settings = Self::from_file(SETTINGS_FILE).await?;
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Read settings from a YAML file, falling back to defaults if it doesn't exist
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let settings = serde_yaml::from_str(&content)?;
                info!(target: CONSOLE_TARGET, "Loaded automod settings from {}", path.display());
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Override fields from environment-style variables. Unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_CONFIG_DIR) {
            self.config_dir = PathBuf::from(dir);
        }
        if let Some(ttl) = parse_override(&lookup, ENV_CACHE_TTL_SECS) {
            self.cache_ttl_secs = ttl;
        }
        if let Some(capacity) = parse_override(&lookup, ENV_CACHE_CAPACITY) {
            self.cache_capacity = capacity;
        }
        if let Some(enabled) = parse_override(&lookup, ENV_ENABLED) {
            self.enabled = enabled;
        }
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    #[must_use]
    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs.max(1))
    }
}

fn parse_override<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(target: CONSOLE_TARGET, "Ignoring invalid value {raw:?} for {key}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = AutomodSettings::default();
        assert!(settings.enabled);
        assert_eq!(settings.cache_ttl(), Duration::from_secs(300));
        assert_eq!(settings.cache_capacity, 1000);
        assert_eq!(settings.reap_interval(), Duration::from_secs(60));
        assert_eq!(settings.config_dir, PathBuf::from("data/automod"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings: AutomodSettings =
            serde_yaml::from_str("cache_ttl_secs: 30\nenabled: false\n")
                .expect("Failed to deserialize");
        assert_eq!(settings.cache_ttl_secs, 30);
        assert!(!settings.enabled);
        assert_eq!(settings.cache_capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_CONFIG_DIR, "/srv/automod"),
            (ENV_CACHE_TTL_SECS, "120"),
            (ENV_CACHE_CAPACITY, "lots"),
            (ENV_ENABLED, "false"),
        ]);
        let mut settings = AutomodSettings::default();
        settings.apply_overrides(|key| env.get(key).map(ToString::to_string));

        assert_eq!(settings.config_dir, PathBuf::from("/srv/automod"));
        assert_eq!(settings.cache_ttl_secs, 120);
        // Invalid value leaves the default
        assert_eq!(settings.cache_capacity, DEFAULT_CAPACITY);
        assert!(!settings.enabled);
    }

    #[tokio::test]
    async fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = AutomodSettings::from_file(dir.path().join("automod.yaml"))
            .await
            .unwrap();
        assert_eq!(missing, AutomodSettings::default());

        let path = dir.path().join("automod.yaml");
        tokio::fs::write(&path, "cache_capacity: 10\nreap_interval_secs: 5\n")
            .await
            .unwrap();
        let settings = AutomodSettings::from_file(&path).await.unwrap();
        assert_eq!(settings.cache_capacity, 10);
        assert_eq!(settings.reap_interval(), Duration::from_secs(5));

        tokio::fs::write(&path, "cache_capacity: [").await.unwrap();
        assert!(AutomodSettings::from_file(&path).await.is_err());
    }
}
