//! Configuration store
//!
//! The engine only reads configuration; documents are written by whatever
//! administers the bot.

use crate::automod::{AutomodError, AutomodResult, GuildAutomodConfig};
use async_trait::async_trait;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Source of guild automod configs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the config of a guild. `Ok(None)` means the guild has none.
    ///
    /// # Errors
    /// Returns an `AutomodError` if the store cannot be read.
    async fn load_config(&self, guild_id: u64) -> AutomodResult<Option<GuildAutomodConfig>>;
}

/// Store reading one YAML document per guild from a directory,
/// named `<guild_id>.yaml`
#[derive(Debug, Clone)]
pub struct YamlConfigStore {
    dir: PathBuf,
}

impl YamlConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, guild_id: u64) -> PathBuf {
        self.dir.join(format!("{guild_id}.yaml"))
    }

    /// Guild IDs that have a stored config
    ///
    /// # Errors
    /// Returns an error if the directory path cannot be turned into a pattern.
    pub fn known_guilds(&self) -> AutomodResult<Vec<u64>> {
        let pattern = self.dir.join("*.yaml");
        let mut guilds = Vec::new();

        for entry in glob::glob(&pattern.to_string_lossy())? {
            match entry {
                Ok(path) => {
                    if let Some(guild_id) = path
                        .file_stem()
                        .and_then(|stem| stem.to_str())
                        .and_then(|stem| stem.parse::<u64>().ok())
                    {
                        guilds.push(guild_id);
                    }
                }
                Err(e) => warn!("Skipping unreadable config entry: {e}"),
            }
        }

        guilds.sort_unstable();
        Ok(guilds)
    }
}

#[async_trait]
impl ConfigStore for YamlConfigStore {
    async fn load_config(&self, guild_id: u64) -> AutomodResult<Option<GuildAutomodConfig>> {
        let path = self.path_for(guild_id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(guild_id, "No automod config stored");
                return Ok(None);
            }
            Err(source) => return Err(AutomodError::Io { guild_id, source }),
        };

        let mut config: GuildAutomodConfig = serde_yaml::from_str(&content)
            .map_err(|source| AutomodError::Parse { guild_id, source })?;
        config.guild_id = guild_id;
        Ok(Some(config))
    }
}

/// In-memory store, for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    configs: DashMap<u64, GuildAutomodConfig>,
}

impl MemoryConfigStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the config of `config.guild_id`
    pub fn insert(&self, config: GuildAutomodConfig) {
        self.configs.insert(config.guild_id, config);
    }

    pub fn remove(&self, guild_id: u64) -> Option<GuildAutomodConfig> {
        self.configs.remove(&guild_id).map(|(_, config)| config)
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load_config(&self, guild_id: u64) -> AutomodResult<Option<GuildAutomodConfig>> {
        Ok(self.configs.get(&guild_id).map(|entry| entry.value().clone()))
    }
}
