//! Per-guild automod configuration

use crate::automod::rules::{
    InviteRule, LinksRule, MentionRule, Rule, SitesRule, SpamRule, WordsRule,
};
use serde::{Deserialize, Serialize};

/// How a guild mutes members
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MuteMechanism {
    /// Muting is not set up; mutes are skipped
    #[default]
    None,
    /// Assign a mute role, removed again after the mute duration
    Role { role_id: u64 },
    /// Discord communication timeout
    Timeout,
}

/// Automod configuration of one guild
///
/// Loaded snapshots are shared behind an `Arc` and never mutated; an edit
/// produces a new snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildAutomodConfig {
    pub guild_id: u64,
    pub enabled: bool,
    pub mute: MuteMechanism,
    pub spam: SpamRule,
    pub invite: InviteRule,
    pub mention: MentionRule,
    pub links: LinksRule,
    pub words: WordsRule,
    pub sites: SitesRule,
}

impl GuildAutomodConfig {
    /// Config used for guilds that have never configured automod
    #[must_use]
    pub fn disabled(guild_id: u64) -> Self {
        Self {
            guild_id,
            ..Default::default()
        }
    }

    /// Pre-compile the pattern-bearing rules so checks never do it per message
    pub fn compile(&mut self) {
        self.words.compile();
        self.sites.compile();
    }

    /// The rules in evaluation order.
    ///
    /// The order decides which rule wins when two reach the same severity.
    #[must_use]
    pub fn rules(&self) -> [&dyn Rule; 6] {
        [
            &self.spam,
            &self.invite,
            &self.mention,
            &self.links,
            &self.words,
            &self.sites,
        ]
    }

    /// Names of the rules that are switched on
    #[must_use]
    pub fn active_rules(&self) -> Vec<&'static str> {
        let enabled = [
            self.spam.base.enabled,
            self.invite.base.enabled,
            self.mention.base.enabled,
            self.links.base.enabled,
            self.words.base.enabled,
            self.sites.base.enabled,
        ];
        self.rules()
            .iter()
            .zip(enabled)
            .filter_map(|(rule, on)| on.then(|| rule.name()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automod::Severity;

    const SAMPLE: &str = r"
guild_id: 42
enabled: true
mute:
  kind: role
  role_id: 555
spam:
  enabled: true
  punishment: Mute
  mute_duration: 15
  num_messages: 4
  within_seconds: 3
words:
  enabled: true
  punishment: Kick
  banned_words: [spamword]
  ignore_channels: [7]
";

    #[test]
    fn test_rule_order() {
        let config = GuildAutomodConfig::default();
        let names: Vec<_> = config.rules().iter().map(|r| r.name()).collect();
        assert_eq!(names, ["spam", "invite", "mention", "links", "words", "sites"]);
    }

    #[test]
    fn test_disabled_default() {
        let config = GuildAutomodConfig::disabled(9);
        assert_eq!(config.guild_id, 9);
        assert!(!config.enabled);
        assert!(config.active_rules().is_empty());
        assert_eq!(config.mute, MuteMechanism::None);
    }

    #[test]
    fn test_config_deserialization() {
        let config: GuildAutomodConfig =
            serde_yaml::from_str(SAMPLE).expect("Failed to deserialize");
        assert_eq!(config.guild_id, 42);
        assert!(config.enabled);
        assert_eq!(config.mute, MuteMechanism::Role { role_id: 555 });
        assert_eq!(config.spam.num_messages, 4);
        assert_eq!(config.spam.base.punishment, Severity::Mute);
        assert_eq!(config.spam.base.mute_duration, 15);
        assert_eq!(config.words.banned_words, vec!["spamword".to_string()]);
        assert_eq!(config.words.base.ignore_channels, vec![7]);
        // Untouched rules keep their defaults
        assert!(!config.invite.base.enabled);
        assert_eq!(config.mention.threshold, 5);
        assert_eq!(config.active_rules(), vec!["spam", "words"]);
    }

    #[test]
    fn test_config_serialization() {
        let config: GuildAutomodConfig =
            serde_yaml::from_str(SAMPLE).expect("Failed to deserialize");
        let serialized = serde_yaml::to_string(&config).expect("Failed to serialize");
        assert!(serialized.contains("guild_id: 42"));
        assert!(serialized.contains("kind: role"));
        assert!(serialized.contains("num_messages: 4"));
        assert!(!serialized.contains("lexicon"));
    }
}
