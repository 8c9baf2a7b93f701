//! Settings shared by every rule type

use super::CheckOutcome;
use crate::automod::{AutomodMessage, ChannelContext, MemberContext, Severity};
use serde::{Deserialize, Serialize};

/// Default mute duration in minutes
pub const DEFAULT_MUTE_DURATION: u32 = 10;

/// Common rule settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseRule {
    pub enabled: bool,
    /// Punishment applied when the rule triggers
    pub punishment: Severity,
    /// Mute duration in minutes when `punishment` is `Mute`
    pub mute_duration: u32,
    /// Members with this role are exempt
    pub ignore_role: Option<u64>,
    /// Channels (or categories / thread parents) the rule does not apply to
    pub ignore_channels: Vec<u64>,
}

impl Default for BaseRule {
    fn default() -> Self {
        Self {
            enabled: false,
            punishment: Severity::None,
            mute_duration: DEFAULT_MUTE_DURATION,
            ignore_role: None,
            ignore_channels: Vec::new(),
        }
    }
}

impl BaseRule {
    /// An enabled rule with the given punishment
    #[must_use]
    pub fn enabled(punishment: Severity) -> Self {
        Self {
            enabled: true,
            punishment,
            ..Default::default()
        }
    }

    /// Builder-style mute duration
    #[must_use]
    pub fn with_mute_duration(mut self, minutes: u32) -> Self {
        self.mute_duration = minutes;
        self
    }

    /// Disabled, exempt member, or exempt channel
    #[must_use]
    pub fn should_ignore(
        &self,
        channel: &ChannelContext,
        _message: &AutomodMessage,
        member: &MemberContext,
    ) -> bool {
        if !self.enabled {
            return true;
        }

        if self.ignore_role.is_some_and(|role| member.has_role(role)) {
            return true;
        }

        self.ignore_channels.contains(&channel.id)
            || channel
                .parent_id
                .is_some_and(|parent| self.ignore_channels.contains(&parent))
    }

    /// A violation carrying this rule's punishment
    pub fn violation(&self, reason: impl Into<String>) -> CheckOutcome {
        CheckOutcome::violation(self.punishment, reason)
    }
}
