//! Mass mentions

use super::{BaseRule, CheckOutcome, Rule, RuleState};
use crate::automod::{AutomodMessage, ChannelContext, MemberContext, RuleResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Triggers when a message mentions `threshold` or more distinct users.
/// A threshold of 0 never triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MentionRule {
    #[serde(flatten)]
    pub base: BaseRule,
    #[serde(alias = "treshold")]
    pub threshold: u32,
}

impl Default for MentionRule {
    fn default() -> Self {
        Self {
            base: BaseRule::default(),
            threshold: 5,
        }
    }
}

impl Rule for MentionRule {
    fn name(&self) -> &'static str {
        "mention"
    }

    fn should_ignore(
        &self,
        channel: &ChannelContext,
        message: &AutomodMessage,
        member: &MemberContext,
    ) -> bool {
        self.base.should_ignore(channel, message, member)
    }

    fn check(
        &self,
        message: &AutomodMessage,
        _channel: &ChannelContext,
        _state: &RuleState,
    ) -> RuleResult<CheckOutcome> {
        if self.threshold == 0 {
            return Ok(CheckOutcome::clean());
        }

        let distinct = message.mentions.iter().collect::<HashSet<_>>().len();
        if distinct >= self.threshold as usize {
            return Ok(self.base.violation(format!(
                "Sent a message mentioning {distinct} users (limit {})",
                self.threshold
            )));
        }

        Ok(CheckOutcome::clean())
    }

    fn mute_duration(&self) -> u32 {
        self.base.mute_duration
    }
}
