//! Discord server invite links

use super::{BaseRule, CheckOutcome, Rule, RuleState};
use crate::automod::{AutomodMessage, ChannelContext, MemberContext, RuleResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static INVITE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:discord\.gg|discord(?:app)?\.com/invite)/[a-z0-9-]+")
        .expect("invite pattern is valid")
});

/// Triggers on messages containing a server invite
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InviteRule {
    #[serde(flatten)]
    pub base: BaseRule,
}

impl Rule for InviteRule {
    fn name(&self) -> &'static str {
        "invite"
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
        if INVITE_PATTERN.is_match(&message.content) {
            return Ok(self.base.violation("Sent a server invite"));
        }
        Ok(CheckOutcome::clean())
    }

    fn mute_duration(&self) -> u32 {
        self.base.mute_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automod::Severity;

    fn check(content: &str) -> CheckOutcome {
        let rule = InviteRule {
            base: BaseRule::enabled(Severity::Kick),
        };
        let message = AutomodMessage {
            content: content.to_string(),
            ..Default::default()
        };
        rule.check(&message, &ChannelContext::default(), &RuleState::default())
            .unwrap()
    }

    #[test]
    fn test_detects_invites() {
        assert!(check("join us at discord.gg/abc123").violated);
        assert!(check("https://discord.com/invite/Rust-Lang").violated);
        assert!(check("DISCORDAPP.COM/INVITE/xyz").violated);
        assert_eq!(check("discord.gg/abc").severity, Severity::Kick);
    }

    #[test]
    fn test_ignores_other_links() {
        assert!(!check("see https://discord.com/channels/1/2").violated);
        assert!(!check("no links here").violated);
    }
}
