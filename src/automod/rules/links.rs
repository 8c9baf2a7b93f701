//! Links of any kind

use super::{BaseRule, CheckOutcome, Rule, RuleState};
use crate::automod::{AutomodMessage, ChannelContext, MemberContext, RuleResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:https?://|www\.)[^\s<>]+").expect("link pattern is valid")
});

// Hosts with or without a scheme, e.g. `https://a.example.com/x` or `example.org`
static HOST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:[a-z][a-z0-9+.-]*://)?((?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,63})\b")
        .expect("host pattern is valid")
});

/// Lowercased hosts of every link-like token in `content`, in order of appearance
#[must_use]
pub fn extract_hosts(content: &str) -> Vec<String> {
    HOST_PATTERN
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|host| host.as_str().to_lowercase())
        .collect()
}

/// Triggers on any message containing a link
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksRule {
    #[serde(flatten)]
    pub base: BaseRule,
}

impl Rule for LinksRule {
    fn name(&self) -> &'static str {
        "links"
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
        if LINK_PATTERN.is_match(&message.content) {
            return Ok(self.base.violation("Sent a link"));
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

    #[test]
    fn test_detects_links() {
        let rule = LinksRule {
            base: BaseRule::enabled(Severity::None),
        };
        let state = RuleState::default();
        let channel = ChannelContext::default();

        for content in ["look https://example.com", "www.example.org please", "HTTP://X.IO"] {
            let message = AutomodMessage {
                content: content.to_string(),
                ..Default::default()
            };
            assert!(
                rule.check(&message, &channel, &state).unwrap().violated,
                "{content} should be flagged"
            );
        }

        let message = AutomodMessage {
            content: "nothing to see here.".to_string(),
            ..Default::default()
        };
        assert!(!rule.check(&message, &channel, &state).unwrap().violated);
    }

    #[test]
    fn test_extract_hosts() {
        assert_eq!(
            extract_hosts("go to https://Sub.Example.com/path?q=1 or evil.net now"),
            vec!["sub.example.com".to_string(), "evil.net".to_string()]
        );
        assert!(extract_hosts("plain words only").is_empty());
    }
}
