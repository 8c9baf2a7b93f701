//! Turns one message and one guild config into one decision

use crate::AUTOMOD_TARGET;
use crate::automod::rules::{Rule, RuleState};
use crate::automod::{AutomodMessage, ChannelContext, GuildAutomodConfig, MemberContext, Severity};
use tracing::warn;

/// What to do about a message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decision {
    /// Set when any rule was violated
    pub should_delete: bool,
    /// Highest severity among violated rules
    pub highest_severity: Severity,
    /// Mute duration (minutes) of the first rule that reached `highest_severity`
    pub mute_duration: u32,
    /// Reasons of every violated rule, one per line
    pub reason: String,
}

/// Outcome of evaluating a rule set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Whether at least one rule actually ran its check
    pub did_check: bool,
    pub decision: Decision,
}

/// Evaluate a guild's rules in their fixed order
#[must_use]
pub fn evaluate(
    config: &GuildAutomodConfig,
    message: &AutomodMessage,
    channel: &ChannelContext,
    member: &MemberContext,
    state: &RuleState,
) -> Evaluation {
    evaluate_rules(&config.rules(), message, channel, member, state)
}

/// Evaluate `rules` in order.
///
/// Severity only escalates when a later rule is strictly more severe, so the
/// first rule to reach a severity keeps its mute duration. A rule whose check
/// fails is skipped.
#[must_use]
pub fn evaluate_rules(
    rules: &[&dyn Rule],
    message: &AutomodMessage,
    channel: &ChannelContext,
    member: &MemberContext,
    state: &RuleState,
) -> Evaluation {
    let mut evaluation = Evaluation::default();
    let decision = &mut evaluation.decision;

    for rule in rules {
        if rule.should_ignore(channel, message, member) {
            continue;
        }
        evaluation.did_check = true;

        let outcome = match rule.check(message, channel, state) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    target: AUTOMOD_TARGET,
                    guild_id = channel.guild_id,
                    channel_id = channel.id,
                    rule = rule.name(),
                    error = %e,
                    "Failed checking automod rule"
                );
                continue;
            }
        };

        if !outcome.violated {
            continue;
        }

        decision.should_delete = true;
        decision.reason.push_str(&outcome.reason);
        decision.reason.push('\n');

        if outcome.severity > decision.highest_severity {
            decision.highest_severity = outcome.severity;
            decision.mute_duration = rule.mute_duration();
        }
    }

    if decision.reason.ends_with('\n') {
        decision.reason.pop();
    }

    evaluation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automod::rules::{
        BaseRule, CheckOutcome, InviteRule, LinksRule, MentionRule, SitesRule, WordsRule,
    };
    use crate::automod::{MessageAuthor, RuleError, RuleResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn message(content: &str) -> AutomodMessage {
        AutomodMessage {
            id: 100,
            guild_id: Some(1),
            channel_id: 2,
            author: MessageAuthor { id: 3, bot: false },
            content: content.to_string(),
            ..Default::default()
        }
    }

    fn channel() -> ChannelContext {
        ChannelContext {
            id: 2,
            guild_id: 1,
            parent_id: None,
        }
    }

    fn enabled_config() -> GuildAutomodConfig {
        GuildAutomodConfig {
            guild_id: 1,
            enabled: true,
            ..Default::default()
        }
    }

    /// Rule that always fails its check and counts how often it ran
    #[derive(Default)]
    struct BrokenRule {
        checks: AtomicUsize,
    }

    impl Rule for BrokenRule {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn should_ignore(&self, _: &ChannelContext, _: &AutomodMessage, _: &MemberContext) -> bool {
            false
        }

        fn check(
            &self,
            _: &AutomodMessage,
            _: &ChannelContext,
            _: &RuleState,
        ) -> RuleResult<CheckOutcome> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            Err(RuleError::Other("boom".to_string()))
        }

        fn mute_duration(&self) -> u32 {
            0
        }
    }

    #[test]
    fn test_all_rules_ignored() {
        let evaluation = evaluate(
            &enabled_config(),
            &message("discord.gg/abc https://x.io"),
            &channel(),
            &MemberContext::default(),
            &RuleState::default(),
        );
        assert!(!evaluation.did_check);
        assert!(!evaluation.decision.should_delete);
    }

    #[test]
    fn test_checked_without_violation() {
        let mut config = enabled_config();
        config.words = WordsRule::new(BaseRule::enabled(Severity::Kick), ["spamword"]);

        let evaluation = evaluate(
            &config,
            &message("clean message"),
            &channel(),
            &MemberContext::default(),
            &RuleState::default(),
        );
        assert!(evaluation.did_check);
        assert_eq!(evaluation.decision, Decision::default());
    }

    #[test]
    fn test_equal_severity_keeps_first_mute_duration() {
        let mut config = enabled_config();
        config.invite = InviteRule {
            base: BaseRule::enabled(Severity::Mute).with_mute_duration(10),
        };
        config.links = LinksRule {
            base: BaseRule::enabled(Severity::Mute).with_mute_duration(30),
        };

        let evaluation = evaluate(
            &config,
            &message("https://discord.gg/abc"),
            &channel(),
            &MemberContext::default(),
            &RuleState::default(),
        );
        let decision = evaluation.decision;
        assert!(decision.should_delete);
        assert_eq!(decision.highest_severity, Severity::Mute);
        assert_eq!(decision.mute_duration, 10);
        assert_eq!(decision.reason, "Sent a server invite\nSent a link");
    }

    #[test]
    fn test_higher_severity_wins_regardless_of_order() {
        for (invite, links) in [(Severity::Mute, Severity::Ban), (Severity::Ban, Severity::Mute)] {
            let mut config = enabled_config();
            config.invite = InviteRule {
                base: BaseRule::enabled(invite).with_mute_duration(10),
            };
            config.links = LinksRule {
                base: BaseRule::enabled(links).with_mute_duration(30),
            };

            let evaluation = evaluate(
                &config,
                &message("https://discord.gg/abc"),
                &channel(),
                &MemberContext::default(),
                &RuleState::default(),
            );
            assert_eq!(evaluation.decision.highest_severity, Severity::Ban);
        }
    }

    #[test]
    fn test_warn_violation_still_deletes() {
        let mut config = enabled_config();
        config.mention = MentionRule {
            base: BaseRule::enabled(Severity::None),
            threshold: 2,
        };
        let mut flood = message("hey all");
        flood.mentions = vec![5, 6, 7];

        let decision = evaluate(
            &config,
            &flood,
            &channel(),
            &MemberContext::default(),
            &RuleState::default(),
        )
        .decision;
        assert!(decision.should_delete);
        assert_eq!(decision.highest_severity, Severity::None);
        assert_eq!(decision.mute_duration, 0);
    }

    #[test]
    fn test_failing_rule_does_not_stop_evaluation() {
        let broken = BrokenRule::default();
        let words = WordsRule::new(BaseRule::enabled(Severity::Kick), ["spamword"]);
        let sites = SitesRule::new(BaseRule::enabled(Severity::Ban), ["bad.example"]);

        let evaluation = evaluate_rules(
            &[&broken, &words, &sites],
            &message("spamword at bad.example"),
            &channel(),
            &MemberContext::default(),
            &RuleState::default(),
        );

        assert_eq!(broken.checks.load(Ordering::SeqCst), 1);
        assert!(evaluation.did_check);
        let decision = evaluation.decision;
        assert!(decision.should_delete);
        assert_eq!(decision.highest_severity, Severity::Ban);
        assert_eq!(
            decision.reason,
            "Sent a banned word: `spamword`\nSent a link to a banned website: `bad.example`"
        );
    }

    #[test]
    fn test_only_failing_rule_reports_checked_clean() {
        let broken = BrokenRule::default();
        let evaluation = evaluate_rules(
            &[&broken],
            &message("anything"),
            &channel(),
            &MemberContext::default(),
            &RuleState::default(),
        );
        assert!(evaluation.did_check);
        assert!(!evaluation.decision.should_delete);
    }
}
