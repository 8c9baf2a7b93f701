//! Banned words

use super::{BaseRule, CheckOutcome, Rule, RuleState};
use crate::automod::{AutomodMessage, ChannelContext, MemberContext, RuleResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Triggers when a message contains one of `banned_words` as a whole word,
/// case-insensitively.
///
/// The word list is compiled into a lexicon by [`WordsRule::compile`] once per
/// loaded config; `check` only consults the lexicon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordsRule {
    #[serde(flatten)]
    pub base: BaseRule,
    pub banned_words: Vec<String>,
    #[serde(skip)]
    lexicon: HashSet<String>,
}

impl WordsRule {
    /// A compiled rule banning `words`
    pub fn new<I, S>(base: BaseRule, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rule = Self {
            base,
            banned_words: words.into_iter().map(Into::into).collect(),
            lexicon: HashSet::new(),
        };
        rule.compile();
        rule
    }

    /// Build the lexicon from `banned_words`
    pub fn compile(&mut self) {
        self.lexicon = self
            .banned_words
            .iter()
            .map(|word| word.trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect();
    }

    fn find_banned<'a>(&self, content: &'a str) -> Option<&'a str> {
        content
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .find(|token| self.lexicon.contains(&token.to_lowercase()))
    }
}

impl Rule for WordsRule {
    fn name(&self) -> &'static str {
        "words"
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
        if let Some(word) = self.find_banned(&message.content) {
            return Ok(self
                .base
                .violation(format!("Sent a banned word: `{}`", word.to_lowercase())));
        }
        Ok(CheckOutcome::clean())
    }

    fn mute_duration(&self) -> u32 {
        self.base.mute_duration
    }
}
