//! Message burst detection

use super::{BaseRule, CheckOutcome, Rule, RuleState};
use crate::automod::{AutomodMessage, ChannelContext, MemberContext, RuleResult};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

/// Key of one spam window: guild, channel, user
type WindowKey = (u64, u64, u64);

/// Sliding windows of recent messages, one per guild, channel and user.
///
/// Each window holds `(sent at, message id)` pairs ordered by send time.
#[derive(Debug, Clone, Default)]
pub struct SpamTracker {
    windows: Arc<DashMap<WindowKey, VecDeque<(DateTime<Utc>, u64)>>>,
}

impl SpamTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record message `message_id` sent at `at` and return how many messages
    /// of this author landed in the channel within `window` up to and
    /// including it.
    ///
    /// A message is only counted once; seeing it again (an edit) records nothing.
    pub fn record(
        &self,
        key: WindowKey,
        message_id: u64,
        at: DateTime<Utc>,
        window: Duration,
    ) -> usize {
        let mut times = self.windows.entry(key).or_default();
        if !times.iter().any(|(_, id)| *id == message_id) {
            let position = times.partition_point(|(t, _)| *t <= at);
            times.insert(position, (at, message_id));
        }

        if let Some(&(newest, _)) = times.back() {
            let cutoff = newest - window;
            while times.front().is_some_and(|(t, _)| *t <= cutoff) {
                times.pop_front();
            }
        }

        let start = at - window;
        times
            .iter()
            .filter(|(t, _)| *t > start && *t <= at)
            .count()
    }

    /// Drop windows with no message newer than `max_age`. Returns how many were removed.
    pub fn prune_idle(&self, now: DateTime<Utc>, max_age: Duration) -> usize {
        let before = self.windows.len();
        let cutoff = now - max_age;
        self.windows
            .retain(|_, times| times.back().is_some_and(|(last, _)| *last > cutoff));
        before.saturating_sub(self.windows.len())
    }

    /// Number of tracked windows
    #[must_use]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Triggers when an author sends more than `num_messages` messages to one
/// channel within `within_seconds`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpamRule {
    #[serde(flatten)]
    pub base: BaseRule,
    pub num_messages: u32,
    pub within_seconds: u32,
}

impl Default for SpamRule {
    fn default() -> Self {
        Self {
            base: BaseRule::default(),
            num_messages: 5,
            within_seconds: 5,
        }
    }
}

impl Rule for SpamRule {
    fn name(&self) -> &'static str {
        "spam"
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
        channel: &ChannelContext,
        state: &RuleState,
    ) -> RuleResult<CheckOutcome> {
        if self.num_messages == 0 || self.within_seconds == 0 {
            return Ok(CheckOutcome::clean());
        }

        let window = Duration::seconds(i64::from(self.within_seconds));
        let count = state.spam.record(
            (channel.guild_id, channel.id, message.author.id),
            message.id,
            message.timestamp,
            window,
        );

        if count > self.num_messages as usize {
            return Ok(self.base.violation(format!(
                "Sent more than {} messages in {} seconds",
                self.num_messages, self.within_seconds
            )));
        }

        Ok(CheckOutcome::clean())
    }

    fn mute_duration(&self) -> u32 {
        self.base.mute_duration
    }
}
