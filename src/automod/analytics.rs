//! Usage counters for automod

use crate::ANALYTICS_TARGET;
use dashmap::DashMap;
use derive_more::Display;
use tracing::debug;

/// Category under which automod events are recorded
pub const ANALYTICS_CATEGORY: &str = "automod";

/// Countable automod events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum AnalyticsEvent {
    /// At least one rule ran on a message and none triggered
    #[display("checked")]
    Checked,
    /// A message violated at least one rule
    #[display("rule_triggered")]
    RuleTriggered,
}

/// Destination for analytics events. Recording must be cheap and must never fail.
pub trait AnalyticsSink: Send + Sync {
    fn record_unit(&self, guild_id: u64, event: AnalyticsEvent);
}

/// In-memory per-guild event counters
#[derive(Debug, Default)]
pub struct AnalyticsRecorder {
    counts: DashMap<(u64, AnalyticsEvent), u64>,
}

impl AnalyticsRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `event`s recorded for a guild
    #[must_use]
    pub fn count(&self, guild_id: u64, event: AnalyticsEvent) -> u64 {
        self.counts
            .get(&(guild_id, event))
            .map_or(0, |count| *count.value())
    }

    /// Number of `event`s recorded across all guilds
    #[must_use]
    pub fn total(&self, event: AnalyticsEvent) -> u64 {
        self.counts
            .iter()
            .filter(|entry| entry.key().1 == event)
            .map(|entry| *entry.value())
            .sum()
    }
}

impl AnalyticsSink for AnalyticsRecorder {
    fn record_unit(&self, guild_id: u64, event: AnalyticsEvent) {
        *self.counts.entry((guild_id, event)).or_insert(0) += 1;
        debug!(
            target: ANALYTICS_TARGET,
            guild_id,
            category = ANALYTICS_CATEGORY,
            event = %event,
            "Recorded analytics unit"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_guild_and_event() {
        let recorder = AnalyticsRecorder::new();
        recorder.record_unit(1, AnalyticsEvent::Checked);
        recorder.record_unit(1, AnalyticsEvent::Checked);
        recorder.record_unit(2, AnalyticsEvent::Checked);
        recorder.record_unit(1, AnalyticsEvent::RuleTriggered);

        assert_eq!(recorder.count(1, AnalyticsEvent::Checked), 2);
        assert_eq!(recorder.count(2, AnalyticsEvent::RuleTriggered), 0);
        assert_eq!(recorder.total(AnalyticsEvent::Checked), 3);
        assert_eq!(recorder.total(AnalyticsEvent::RuleTriggered), 1);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(AnalyticsEvent::Checked.to_string(), "checked");
        assert_eq!(AnalyticsEvent::RuleTriggered.to_string(), "rule_triggered");
    }
}
