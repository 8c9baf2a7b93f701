//! The automod entry point used by the message pipeline

use crate::AUTOMOD_TARGET;
use crate::automod::rules::RuleState;
use crate::automod::{
    AnalyticsEvent, AnalyticsSink, AutomodMessage, CacheRequest, ChannelContext, ConfigCache,
    Decision, MemberContext, evaluate, is_eligible,
};
use crate::punishment::{PunishmentExecutor, PunishmentJob};
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info};

/// Minutes a spam window may sit idle before the maintenance pass drops it
const SPAM_WINDOW_IDLE_MINUTES: i64 = 10;

/// Result of running automod on a message
#[derive(Debug)]
pub enum Verdict {
    /// Automod did not look at the message
    Skipped,
    /// No rule was violated
    Clean,
    /// The message violated a rule; its punishment is running on its own task
    Violation {
        decision: Decision,
        punishment: JoinHandle<()>,
    },
}

impl Verdict {
    /// Whether the message was flagged. Flagged messages should not be
    /// processed any further, e.g. as commands.
    #[must_use]
    pub fn is_violation(&self) -> bool {
        matches!(self, Self::Violation { .. })
    }
}

/// Automod engine: config cache, rule state, punishment executor and analytics
pub struct Automod {
    enabled: bool,
    cache: Arc<ConfigCache>,
    state: RuleState,
    executor: PunishmentExecutor,
    analytics: Arc<dyn AnalyticsSink>,
}

impl std::fmt::Debug for Automod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Automod")
            .field("enabled", &self.enabled)
            .field("cache", &self.cache)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Automod {
    pub fn new(
        cache: Arc<ConfigCache>,
        state: RuleState,
        executor: PunishmentExecutor,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> Self {
        Self {
            enabled: true,
            cache,
            state,
            executor,
            analytics,
        }
    }

    /// Builder-style global switch. A disabled engine skips every message.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<ConfigCache> {
        &self.cache
    }

    #[must_use]
    pub fn state(&self) -> &RuleState {
        &self.state
    }

    /// Run automod on a message.
    ///
    /// `channel` is `None` when the channel could not be resolved, in which
    /// case the message is skipped. A violation hands the punishment to the
    /// executor and returns without waiting for it.
    pub async fn check_message(
        &self,
        message: &AutomodMessage,
        channel: Option<&ChannelContext>,
        member: &MemberContext,
        bot_user_id: u64,
    ) -> Verdict {
        if !self.enabled || !is_eligible(message, bot_user_id) {
            return Verdict::Skipped;
        }

        let Some(channel) = channel else {
            error!(
                target: AUTOMOD_TARGET,
                channel_id = message.channel_id,
                "Channel not found in state"
            );
            return Verdict::Skipped;
        };

        let config = match self.cache.get(channel.guild_id).await {
            Ok(config) => config,
            Err(e) => {
                error!(
                    target: AUTOMOD_TARGET,
                    guild_id = channel.guild_id,
                    error = %e,
                    "Failed retrieving automod config"
                );
                return Verdict::Skipped;
            }
        };

        if !config.enabled {
            return Verdict::Skipped;
        }

        let evaluation = evaluate(&config, message, channel, member, &self.state);

        if !evaluation.decision.should_delete {
            if evaluation.did_check {
                self.analytics
                    .record_unit(channel.guild_id, AnalyticsEvent::Checked);
            }
            return Verdict::Clean;
        }

        self.analytics
            .record_unit(channel.guild_id, AnalyticsEvent::RuleTriggered);

        let decision = evaluation.decision;
        info!(
            target: AUTOMOD_TARGET,
            guild_id = channel.guild_id,
            channel_id = channel.id,
            message_id = message.id,
            user_id = message.author.id,
            severity = %decision.highest_severity,
            event = "rule_triggered",
            "Automod rule triggered"
        );

        let job = PunishmentJob::new(
            channel.guild_id,
            channel.id,
            message.id,
            message.author.id,
            decision.clone(),
            config.mute.clone(),
        );
        let punishment = self.executor.dispatch(job);

        Verdict::Violation {
            decision,
            punishment,
        }
    }

    /// Spawn the background task serving cache invalidations and reclaiming
    /// expired configs and idle spam windows
    pub fn start_maintenance(
        &self,
        rx: Receiver<CacheRequest>,
        interval: Duration,
    ) -> JoinHandle<()> {
        let spam = self.state.spam.clone();
        Arc::clone(&self.cache).start_maintenance(rx, interval, move || {
            let pruned = spam.prune_idle(
                chrono::Utc::now(),
                chrono::Duration::minutes(SPAM_WINDOW_IDLE_MINUTES),
            );
            if pruned > 0 {
                debug!(target: AUTOMOD_TARGET, pruned, "Pruned idle spam windows");
            }
        })
    }
}
