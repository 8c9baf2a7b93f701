//! Automod rules
//!
//! Each policy category is one rule type. Every rule answers two questions for
//! a message: whether it applies at all (`should_ignore`, cheap) and whether
//! the message violates it (`check`). Rules are immutable once loaded into a
//! config snapshot; the only mutable state they touch lives in [`RuleState`].

mod base;
mod invite;
mod links;
mod mention;
mod sites;
mod spam;
mod words;

use crate::automod::{
    AutomodMessage, ChannelContext, MemberContext, RuleResult, Severity,
};
use std::sync::Arc;

pub use base::BaseRule;
pub use invite::InviteRule;
pub use links::{LinksRule, extract_hosts};
pub use mention::MentionRule;
pub use sites::{FlaggedHosts, SiteReputation, SitesRule};
pub use spam::{SpamRule, SpamTracker};
pub use words::WordsRule;

#[cfg(test)]
pub use sites::MockSiteReputation;

/// Result of checking one rule against one message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Whether the message violated the rule and must be deleted
    pub violated: bool,
    pub severity: Severity,
    pub reason: String,
}

impl CheckOutcome {
    /// No violation
    #[must_use]
    pub fn clean() -> Self {
        Self::default()
    }

    /// A violation punished with `severity`
    pub fn violation(severity: Severity, reason: impl Into<String>) -> Self {
        Self {
            violated: true,
            severity,
            reason: reason.into(),
        }
    }
}

/// Shared state rules may consult while checking.
///
/// Everything in here is internally synchronized and may be used by any
/// number of concurrent evaluations.
#[derive(Clone)]
pub struct RuleState {
    /// Per guild, channel and user message windows for the spam rule
    pub spam: SpamTracker,
    /// Cached site reputation used by the sites rule
    pub reputation: Arc<dyn SiteReputation>,
}

impl Default for RuleState {
    fn default() -> Self {
        Self {
            spam: SpamTracker::new(),
            reputation: Arc::new(FlaggedHosts::new()),
        }
    }
}

impl std::fmt::Debug for RuleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleState")
            .field("spam", &self.spam)
            .finish_non_exhaustive()
    }
}

/// One automod policy category
pub trait Rule: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Cheap pre-filter. A `true` result means this rule has nothing to say
    /// about the message and its check is not run.
    fn should_ignore(
        &self,
        channel: &ChannelContext,
        message: &AutomodMessage,
        member: &MemberContext,
    ) -> bool;

    /// Check the message against the rule
    ///
    /// # Errors
    /// Returns a `RuleError` if the rule could not reach a verdict. The
    /// evaluation skips the rule and carries on with the others.
    fn check(
        &self,
        message: &AutomodMessage,
        channel: &ChannelContext,
        state: &RuleState,
    ) -> RuleResult<CheckOutcome>;

    /// Mute duration in minutes, used when this rule decides a `Mute`
    fn mute_duration(&self) -> u32;
}
