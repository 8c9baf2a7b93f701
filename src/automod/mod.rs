//! Automoderation engine
//!
//! Checks every guild message against the guild's configured rules, decides
//! on one punishment and hands it to the punishment executor.

mod analytics;
mod cache;
mod config;
mod engine;
mod error;
mod evaluator;
mod message;
pub mod rules;
mod severity;
mod store;

pub use analytics::{ANALYTICS_CATEGORY, AnalyticsEvent, AnalyticsRecorder, AnalyticsSink};
pub use cache::{CacheRequest, ConfigCache, DEFAULT_CAPACITY, DEFAULT_TTL};
pub use config::{GuildAutomodConfig, MuteMechanism};
pub use engine::{Automod, Verdict};
pub use error::{AutomodError, AutomodResult, RuleError, RuleResult};
pub use evaluator::{Decision, Evaluation, evaluate, evaluate_rules};
pub use message::{
    AutomodMessage, ChannelContext, MemberContext, MessageAuthor, MessageKind, is_eligible,
};
pub use rules::{CheckOutcome, Rule, RuleState};
pub use severity::Severity;
pub use store::{ConfigStore, MemoryConfigStore, YamlConfigStore};

#[cfg(test)]
pub use store::MockConfigStore;
