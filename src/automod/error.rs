//! Error types for the automod engine
//!
//! Configuration loading, caching and rule evaluation each surface their own
//! error kinds so callers can decide what is fatal for a message and what is not.

use thiserror::Error;

/// Errors raised while loading or serving guild automod configuration
#[derive(Debug, Error)]
pub enum AutomodError {
    /// The configuration store could not be reached
    #[error("Config store unavailable: {0}")]
    StoreUnavailable(String),

    /// Reading a stored config document failed
    #[error("Failed to read automod config for guild {guild_id}: {source}")]
    Io {
        guild_id: u64,
        #[source]
        source: std::io::Error,
    },

    /// A stored config document is not valid YAML for the config schema
    #[error("Invalid automod config for guild {guild_id}: {source}")]
    Parse {
        guild_id: u64,
        #[source]
        source: serde_yaml::Error,
    },

    /// The store directory could not be enumerated
    #[error("Invalid config directory pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Generic error
    #[error("Automod error: {0}")]
    Other(String),
}

impl From<String> for AutomodError {
    fn from(message: String) -> Self {
        Self::Other(message)
    }
}

/// Result type for configuration operations
pub type AutomodResult<T> = Result<T, AutomodError>;

/// Errors raised by a single rule check. These never abort the evaluation of a message.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The site reputation lookup could not answer for a host
    #[error("Reputation lookup failed for {host}: {reason}")]
    Reputation { host: String, reason: String },

    /// Generic rule failure
    #[error("Rule check failed: {0}")]
    Other(String),
}

/// Result type for rule checks
pub type RuleResult<T> = Result<T, RuleError>;
