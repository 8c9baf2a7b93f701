//! Error types for applying punishments

use crate::punishment::PunishmentStage;
use poise::serenity_prelude as serenity;
use ::serenity::http::HttpError;
use thiserror::Error;

/// Discord JSON error code for a request the bot lacks permissions for
pub const MISSING_PERMISSIONS_CODE: isize = 50013;
/// Discord JSON error code for a resource the bot cannot see
pub const MISSING_ACCESS_CODE: isize = 50001;

/// Errors raised by moderation actions
#[derive(Debug, Error)]
pub enum ActionError {
    /// The guild has no way of muting members configured
    #[error("No mute role or timeout configured")]
    NoMuteRole,

    /// The bot lacks the permission to act
    #[error("Missing permissions")]
    MissingPermissions,

    /// The bot cannot access the channel or member
    #[error("Missing access")]
    MissingAccess,

    /// Any other Discord API error
    #[error("Discord API error: {0}")]
    DiscordApi(Box<serenity::Error>),

    /// A punishment was moved through its stages out of order
    #[error("Invalid punishment stage transition from {from} to {to}")]
    InvalidStageTransition {
        from: PunishmentStage,
        to: PunishmentStage,
    },

    /// Generic error
    #[error("Action error: {0}")]
    Other(String),
}

impl ActionError {
    /// Expected failures that need no operator attention
    #[must_use]
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            Self::NoMuteRole | Self::MissingPermissions | Self::MissingAccess
        )
    }
}

impl From<serenity::Error> for ActionError {
    fn from(error: serenity::Error) -> Self {
        if let serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) = &error {
            match response.error.code {
                MISSING_PERMISSIONS_CODE => return Self::MissingPermissions,
                MISSING_ACCESS_CODE => return Self::MissingAccess,
                _ => {}
            }
        }
        Self::DiscordApi(Box::new(error))
    }
}

impl From<String> for ActionError {
    fn from(message: String) -> Self {
        Self::Other(message)
    }
}

/// Result type for moderation actions
pub type ActionResult<T> = Result<T, ActionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benign_errors() {
        assert!(ActionError::NoMuteRole.is_benign());
        assert!(ActionError::MissingPermissions.is_benign());
        assert!(ActionError::MissingAccess.is_benign());
        assert!(!ActionError::Other("rate limited".to_string()).is_benign());
        assert!(!ActionError::from(serenity::Error::Other("boom")).is_benign());
    }

    #[test]
    fn test_error_display() {
        let error = ActionError::InvalidStageTransition {
            from: PunishmentStage::Evaluated,
            to: PunishmentStage::Done,
        };
        assert_eq!(
            error.to_string(),
            "Invalid punishment stage transition from Evaluated to Done"
        );
        assert_eq!(
            ActionError::NoMuteRole.to_string(),
            "No mute role or timeout configured"
        );
    }
}
