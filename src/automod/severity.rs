//! Punishment severity used for escalation

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// How hard a violation is punished. Ordered so that `None < Mute < Kick < Ban`.
///
/// `None` on a triggered rule still counts as a violation: the message is
/// deleted and the author is warned.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
pub enum Severity {
    #[default]
    None,
    Mute,
    Kick,
    Ban,
}

impl Severity {
    /// Name of the corrective action applied for this severity
    #[must_use]
    pub fn action_name(self) -> &'static str {
        match self {
            Self::None => "warn",
            Self::Mute => "mute",
            Self::Kick => "kick",
            Self::Ban => "ban",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::None < Severity::Mute);
        assert!(Severity::Mute < Severity::Kick);
        assert!(Severity::Kick < Severity::Ban);
        assert_eq!(
            [Severity::Kick, Severity::None, Severity::Ban, Severity::Mute]
                .into_iter()
                .max(),
            Some(Severity::Ban)
        );
    }

    #[test]
    fn test_severity_names() {
        assert_eq!(Severity::None.action_name(), "warn");
        assert_eq!(Severity::Ban.action_name(), "ban");
        assert_eq!(Severity::Mute.to_string(), "Mute");
    }

    #[test]
    fn test_severity_yaml() {
        let parsed: Severity = serde_yaml::from_str("Kick").expect("Failed to deserialize");
        assert_eq!(parsed, Severity::Kick);
    }
}
