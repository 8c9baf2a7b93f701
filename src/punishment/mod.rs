//! Punishment system
//!
//! Applies automod decisions against Discord on isolated tasks, tolerating
//! missing permissions and unconfigured mutes.

mod api;
mod error;
mod executor;
mod stage;

pub use api::{ModerationApi, SerenityModerationApi};
pub use error::{ActionError, ActionResult, MISSING_ACCESS_CODE, MISSING_PERMISSIONS_CODE};
pub use executor::{AUTOMOD_REASON_PREFIX, PunishmentExecutor, PunishmentJob, apply};
pub use stage::{PunishmentProgress, PunishmentStage};

#[cfg(test)]
pub use api::MockModerationApi;
