//! Lifecycle of one punishment

use crate::punishment::{ActionError, ActionResult};
use chrono::{DateTime, Utc};
use derive_more::Display;
use tracing::debug;
use uuid::Uuid;

/// Stages a punishment goes through, strictly in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum PunishmentStage {
    /// A decision was made; nothing sent yet
    Evaluated,
    /// The warn/mute/kick/ban request was issued
    ActionDispatched,
    /// Deleting the triggering message was attempted
    MessageDeleteAttempted,
    Done,
}

impl PunishmentStage {
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Evaluated => Some(Self::ActionDispatched),
            Self::ActionDispatched => Some(Self::MessageDeleteAttempted),
            Self::MessageDeleteAttempted => Some(Self::Done),
            Self::Done => None,
        }
    }
}

/// Progress of one punishment job
#[derive(Debug, Clone)]
pub struct PunishmentProgress {
    pub job_id: Uuid,
    stage: PunishmentStage,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl PunishmentProgress {
    #[must_use]
    pub fn new(job_id: Uuid) -> Self {
        Self {
            job_id,
            stage: PunishmentStage::Evaluated,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    #[must_use]
    pub fn stage(&self) -> PunishmentStage {
        self.stage
    }

    /// Move to the next stage
    ///
    /// # Errors
    /// Returns `InvalidStageTransition` if `to` is not the stage after the current one.
    pub fn advance(&mut self, to: PunishmentStage) -> ActionResult<()> {
        if self.stage.next() != Some(to) {
            return Err(ActionError::InvalidStageTransition {
                from: self.stage,
                to,
            });
        }

        self.stage = to;
        if to == PunishmentStage::Done {
            self.finished_at = Some(Utc::now());
        }

        debug!(job_id = %self.job_id, stage = %to, "Punishment advanced");
        Ok(())
    }
}
