//! Applies automod decisions off the evaluation path

use crate::automod::{Decision, MuteMechanism, Severity};
use crate::punishment::{
    ActionResult, ModerationApi, PunishmentProgress, PunishmentStage,
};
use crate::{AUTOMOD_TARGET, ERROR_TARGET};
use std::any::Any;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Prefix of every reason text sent with an automod action
pub const AUTOMOD_REASON_PREFIX: &str = "Automoderator: ";

/// Everything needed to punish one triggering message
#[derive(Debug, Clone)]
pub struct PunishmentJob {
    pub id: Uuid,
    pub guild_id: u64,
    pub channel_id: u64,
    pub message_id: u64,
    pub user_id: u64,
    pub decision: Decision,
    pub mute: MuteMechanism,
}

impl PunishmentJob {
    #[must_use]
    pub fn new(
        guild_id: u64,
        channel_id: u64,
        message_id: u64,
        user_id: u64,
        decision: Decision,
        mute: MuteMechanism,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            guild_id,
            channel_id,
            message_id,
            user_id,
            decision,
            mute,
        }
    }

    /// Reason text attached to the action
    #[must_use]
    pub fn audit_reason(&self) -> String {
        format!("{AUTOMOD_REASON_PREFIX}{}", self.decision.reason)
    }
}

/// Runs punishments on their own tasks
#[derive(Clone)]
pub struct PunishmentExecutor {
    api: Arc<dyn ModerationApi>,
}

impl PunishmentExecutor {
    pub fn new(api: Arc<dyn ModerationApi>) -> Self {
        Self { api }
    }

    /// Apply `job` on a new task and return immediately.
    ///
    /// Failures and panics while applying are logged and stay inside the
    /// task. Awaiting the returned handle is optional; dropping it detaches.
    pub fn dispatch(&self, job: PunishmentJob) -> JoinHandle<()> {
        let api = Arc::clone(&self.api);
        let job_id = job.id;
        let guild_id = job.guild_id;

        let work = tokio::spawn(async move { apply(api.as_ref(), &job).await });

        tokio::spawn(async move {
            match work.await {
                Ok(Ok(progress)) => {
                    debug!(target: AUTOMOD_TARGET, job_id = %job_id, stage = %progress.stage(), "Punishment finished");
                }
                Ok(Err(e)) => {
                    error!(target: ERROR_TARGET, job_id = %job_id, guild_id, error = %e, "Automod punishment aborted");
                }
                Err(e) if e.is_panic() => {
                    let panic = e.into_panic();
                    error!(
                        target: ERROR_TARGET,
                        job_id = %job_id,
                        guild_id,
                        panic = %panic_message(panic.as_ref()),
                        "Recovered from panic applying automod punishment"
                    );
                }
                Err(e) => {
                    warn!(target: AUTOMOD_TARGET, job_id = %job_id, guild_id, "Automod punishment task cancelled: {e}");
                }
            }
        })
    }
}

/// Apply a punishment: the corrective action first, then the message deletion.
///
/// The action goes first so moderation logs capturing the message at action
/// time still see it. The deletion is attempted whatever the action's outcome.
///
/// # Errors
/// Only returns an error if the stages are advanced out of order; action
/// failures are logged, not returned.
pub async fn apply(api: &dyn ModerationApi, job: &PunishmentJob) -> ActionResult<PunishmentProgress> {
    let mut progress = PunishmentProgress::new(job.id);
    let reason = job.audit_reason();
    let severity = job.decision.highest_severity;

    progress.advance(PunishmentStage::ActionDispatched)?;
    let action = match severity {
        Severity::None => {
            api.warn(job.guild_id, job.channel_id, job.user_id, &reason)
                .await
        }
        Severity::Mute => {
            api.mute(
                job.guild_id,
                job.user_id,
                &job.mute,
                job.decision.mute_duration,
                &reason,
            )
            .await
        }
        Severity::Kick => api.kick(job.guild_id, job.user_id, &reason).await,
        Severity::Ban => api.ban(job.guild_id, job.user_id, &reason).await,
    };

    progress.advance(PunishmentStage::MessageDeleteAttempted)?;
    let deletion = api.delete_message(job.channel_id, job.message_id).await;

    log_result(job, severity.action_name(), &action);
    log_result(job, "delete_message", &deletion);

    progress.advance(PunishmentStage::Done)?;
    Ok(progress)
}

fn log_result(job: &PunishmentJob, action: &str, result: &ActionResult<()>) {
    match result {
        Ok(()) => info!(
            target: AUTOMOD_TARGET,
            job_id = %job.id,
            guild_id = job.guild_id,
            user_id = job.user_id,
            action,
            event = "punishment_applied",
            "Automod action applied"
        ),
        Err(e) if e.is_benign() => debug!(
            target: AUTOMOD_TARGET,
            job_id = %job.id,
            guild_id = job.guild_id,
            user_id = job.user_id,
            action,
            error = %e,
            "Automod action skipped"
        ),
        Err(e) => error!(
            target: ERROR_TARGET,
            job_id = %job.id,
            guild_id = job.guild_id,
            user_id = job.user_id,
            action,
            error = %e,
            "Error carrying out automod action"
        ),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::punishment::{ActionError, MockModerationApi};
    use mockall::Sequence;
    use mockall::predicate::{always, eq};

    fn job(severity: Severity, mute_duration: u32) -> PunishmentJob {
        PunishmentJob::new(
            1,
            2,
            3,
            4,
            Decision {
                should_delete: true,
                highest_severity: severity,
                mute_duration,
                reason: "Sent a banned word: `spamword`".to_string(),
            },
            MuteMechanism::Timeout,
        )
    }

    #[tokio::test]
    async fn test_kick_then_delete() {
        let mut api = MockModerationApi::new();
        let mut seq = Sequence::new();
        api.expect_kick()
            .with(
                eq(1),
                eq(4),
                eq("Automoderator: Sent a banned word: `spamword`"),
            )
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        api.expect_delete_message()
            .with(eq(2), eq(3))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let progress = apply(&api, &job(Severity::Kick, 0)).await.unwrap();
        assert_eq!(progress.stage(), PunishmentStage::Done);
    }

    #[tokio::test]
    async fn test_mute_uses_decision_duration() {
        let mut api = MockModerationApi::new();
        api.expect_mute()
            .with(eq(1), eq(4), eq(MuteMechanism::Timeout), eq(25), always())
            .times(1)
            .returning(|_, _, _, _, _| Ok(()));
        api.expect_delete_message().times(1).returning(|_, _| Ok(()));

        apply(&api, &job(Severity::Mute, 25)).await.unwrap();
    }

    #[tokio::test]
    async fn test_none_severity_warns() {
        let mut api = MockModerationApi::new();
        api.expect_warn()
            .with(eq(1), eq(2), eq(4), always())
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        api.expect_delete_message().times(1).returning(|_, _| Ok(()));

        apply(&api, &job(Severity::None, 0)).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_attempted_after_failed_action() {
        for failure in [ActionError::NoMuteRole, ActionError::Other("rate limited".to_string())] {
            let failure = std::sync::Mutex::new(Some(failure));
            let mut api = MockModerationApi::new();
            let mut seq = Sequence::new();
            api.expect_mute()
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_, _, _, _, _| Err(failure.lock().unwrap().take().unwrap()));
            api.expect_delete_message()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));

            let progress = apply(&api, &job(Severity::Mute, 10)).await.unwrap();
            assert_eq!(progress.stage(), PunishmentStage::Done);
        }
    }

    #[tokio::test]
    async fn test_dispatch_contains_panics() {
        let mut api = MockModerationApi::new();
        api.expect_ban()
            .returning(|_, _, _| panic!("platform client exploded"));
        let executor = PunishmentExecutor::new(Arc::new(api));

        let handle = executor.dispatch(job(Severity::Ban, 0));
        assert!(handle.await.is_ok());
    }

    #[tokio::test]
    async fn test_dispatch_runs_to_completion() {
        let mut api = MockModerationApi::new();
        api.expect_ban().times(1).returning(|_, _, _| Ok(()));
        api.expect_delete_message().times(1).returning(|_, _| Ok(()));
        let executor = PunishmentExecutor::new(Arc::new(api));

        executor.dispatch(job(Severity::Ban, 0)).await.unwrap();
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
