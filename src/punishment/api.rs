//! Moderation actions against the chat platform

use crate::automod::MuteMechanism;
use crate::punishment::{ActionError, ActionResult};
use async_trait::async_trait;
use chrono::Utc;
use poise::serenity_prelude::{
    ChannelId, GuildId, Http, MessageId, RoleId, Timestamp, UserId, builder::EditMember,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Longest timeout Discord accepts, in minutes (28 days)
const MAX_TIMEOUT_MINUTES: u32 = 28 * 24 * 60;
/// Messages of the last day are removed when banning
const BAN_DELETE_MESSAGE_DAYS: u8 = 1;

/// Moderation actions the punishment executor can take
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModerationApi: Send + Sync {
    /// Warn a member publicly in the channel they posted in
    async fn warn(&self, guild_id: u64, channel_id: u64, user_id: u64, reason: &str)
    -> ActionResult<()>;

    /// Mute a member for `duration_minutes` using the guild's mute mechanism
    ///
    /// Fails with `ActionError::NoMuteRole` if the guild has none.
    async fn mute(
        &self,
        guild_id: u64,
        user_id: u64,
        mechanism: &MuteMechanism,
        duration_minutes: u32,
        reason: &str,
    ) -> ActionResult<()>;

    async fn kick(&self, guild_id: u64, user_id: u64, reason: &str) -> ActionResult<()>;

    async fn ban(&self, guild_id: u64, user_id: u64, reason: &str) -> ActionResult<()>;

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> ActionResult<()>;
}

/// [`ModerationApi`] backed by the Discord HTTP client
#[derive(Clone)]
pub struct SerenityModerationApi {
    http: Arc<Http>,
}

impl SerenityModerationApi {
    #[must_use]
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn http(&self) -> &Http {
        &self.http
    }

    /// Remove a mute role once the mute has run out
    fn schedule_unmute(&self, guild_id: GuildId, user_id: UserId, role_id: RoleId, minutes: u32) {
        let http = Arc::clone(&self.http);
        tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_secs(u64::from(minutes) * 60)).await;
            match http
                .remove_member_role(guild_id, user_id, role_id, Some("Automoderator: mute expired"))
                .await
            {
                Ok(()) => info!("Removed mute role from user {user_id} in guild {guild_id}"),
                Err(e) => warn!("Failed to remove mute role from user {user_id} in guild {guild_id}: {e}"),
            }
        });
    }
}

#[async_trait]
impl ModerationApi for SerenityModerationApi {
    async fn warn(
        &self,
        guild_id: u64,
        channel_id: u64,
        user_id: u64,
        reason: &str,
    ) -> ActionResult<()> {
        info!("Warning user {user_id} in guild {guild_id}");

        ChannelId::new(channel_id)
            .say(self.http(), format!("<@{user_id}> has been warned. {reason}"))
            .await?;

        Ok(())
    }

    async fn mute(
        &self,
        guild_id: u64,
        user_id: u64,
        mechanism: &MuteMechanism,
        duration_minutes: u32,
        reason: &str,
    ) -> ActionResult<()> {
        let guild_id = GuildId::new(guild_id);
        let user_id = UserId::new(user_id);

        match mechanism {
            MuteMechanism::None => return Err(ActionError::NoMuteRole),
            MuteMechanism::Role { role_id } => {
                info!("Muting user {user_id} in guild {guild_id} for {duration_minutes} minutes");

                let role_id = RoleId::new(*role_id);
                self.http()
                    .add_member_role(guild_id, user_id, role_id, Some(reason))
                    .await?;

                if duration_minutes > 0 {
                    self.schedule_unmute(guild_id, user_id, role_id, duration_minutes);
                }
            }
            MuteMechanism::Timeout => {
                info!("Timing out user {user_id} in guild {guild_id} for {duration_minutes} minutes");

                let minutes = duration_minutes.clamp(1, MAX_TIMEOUT_MINUTES);
                let until = Utc::now() + chrono::Duration::minutes(i64::from(minutes));

                guild_id
                    .edit_member(
                        self.http(),
                        user_id,
                        EditMember::new()
                            .disable_communication_until_datetime(Timestamp::from(until))
                            .audit_log_reason(reason),
                    )
                    .await?;
            }
        }

        Ok(())
    }

    async fn kick(&self, guild_id: u64, user_id: u64, reason: &str) -> ActionResult<()> {
        info!("Kicking user {user_id} from guild {guild_id}");

        GuildId::new(guild_id)
            .kick_with_reason(self.http(), UserId::new(user_id), reason)
            .await?;

        Ok(())
    }

    async fn ban(&self, guild_id: u64, user_id: u64, reason: &str) -> ActionResult<()> {
        info!("Banning user {user_id} from guild {guild_id}");

        GuildId::new(guild_id)
            .ban_with_reason(
                self.http(),
                UserId::new(user_id),
                BAN_DELETE_MESSAGE_DAYS,
                reason,
            )
            .await?;

        Ok(())
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> ActionResult<()> {
        ChannelId::new(channel_id)
            .delete_message(self.http(), MessageId::new(message_id))
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mute_without_mechanism_is_benign() {
        // No request is made when muting is not configured
        let api = SerenityModerationApi::new(Arc::new(Http::new("")));
        let err = api
            .mute(1, 2, &MuteMechanism::None, 10, "Automoderator: test")
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::NoMuteRole));
        assert!(err.is_benign());
    }
}
