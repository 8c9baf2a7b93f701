use crate::EVENT_TARGET;
use crate::automod::{
    Automod, AutomodMessage, ChannelContext, MemberContext, MessageAuthor, MessageKind,
};
use chrono::{DateTime, Utc};
use poise::serenity_prelude::{
    self as serenity, Context, EventHandler, GuildId, Message, MessageType, MessageUpdateEvent,
    Ready, Timestamp,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Feeds gateway messages into automod
pub struct Handler {
    automod: Arc<Automod>,
}

impl Handler {
    #[must_use]
    pub fn new(automod: Arc<Automod>) -> Self {
        Self { automod }
    }

    async fn moderate(&self, ctx: &Context, msg: &Message) {
        let Some(guild_id) = msg.guild_id else {
            return;
        };

        let message = to_automod_message(msg);
        let channel = resolve_channel(ctx, guild_id, msg);
        let member = resolve_member(ctx, guild_id, msg);
        let bot_user_id = ctx.cache.current_user().id.get();

        let verdict = self
            .automod
            .check_message(&message, channel.as_ref(), &member, bot_user_id)
            .await;

        if verdict.is_violation() {
            debug!(
                target: EVENT_TARGET,
                message_id = message.id,
                guild_id = %guild_id,
                "Message flagged by automod"
            );
        }
    }
}

#[serenity::async_trait]
impl EventHandler for Handler {
    /// Called when the bot is ready, but the cache may not be fully populated yet.
    async fn ready(&self, ctx: Context, ready: Ready) {
        let user_name = ready.user.name.clone();
        let shard_id = ctx.shard_id;
        info!("Connected as {user_name}, shard {shard_id}");
    }

    /// Called when the cache is fully populated.
    async fn cache_ready(&self, ctx: Context, guilds: Vec<GuildId>) {
        let guild_count_cache = ctx.cache.guild_count();
        let guild_count = guilds.len();
        if guild_count != guild_count_cache {
            warn!(
                "Cache guild count mismatch: {guild_count_cache} (cache) vs {guild_count} (actual)"
            );
        }
        info!("Cache ready! The bot is in {guild_count} guild(s)");
    }

    async fn message(&self, ctx: Context, msg: Message) {
        self.moderate(&ctx, &msg).await;
    }

    /// Edited messages are checked again
    async fn message_update(
        &self,
        ctx: Context,
        _old_if_available: Option<Message>,
        new: Option<Message>,
        _event: MessageUpdateEvent,
    ) {
        if let Some(msg) = new {
            self.moderate(&ctx, &msg).await;
        }
    }
}

/// Convert a gateway message into the engine's view of it
#[must_use]
pub fn to_automod_message(msg: &Message) -> AutomodMessage {
    AutomodMessage {
        id: msg.id.get(),
        guild_id: msg.guild_id.map(GuildId::get),
        channel_id: msg.channel_id.get(),
        author: MessageAuthor {
            id: msg.author.id.get(),
            bot: msg.author.bot,
        },
        content: msg.content.clone(),
        mentions: msg.mentions.iter().map(|user| user.id.get()).collect(),
        mention_everyone: msg.mention_everyone,
        kind: message_kind(msg.kind),
        timestamp: to_utc(&msg.timestamp),
    }
}

/// Convert a gateway timestamp, keeping sub-second precision
#[must_use]
pub fn to_utc(timestamp: &Timestamp) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&timestamp.to_string()).map_or_else(
        |_| DateTime::from_timestamp(timestamp.unix_timestamp(), 0).unwrap_or_else(Utc::now),
        |parsed| parsed.with_timezone(&Utc),
    )
}

#[must_use]
pub fn message_kind(kind: MessageType) -> MessageKind {
    match kind {
        MessageType::Regular => MessageKind::Regular,
        MessageType::InlineReply => MessageKind::Reply,
        _ => MessageKind::System,
    }
}

/// Look the channel up in the cache, threads included
fn resolve_channel(ctx: &Context, guild_id: GuildId, msg: &Message) -> Option<ChannelContext> {
    let guild = ctx.cache.guild(guild_id)?;
    let channel = guild.channels.get(&msg.channel_id).or_else(|| {
        guild
            .threads
            .iter()
            .find(|thread| thread.id == msg.channel_id)
    })?;

    Some(ChannelContext {
        id: channel.id.get(),
        guild_id: guild_id.get(),
        parent_id: channel.parent_id.map(|id| id.get()),
    })
}

/// Roles come with the message; fall back to the cached member
fn resolve_member(ctx: &Context, guild_id: GuildId, msg: &Message) -> MemberContext {
    let roles = match &msg.member {
        Some(member) => member.roles.iter().map(|id| id.get()).collect(),
        None => ctx
            .cache
            .guild(guild_id)
            .and_then(|guild| {
                guild
                    .members
                    .get(&msg.author.id)
                    .map(|member| member.roles.iter().map(|id| id.get()).collect())
            })
            .unwrap_or_default(),
    };

    MemberContext {
        user_id: msg.author.id.get(),
        roles,
    }
}
