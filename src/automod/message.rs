//! Platform-neutral views of the message being checked and where it was sent

use chrono::{DateTime, Utc};

/// Kind of message as delivered by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageKind {
    #[default]
    Regular,
    Reply,
    /// Joins, pins, boosts and every other system message
    System,
}

/// Author of a message
#[derive(Debug, Clone, Default)]
pub struct MessageAuthor {
    pub id: u64,
    pub bot: bool,
}

/// A chat message handed to the engine by the ingestion layer
#[derive(Debug, Clone)]
pub struct AutomodMessage {
    pub id: u64,
    /// `None` for direct messages
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    pub author: MessageAuthor,
    pub content: String,
    /// IDs of mentioned users, possibly with duplicates
    pub mentions: Vec<u64>,
    pub mention_everyone: bool,
    pub kind: MessageKind,
    pub timestamp: DateTime<Utc>,
}

impl Default for AutomodMessage {
    fn default() -> Self {
        Self {
            id: 0,
            guild_id: None,
            channel_id: 0,
            author: MessageAuthor::default(),
            content: String::new(),
            mentions: Vec::new(),
            mention_everyone: false,
            kind: MessageKind::Regular,
            timestamp: Utc::now(),
        }
    }
}

impl AutomodMessage {
    /// Whether the message is a regular user message or a reply
    #[must_use]
    pub fn is_normal(&self) -> bool {
        matches!(self.kind, MessageKind::Regular | MessageKind::Reply)
    }
}

/// The channel a message was posted in
#[derive(Debug, Clone, Default)]
pub struct ChannelContext {
    pub id: u64,
    pub guild_id: u64,
    /// Category of a channel, or parent channel of a thread
    pub parent_id: Option<u64>,
}

/// The guild member who authored a message
#[derive(Debug, Clone, Default)]
pub struct MemberContext {
    pub user_id: u64,
    pub roles: Vec<u64>,
}

impl MemberContext {
    #[must_use]
    pub fn has_role(&self, role_id: u64) -> bool {
        self.roles.contains(&role_id)
    }
}

/// Whether a message should be looked at by automod at all.
///
/// Only human-authored guild messages qualify; never the bot's own messages.
#[must_use]
pub fn is_eligible(message: &AutomodMessage, bot_user_id: u64) -> bool {
    message.is_normal()
        && message.author.id != bot_user_id
        && !message.author.bot
        && message.guild_id.is_some_and(|id| id != 0)
}
