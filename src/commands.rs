use crate::automod::GuildAutomodConfig;
use crate::{COMMAND_TARGET, Data, Error};
use poise::{Context, command};
use tracing::info;

/// Basic ping command
/// This command is used to check if the bot is responsive.
#[command(slash_command, guild_only)]
pub async fn ping(ctx: Context<'_, Data, Error>) -> Result<(), Error> {
    ctx.say("Pong!").await?;
    Ok(())
}

/// Reload this server's automod configuration
#[command(
    slash_command,
    guild_only,
    rename = "automod-reload",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn automod_reload(ctx: Context<'_, Data, Error>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Not in a guild")?.get();

    if !ctx.data().request_invalidation(guild_id) {
        return Err("Automod maintenance is not running".into());
    }

    info!(target: COMMAND_TARGET, guild_id, "Automod config reload requested");
    ctx.say("Automod configuration will be reloaded on the next message.")
        .await?;
    Ok(())
}

/// Show whether automod is on in this server and which rules are active
#[command(slash_command, guild_only, rename = "automod-status")]
pub async fn automod_status(ctx: Context<'_, Data, Error>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Not in a guild")?.get();
    let automod = &ctx.data().automod;

    let config = automod.cache().get(guild_id).await?;
    ctx.say(status_text(automod.is_enabled(), &config)).await?;
    Ok(())
}

/// Human readable automod status for a guild
#[must_use]
pub fn status_text(engine_enabled: bool, config: &GuildAutomodConfig) -> String {
    if !engine_enabled {
        return "Automod is disabled for this bot.".to_string();
    }
    if !config.enabled {
        return "Automod is disabled in this server.".to_string();
    }

    let rules = config.active_rules();
    if rules.is_empty() {
        "Automod is enabled, but no rules are active.".to_string()
    } else {
        format!("Automod is enabled. Active rules: {}", rules.join(", "))
    }
}
