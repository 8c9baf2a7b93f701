use crate::{
    ANALYTICS_TARGET, AUTOMOD_TARGET, COMMAND_TARGET, CONSOLE_TARGET, Data, ERROR_TARGET, Error,
};
use poise::{Context, FrameworkError};
use std::path::Path;
use tokio::time::Instant;
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Log directory name
pub const LOG_DIR: &str = "logs";
/// Command log file name
pub const COMMAND_LOG_FILE: &str = "commands";
/// Automod and analytics log file name
pub const AUTOMOD_LOG_FILE: &str = "automod";

/// Initialize the logging system with console and file outputs
///
/// # Errors
/// Returns an error if the log directory cannot be created.
pub fn init() -> Result<(), Error> {
    // Create log directory if it doesn't exist
    if !Path::new(LOG_DIR).exists() {
        std::fs::create_dir_all(LOG_DIR)?;
    }

    // Set up file appenders with daily rotation
    let command_file = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, COMMAND_LOG_FILE);
    let automod_file = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, AUTOMOD_LOG_FILE);

    // Create a layer for console output (human-readable format)
    let console_layer = fmt::layer()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_ansi(true);

    // Create a layer for command logs (JSON format)
    let command_layer = fmt::layer()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_ansi(false)
        .json()
        .with_writer(command_file)
        .with_filter(filter_fn(|meta| {
            let target = meta.target();
            target == COMMAND_TARGET || target == ERROR_TARGET
        }));

    // Automod decisions, punishments and analytics (JSON format)
    let automod_layer = fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .json()
        .with_writer(automod_file)
        .with_filter(filter_fn(|meta| {
            let target = meta.target();
            target == AUTOMOD_TARGET || target == ANALYTICS_TARGET || target == ERROR_TARGET
        }));

    // Set up the subscriber with all layers
    // Use env filter to allow runtime configuration of log levels
    // Default to INFO level if not specified, but filter out serenity heartbeat logs
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        // Filter out serenity logs
        Err(_) => EnvFilter::new("info").add_directive("serenity=error".parse()?),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(command_layer)
        .with(automod_layer)
        .init();

    info!("Logging system initialized");
    Ok(())
}

/// Start time of a command, kept in the invocation data
#[derive(Debug, Clone, Copy)]
pub struct CommandStart(Instant);

impl CommandStart {
    #[must_use]
    pub fn now() -> Self {
        Self(Instant::now())
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.0.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Log the start of a command execution (pre-command hook)
pub async fn log_command_start(ctx: Context<'_, Data, Error>) {
    ctx.set_invocation_data(CommandStart::now()).await;

    let command_name = ctx.command().qualified_name.clone();
    let guild_id = ctx
        .guild_id()
        .map_or_else(|| "DM".to_string(), |id| id.get().to_string());
    let user_id = ctx.author().id.get().to_string();

    let args = if ctx.command().parameters.is_empty() {
        String::new()
    } else {
        format!("{:?}", ctx.invocation_string())
    };

    info!(
        target: COMMAND_TARGET,
        command = %command_name,
        guild_id = %guild_id,
        user_id = %user_id,
        arguments = %args,
        event = "start",
        "Command execution started"
    );
}

/// Log the end of a command execution (post-command hook)
pub async fn log_command_end(ctx: Context<'_, Data, Error>) {
    let duration_ms = ctx
        .invocation_data::<CommandStart>()
        .await
        .map_or(0, |start| start.elapsed_ms());

    let command_name = ctx.command().qualified_name.clone();
    let guild_id = ctx
        .guild_id()
        .map_or_else(|| "DM".to_string(), |id| id.get().to_string());
    let user_id = ctx.author().id.get().to_string();

    info!(
        target: COMMAND_TARGET,
        command = %command_name,
        guild_id = %guild_id,
        user_id = %user_id,
        duration_ms = duration_ms,
        event = "end",
        "Command execution completed"
    );
}

/// Log errors that occur during command execution
pub fn log_command_error(error: &FrameworkError<'_, Data, Error>) {
    match error {
        FrameworkError::Command { error, ctx, .. } => {
            let command_name = ctx.command().qualified_name.clone();
            let guild_id = ctx
                .guild_id()
                .as_ref()
                .map_or_else(|| "DM".to_string(), ToString::to_string);
            let user_id = ctx.author().id.get().to_string();

            error!(
                target: ERROR_TARGET,
                command = %command_name,
                guild_id = %guild_id,
                user_id = %user_id,
                error = %error,
                "Command error"
            );
        }
        FrameworkError::CommandCheckFailed { error, ctx, .. } => {
            let command_name = ctx.command().qualified_name.clone();
            let guild_id = ctx
                .guild_id()
                .as_ref()
                .map_or_else(|| "DM".to_string(), ToString::to_string);
            let user_id = ctx.author().id.get().to_string();

            let error_msg = error
                .as_ref()
                .map_or_else(|| "Check failed".to_string(), ToString::to_string);

            error!(
                target: ERROR_TARGET,
                command = %command_name,
                guild_id = %guild_id,
                user_id = %user_id,
                error = %error_msg,
                "Command check failed"
            );
        }
        err => {
            error!(
                target: ERROR_TARGET,
                error_type = %std::any::type_name::<FrameworkError<'_, Data, Error>>(),
                error = ?err,
                "Other framework error"
            );
        }
    }
}

pub fn log_console(message: String) {
    info!(
        target: CONSOLE_TARGET,
        message = %message,
        event = "console",
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_command_start_elapsed() {
        let start = CommandStart::now();
        assert_eq!(start.elapsed_ms(), 0);

        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_eq!(start.elapsed_ms(), 1500);
    }
}
