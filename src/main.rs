use std::{env, sync::Arc};

use poise::serenity_prelude::{self as serenity, GatewayIntents, Http};
use tracing::{error, info};
use warden_automod::automod::{
    AnalyticsRecorder, Automod, ConfigCache, RuleState, YamlConfigStore,
};
use warden_automod::punishment::{PunishmentExecutor, SerenityModerationApi};
use warden_automod::settings::AutomodSettings;
use warden_automod::{BOT_NAME, Data, Error, commands, handlers, logging};

/// Main function to run the bot
async fn async_main() -> Result<(), Error> {
    // Initialize logging
    logging::init()?;

    let settings = AutomodSettings::load().await?;
    let token = env::var("DISCORD_TOKEN").map_err(|_| "DISCORD_TOKEN must be set")?;

    // Automod engine
    let http = Arc::new(Http::new(&token));
    let store = Arc::new(YamlConfigStore::new(&settings.config_dir));
    let known_guilds = store.known_guilds()?;
    let cache = Arc::new(ConfigCache::with_limits(
        store,
        settings.cache_ttl(),
        settings.cache_capacity,
    ));
    if settings.enabled {
        let loaded = cache.warm(&known_guilds).await;
        info!("Preloaded {loaded} automod config(s) from {}", settings.config_dir.display());
    }
    let executor = PunishmentExecutor::new(Arc::new(SerenityModerationApi::new(http)));
    let automod = Arc::new(
        Automod::new(
            cache,
            RuleState::default(),
            executor,
            Arc::new(AnalyticsRecorder::new()),
        )
        .with_enabled(settings.enabled),
    );

    let (invalidations, rx) = tokio::sync::mpsc::channel(settings.invalidation_buffer);
    let _maintenance = automod.start_maintenance(rx, settings.reap_interval());

    let data = Data::new(Arc::clone(&automod), invalidations, settings);

    // Configure the Poise framework
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::ping(),
                commands::automod_reload(),
                commands::automod_status(),
            ],
            pre_command: |ctx| {
                Box::pin(async move {
                    logging::log_command_start(ctx).await;
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    logging::log_command_end(ctx).await;
                })
            },
            on_error: |error| {
                Box::pin(async move {
                    logging::log_command_error(&error);
                })
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                logging::log_console("Registering commands".to_string());
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    // Configure the Serenity client
    let intents = GatewayIntents::non_privileged()
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS;
    let mut client = serenity::ClientBuilder::new(token, intents)
        .event_handler(handlers::Handler::new(automod))
        .framework(framework)
        .await?;

    info!("Starting {BOT_NAME}...");
    client.start().await?;

    Ok(())
}

fn main() {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to build runtime: {err}");
            return;
        }
    };

    if let Err(err) = runtime.block_on(async_main()) {
        error!("Error: {err}");
        eprintln!("Error: {err}");
    }
}
