pub mod automod;
pub mod commands;
pub mod data;
pub mod handlers;
pub mod logging;
pub mod punishment;
pub mod settings;

pub const BOT_NAME: &str = "warden";
pub const AUTOMOD_TARGET: &str = "warden::automod";
pub const ANALYTICS_TARGET: &str = "warden::analytics";
pub const COMMAND_TARGET: &str = "warden::command";
pub const ERROR_TARGET: &str = "warden::error";
pub const EVENT_TARGET: &str = "warden::handlers";
pub const CONSOLE_TARGET: &str = "warden";

pub use data::{Data, DataInner};
pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
