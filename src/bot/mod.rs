//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface of the marketplace keeper:
//! the `/add` and `/remove` slash commands, the operator check, replies and
//! channel announcements, and the framework setup.

/// Operator allow-list check
pub mod checks;
/// Discord command implementations
pub mod commands;
/// Discord interaction handlers (autocomplete)
pub mod handlers;
/// Replies and summary embeds
pub mod notify;

use crate::config::AppConfig;
use crate::core::Marketplace;
use crate::errors::{Error, Result};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Shared data available to all bot commands.
#[derive(Debug)]
pub struct BotData {
    /// Configuration built once at startup
    pub config: Arc<AppConfig>,
    /// The publish workflow
    pub marketplace: Arc<Marketplace>,
}

impl BotData {
    #[must_use]
    pub const fn new(config: Arc<AppConfig>, marketplace: Arc<Marketplace>) -> Self {
        Self {
            config,
            marketplace,
        }
    }
}

/// Poise context used by every command.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

// Last line of defence: whatever escapes a command is logged and answered
// with the generic failure text. Commands catch workflow errors themselves,
// so this only runs when nothing has been sent yet.
async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Failed to process command `{}`: {:?}", ctx.command().name, error);
            let reply = poise::CreateReply::default()
                .content(notify::GENERIC_FAILURE)
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                error!("Failed to send error response: {}", e);
            }
        }
        poise::FrameworkError::CommandCheckFailed {
            error: None, ctx, ..
        } => {
            debug!("Denied `{}` for {}", ctx.command().name, ctx.author().id);
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Connects to Discord, registers the commands globally and runs until the
/// gateway connection ends.
#[instrument(skip_all)]
pub async fn run_bot(
    token: String,
    config: Arc<AppConfig>,
    marketplace: Arc<Marketplace>,
) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(BotData::new(config, marketplace))
            })
        })
        .build();

    // Slash commands only; no message content needed.
    let intents = serenity::GatewayIntents::GUILDS;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {:?}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {:?}", e))?;
    Ok(())
}
