//! Replies and channel announcements for the addon commands.
//!
//! Every send here is best effort: a failed reply or embed is logged and
//! never turns a finished workflow into a command error.

use crate::bot::Context;
use crate::core::catalog::AddonRecord;
use crate::errors::{Error, Result};
use poise::serenity_prelude as serenity;
use tracing::warn;

pub const DENIED: &str = "You are not authorized to use this command.";
pub const GENERIC_FAILURE: &str = "An error occurred while processing your request.";
pub const ADD_SUCCESS: &str = "Addon added successfully!";
pub const ADD_FAILURE: &str = "Failed to add addon.";
pub const REMOVE_FAILURE: &str = "Failed to remove addon.";
pub const REMOVE_MISSING_TITLE: &str = "Please provide the title of the addon to remove.";

const ADDED_COLOUR: u32 = 0x00a8_55f7;
const REMOVED_COLOUR: u32 = 0x00ff_4444;

/// Caller-facing text for a failed `/add`.
#[must_use]
pub fn add_failure_message(error: &Error) -> String {
    error
        .user_message()
        .unwrap_or_else(|| ADD_FAILURE.to_string())
}

/// Caller-facing text for a failed `/remove`.
#[must_use]
pub fn remove_failure_message(error: &Error) -> String {
    match error {
        Error::MissingFields => REMOVE_MISSING_TITLE.to_string(),
        other => other
            .user_message()
            .unwrap_or_else(|| REMOVE_FAILURE.to_string()),
    }
}

#[must_use]
pub fn remove_success_message(title: &str) -> String {
    format!("Successfully removed addon: \"{title}\".")
}

/// Summary posted to the channel after a successful `/add`.
#[must_use]
pub fn added_embed(
    record: &AddonRecord,
    added_by: serenity::UserId,
    image_url: &str,
    site_name: &str,
) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(format!("New Addon Added: {}", record.title))
        .color(ADDED_COLOUR)
        .field("Added by", format!("<@{added_by}>"), true)
        .field("Redirect", record.redirect.clone(), true)
        .image(image_url)
        .timestamp(serenity::Timestamp::now())
        .footer(serenity::CreateEmbedFooter::new(site_name))
}

/// Summary posted to the channel after a successful `/remove`.
#[must_use]
pub fn removed_embed(
    title: &str,
    removed_by: serenity::UserId,
    site_name: &str,
) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(format!("Addon Removed: {title}"))
        .color(REMOVED_COLOUR)
        .field("Removed by", format!("<@{removed_by}>"), true)
        .timestamp(serenity::Timestamp::now())
        .footer(serenity::CreateEmbedFooter::new(site_name))
}

/// How a command acknowledges its interaction before the workflow runs.
///
/// Discord gives the first follow-up the visibility of the deferral, so the
/// deferral must already be public for a public result reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledge {
    Private,
    Public,
}

impl Acknowledge {
    #[must_use]
    pub const fn for_reply(ephemeral: bool) -> Self {
        if ephemeral { Self::Private } else { Self::Public }
    }

    pub async fn send(self, ctx: Context<'_>) -> Result<()> {
        match self {
            Self::Private => ctx.defer_ephemeral().await?,
            Self::Public => ctx.defer().await?,
        }
        Ok(())
    }
}

/// Sends the result text to the caller, editing the deferred response.
pub async fn reply(ctx: Context<'_>, content: impl Into<String>, ephemeral: bool) {
    let reply = poise::CreateReply::default()
        .content(content)
        .ephemeral(ephemeral);
    if let Err(e) = ctx.send(reply).await {
        warn!("Discord response error: {e}");
    }
}

/// Posts `embed` publicly in the invoking channel.
pub async fn announce(ctx: Context<'_>, embed: serenity::CreateEmbed) {
    let message = serenity::CreateMessage::new().embed(embed);
    if let Err(e) = ctx.channel_id().send_message(ctx.http(), message).await {
        warn!("Failed to post summary embed: {e}");
    }
}
