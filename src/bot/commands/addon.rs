//! Addon commands - `/add` and `/remove`.
//!
//! Both commands are operator-only, acknowledge the interaction right away
//! (the workflow downloads images and runs git, which can outlast Discord's
//! three second deadline) with the configured reply visibility, and answer
//! with exactly one result reply.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, checks::require_operator, handlers::autocomplete, notify},
        core::NewAddon,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use tracing::{error, info};

    /// Add a new addon
    ///
    /// Downloads the image into the site's asset directory, records the addon
    /// in the catalog, adds its card to the page and publishes the change.
    #[poise::command(slash_command, check = "require_operator")]
    pub async fn add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Title of the addon"] title: String,
        #[description = "Redirect URL"] redirect: String,
        #[description = "Addon image"] image: serenity::Attachment,
    ) -> Result<()> {
        let data = ctx.data();
        let ephemeral = data.config.bot.add_reply_ephemeral;
        notify::Acknowledge::for_reply(ephemeral).send(ctx).await?;

        let request = NewAddon {
            title,
            redirect,
            image_url: image.url.clone(),
            image_name: image.filename.clone(),
        };
        match data.marketplace.add_addon(request).await {
            Ok(added) => {
                info!(
                    title = %added.record.title,
                    pushed = added.publish.pushed(),
                    "Addon added by {}",
                    ctx.author().id
                );
                notify::reply(ctx, notify::ADD_SUCCESS, ephemeral).await;
                let embed = notify::added_embed(
                    &added.record,
                    ctx.author().id,
                    &image.url,
                    &data.config.site.name,
                );
                notify::announce(ctx, embed).await;
            }
            Err(e) => {
                error!("Error in adding addon: {e}");
                notify::reply(ctx, notify::add_failure_message(&e), ephemeral).await;
            }
        }
        Ok(())
    }

    /// Remove an addon by title
    ///
    /// Drops the addon's catalog record, page card and image file and
    /// publishes the change.
    #[poise::command(slash_command, check = "require_operator")]
    pub async fn remove(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Title of the addon to remove"]
        #[autocomplete = "autocomplete::autocomplete_addon_title"]
        title: String,
    ) -> Result<()> {
        let data = ctx.data();
        let ephemeral = data.config.bot.remove_reply_ephemeral;
        notify::Acknowledge::for_reply(ephemeral).send(ctx).await?;

        match data.marketplace.remove_addon(&title).await {
            Ok(removed) => {
                info!(
                    title = %removed.title,
                    cards = removed.cards_removed,
                    images = removed.deleted_images.len(),
                    pushed = removed.publish.pushed(),
                    "Addon removed by {}",
                    ctx.author().id
                );
                notify::reply(ctx, notify::remove_success_message(&removed.title), ephemeral)
                    .await;
                let embed = notify::removed_embed(
                    &removed.title,
                    ctx.author().id,
                    &data.config.site.name,
                );
                notify::announce(ctx, embed).await;
            }
            Err(e) => {
                error!("Error in removing addon: {e}");
                notify::reply(ctx, notify::remove_failure_message(&e), ephemeral).await;
            }
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
