//! Command checks.

use crate::bot::{Context, notify};
use crate::config::Operators;
use crate::errors::Result;
use tracing::warn;

/// Allow-list decision for one caller: `Err` carries the denial text.
pub fn authorize(operators: &Operators, user: u64) -> std::result::Result<(), &'static str> {
    if operators.is_allowed(user) {
        Ok(())
    } else {
        Err(notify::DENIED)
    }
}

/// Lets allow-listed operators through and answers everyone else with a
/// private denial. Denied invocations never reach the command body.
pub async fn require_operator(ctx: Context<'_>) -> Result<bool> {
    let user = ctx.author().id;
    let Err(denial) = authorize(&ctx.data().config.bot.operators, user.get()) else {
        return Ok(true);
    };

    warn!(
        user = %user,
        command = %ctx.command().name,
        "Unauthorized command attempt"
    );
    let reply = poise::CreateReply::default()
        .content(denial)
        .ephemeral(true);
    if let Err(e) = ctx.send(reply).await {
        warn!("Authorization error: {e}");
    }
    Ok(false)
}
