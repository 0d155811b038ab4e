//! Discord command implementations.

/// Addon management commands
pub mod addon;

pub use addon::*;

use crate::bot::BotData;
use crate::errors::Error;

/// Every command the bot registers at startup.
#[must_use]
pub fn all() -> Vec<poise::Command<BotData, Error>> {
    vec![add(), remove()]
}
