//! Core logic - framework-agnostic catalog, page, asset and publish operations.
//!
//! Nothing in here knows about Discord; the bot layer calls into
//! [`workflow::Marketplace`] and turns its results into replies.

/// Image download and deletion
pub mod assets;
/// JSON catalog of addons
pub mod catalog;
/// HTML page cards
pub mod page;
/// Version control publishing
pub mod publish;
/// Step tracking across the independently mutated stores
pub mod saga;
/// Add and remove orchestration
pub mod workflow;

pub use workflow::{AddedAddon, Marketplace, NewAddon, RemovedAddon};
