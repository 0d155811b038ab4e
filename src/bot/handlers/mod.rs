//! Discord interaction handlers
//!
//! Handlers for interactions other than command invocations.

/// Autocomplete handler for addon titles
pub mod autocomplete;
