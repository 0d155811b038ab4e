//! Operator allow-list.
//!
//! Only the Discord users listed here may run the marketplace commands. The
//! list comes from `[bot] operators` in the configuration file or from the
//! comma separated `AUTHORIZED_USERS` environment variable.

use crate::errors::{Error, Result};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;

/// The single operator allowed when nothing else is configured.
pub const DEFAULT_OPERATOR: u64 = 585_128_050_623_250_462;

/// Set of Discord user ids permitted to run commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operators(BTreeSet<u64>);

impl Default for Operators {
    fn default() -> Self {
        Self(BTreeSet::from([DEFAULT_OPERATOR]))
    }
}

impl Operators {
    /// Builds an allow-list from explicit ids.
    #[must_use]
    pub fn new(ids: impl IntoIterator<Item = u64>) -> Self {
        Self(ids.into_iter().collect())
    }

    /// Parses a comma separated list of user ids, ignoring blank entries.
    pub fn parse_list(list: &str) -> Result<Self> {
        list.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(parse_id)
            .collect::<Result<BTreeSet<_>>>()
            .map(Self)
    }

    /// Whether `user_id` may run commands.
    #[must_use]
    pub fn is_allowed(&self, user_id: u64) -> bool {
        self.0.contains(&user_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn parse_id(id: &str) -> Result<u64> {
    id.parse().map_err(|e| Error::Config {
        message: format!("Invalid Discord user id {id:?}: {e}"),
    })
}

// Snowflakes are written as strings in TOML so they survive tools that read
// numbers as doubles.
impl<'de> Deserialize<'de> for Operators {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let ids = Vec::<String>::deserialize(deserializer)?;
        ids.iter()
            .map(|id| parse_id(id.trim()))
            .collect::<Result<BTreeSet<_>>>()
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_default_allows_only_the_default_operator() {
        let operators = Operators::default();
        assert!(operators.is_allowed(DEFAULT_OPERATOR));
        assert!(!operators.is_allowed(1));
        assert_eq!(operators.len(), 1);
    }

    #[test]
    fn test_parse_list_skips_blanks() {
        let operators = Operators::parse_list(" 1, ,2,").unwrap();
        assert!(operators.is_allowed(1));
        assert!(operators.is_allowed(2));
        assert_eq!(operators.len(), 2);
    }

    #[test]
    fn test_parse_list_rejects_garbage() {
        assert!(matches!(
            Operators::parse_list("12,abc"),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_empty_list_denies_everyone() {
        let operators = Operators::parse_list("").unwrap();
        assert!(operators.is_empty());
        assert!(!operators.is_allowed(DEFAULT_OPERATOR));
    }
}
