//! Account identity used as the license cache key and License API parameter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque account identifier.
///
/// Never empty: construction trims surrounding whitespace and rejects blank input,
/// so a request either carries a usable identity or none at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create an account id, returning `None` for blank input
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_rejects_blank() {
        assert!(AccountId::new("").is_none());
        assert!(AccountId::new("   ").is_none());
    }

    #[test]
    fn test_account_id_trims() {
        let id = AccountId::new("  acct-1 ").unwrap();
        assert_eq!(id.as_str(), "acct-1");
        assert_eq!(id.to_string(), "acct-1");
    }
}
