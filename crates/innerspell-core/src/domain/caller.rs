use std::fmt;

use serde::{Deserialize, Serialize};

/// Caller id used for requests without an authenticated identity.
pub const GUEST_CALLER_ID: &str = "guest";

/// Usage tier of a caller, ordered by quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallerTier {
    Guest,
    Standard,
    Premium,
}

impl CallerTier {
    /// Resolve the tier for a caller.
    ///
    /// The guest sentinel is always [`CallerTier::Guest`], even when the
    /// premium flag is set; the flag is taken on trust for everyone else.
    pub fn resolve(caller_id: &str, is_premium: bool) -> Self {
        if caller_id == GUEST_CALLER_ID {
            CallerTier::Guest
        } else if is_premium {
            CallerTier::Premium
        } else {
            CallerTier::Standard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallerTier::Guest => "guest",
            CallerTier::Standard => "standard",
            CallerTier::Premium => "premium",
        }
    }
}

impl fmt::Display for CallerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_sentinel_ignores_premium_flag() {
        assert_eq!(CallerTier::resolve("guest", false), CallerTier::Guest);
        assert_eq!(CallerTier::resolve("guest", true), CallerTier::Guest);
    }

    #[test]
    fn test_authenticated_callers() {
        assert_eq!(CallerTier::resolve("user-42", false), CallerTier::Standard);
        assert_eq!(CallerTier::resolve("user-42", true), CallerTier::Premium);
    }

    #[test]
    fn test_tiers_are_ordered() {
        assert!(CallerTier::Guest < CallerTier::Standard);
        assert!(CallerTier::Standard < CallerTier::Premium);
    }
}
