//! Canonical conversation pair key.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Order-independent identifier for a two-party conversation.
///
/// The two participant ids are sorted lexicographically at construction so
/// that either party's send maps to the same key. This makes per-pair state
/// (message history, quota counters) a property of the conversation rather
/// than of the direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    first: String,
    second: String,
}

impl PairKey {
    /// Build the canonical key for the two participants.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let a = a.into();
        let b = b.into();
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.first, self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_independent() {
        assert_eq!(PairKey::new("alice", "bob"), PairKey::new("bob", "alice"));
    }

    #[test]
    fn test_sorted_components() {
        let key = PairKey::new("zoe", "adam");
        assert_eq!(key.to_string(), "adam:zoe");
    }

    #[test]
    fn test_self_pair() {
        let key = PairKey::new("u1", "u1");
        assert_eq!(key.to_string(), "u1:u1");
    }
}
