//! Participant model
//!
//! A participant is one member of the gift-giving group. Each participant has:
//! - An identity (name), unique within a run and compared case-sensitively
//! - A contact address the assignment notification is sent to
//! - An exclusion set: identities this participant must never be assigned
//!
//! Participants are immutable once loaded.

use serde::Serialize;
use std::collections::BTreeSet;

/// One member of the group
///
/// # Example
/// ```
/// use secret_santa_core::Participant;
///
/// let alice = Participant::new("Alice", "alice@example.com", ["Bob"]);
/// assert_eq!(alice.id(), "Alice");
/// assert!(alice.excludes("Bob"));
/// assert!(!alice.excludes("bob")); // identities are case-sensitive
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    /// Unique identity (e.g., "Alice")
    id: String,

    /// Where the assignment notification is delivered
    address: String,

    /// Identities this participant must not give to
    ///
    /// BTreeSet keeps serialization order stable for the roster digest.
    exclusions: BTreeSet<String>,
}

impl Participant {
    /// Create a new participant
    pub fn new<I, S>(id: impl Into<String>, address: impl Into<String>, exclusions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            address: address.into(),
            exclusions: exclusions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn exclusions(&self) -> &BTreeSet<String> {
        &self.exclusions
    }

    /// True if this participant must not be assigned `other`
    pub fn excludes(&self, other: &str) -> bool {
        self.exclusions.contains(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusions_deduplicated() {
        let p = Participant::new("A", "a@example.com", ["B", "C", "B"]);
        assert_eq!(p.exclusions().len(), 2);
    }

    #[test]
    fn test_no_exclusions() {
        let p = Participant::new("A", "a@example.com", Vec::<String>::new());
        assert!(p.exclusions().is_empty());
        assert!(!p.excludes("B"));
    }
}
