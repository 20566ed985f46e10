//! Assignment mapping
//!
//! A total function from santa to santee ("santa gives to santee"). The
//! generator builds candidates by pairing a fixed santa ordering with a
//! shuffled santee ordering; the validator decides which candidates are
//! acceptable.
//!
//! An `Assignment` by itself carries no guarantees. Only mappings accepted
//! by [`crate::validation::check`] are permutations with no fixed point,
//! no excluded pair and a single cycle.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Santa → santee mapping
///
/// # Example
/// ```
/// use secret_santa_core::Assignment;
///
/// let assignment = Assignment::from_pairs([("A", "B"), ("B", "C"), ("C", "A")]);
/// assert_eq!(assignment.santee_of("A"), Some("B"));
/// assert_eq!(assignment.ring(), vec!["A", "B", "C"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assignment {
    pairs: BTreeMap<String, String>,
}

impl Assignment {
    /// Pair `santas[i]` with `santees[i]`
    ///
    /// Extra entries on the longer side are ignored; the validator rejects
    /// the resulting partial mapping.
    pub fn from_orderings(santas: &[String], santees: &[String]) -> Self {
        Self {
            pairs: santas
                .iter()
                .cloned()
                .zip(santees.iter().cloned())
                .collect(),
        }
    }

    /// Build from (santa, santee) pairs; a repeated santa keeps its last santee
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(santa, santee)| (santa.into(), santee.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Who `santa` gives to
    pub fn santee_of(&self, santa: &str) -> Option<&str> {
        self.pairs.get(santa).map(String::as_str)
    }

    /// (santa, santee) pairs in santa order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    pub fn santas(&self) -> impl Iterator<Item = &str> {
        self.pairs.keys().map(String::as_str)
    }

    /// Follow the mapping from the first santa until it revisits someone
    ///
    /// For an accepted assignment this lists every participant once, in
    /// gift-giving order. The closing edge back to the start is implied.
    pub fn ring(&self) -> Vec<&str> {
        let mut ring = Vec::with_capacity(self.pairs.len());
        let mut seen = BTreeSet::new();
        let mut current = match self.santas().next() {
            Some(start) => start,
            None => return ring,
        };

        while seen.insert(current) {
            ring.push(current);
            match self.santee_of(current) {
                Some(next) => current = next,
                None => break,
            }
        }
        ring
    }
}
