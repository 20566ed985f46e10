//! Cycle Validator
//!
//! Decides whether a candidate santa → santee mapping is acceptable:
//! - Structure: the mapping is a permutation of the registry identities
//! - No self-pairing: nobody gives to themselves
//! - Exclusions: nobody gives to someone in their exclusion set
//! - Single cycle: following the mapping from any santa visits everyone
//!   before returning to the start (one ring, not several disjoint ones)
//!
//! # Determinism
//!
//! Validation is a pure function of its inputs. Re-validating an accepted
//! assignment always succeeds.

use crate::models::{Assignment, Registry};
use std::collections::BTreeSet;
use thiserror::Error;

/// Why a candidate assignment was rejected
///
/// A rejection is an ordinary outcome of the search, never a run failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("a gift ring needs at least two participants, found {count}")]
    TooFewParticipants { count: usize },

    #[error("santa {santa:?} is not a registered participant")]
    UnknownSanta { santa: String },

    #[error("participant {santa:?} has no santee")]
    MissingSanta { santa: String },

    #[error("santee {santee:?} is not a registered participant")]
    UnknownSantee { santee: String },

    #[error("santee {santee:?} is assigned to more than one santa")]
    DuplicateSantee { santee: String },

    #[error("santa {santa:?} is paired with themselves")]
    SelfPairing { santa: String },

    #[error("santa {santa:?} excludes their santee")]
    Excluded { santa: String },

    #[error("cycle closes after {cycle_len} of {participants} participants")]
    ShortCycle { cycle_len: usize, participants: usize },
}

impl Rejection {
    /// Short label without identities, safe to log during the search
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::TooFewParticipants { .. } => "too_few_participants",
            Rejection::UnknownSanta { .. }
            | Rejection::MissingSanta { .. }
            | Rejection::UnknownSantee { .. }
            | Rejection::DuplicateSantee { .. } => "not_a_permutation",
            Rejection::SelfPairing { .. } => "self_pairing",
            Rejection::Excluded { .. } => "excluded",
            Rejection::ShortCycle { .. } => "short_cycle",
        }
    }
}

/// True if `assignment` satisfies every rule for `registry`
///
/// # Example
/// ```
/// use secret_santa_core::{validation, Assignment, Participant, Registry};
///
/// let registry = Registry::from_participants([
///     Participant::new("A", "a@example.com", ["B"]),
///     Participant::new("B", "b@example.com", ["C"]),
///     Participant::new("C", "c@example.com", Vec::<String>::new()),
/// ]).unwrap();
///
/// let only_valid = Assignment::from_pairs([("A", "C"), ("C", "B"), ("B", "A")]);
/// assert!(validation::is_valid(&only_valid, &registry));
///
/// let excluded = Assignment::from_pairs([("A", "B"), ("B", "C"), ("C", "A")]);
/// assert!(!validation::is_valid(&excluded, &registry));
/// ```
pub fn is_valid(assignment: &Assignment, registry: &Registry) -> bool {
    check(assignment, registry).is_ok()
}

/// Validate `assignment` against `registry`, naming the first violated rule
pub fn check(assignment: &Assignment, registry: &Registry) -> Result<(), Rejection> {
    if registry.is_empty() || assignment.is_empty() {
        return Err(Rejection::TooFewParticipants {
            count: registry.len(),
        });
    }

    check_pairs(assignment, registry)?;
    check_single_cycle(assignment, registry)
}

/// Permutation, self-pairing and exclusion rules
fn check_pairs(assignment: &Assignment, registry: &Registry) -> Result<(), Rejection> {
    if let Some(santa) = registry.ids().find(|id| assignment.santee_of(id).is_none()) {
        return Err(Rejection::MissingSanta {
            santa: santa.to_string(),
        });
    }

    let mut santees = BTreeSet::new();
    for (santa, santee) in assignment.pairs() {
        let participant = registry.get(santa).ok_or_else(|| Rejection::UnknownSanta {
            santa: santa.to_string(),
        })?;
        if !registry.contains(santee) {
            return Err(Rejection::UnknownSantee {
                santee: santee.to_string(),
            });
        }
        if !santees.insert(santee) {
            return Err(Rejection::DuplicateSantee {
                santee: santee.to_string(),
            });
        }
        if santa == santee {
            return Err(Rejection::SelfPairing {
                santa: santa.to_string(),
            });
        }
        if participant.excludes(santee) {
            return Err(Rejection::Excluded {
                santa: santa.to_string(),
            });
        }
    }

    Ok(())
}

/// Follow the mapping from the first santa until someone is revisited
///
/// Accept only if the walk closes on the start after covering everyone.
fn check_single_cycle(assignment: &Assignment, registry: &Registry) -> Result<(), Rejection> {
    let participants = registry.len();
    let start = match assignment.santas().next() {
        Some(start) => start,
        None => return Err(Rejection::TooFewParticipants { count: participants }),
    };

    let mut visited = BTreeSet::new();
    let mut current = start;
    loop {
        visited.insert(current);
        let next = match assignment.santee_of(current) {
            Some(next) => next,
            None => {
                return Err(Rejection::MissingSanta {
                    santa: current.to_string(),
                })
            }
        };
        if visited.contains(next) {
            if next == start && visited.len() == participants {
                return Ok(());
            }
            return Err(Rejection::ShortCycle {
                cycle_len: visited.len(),
                participants,
            });
        }
        current = next;
    }
}
