//! Assignment Generator
//!
//! Rejection sampling over random permutations:
//! 1. Shuffle the santee list with the injected [`Shuffler`]
//! 2. Pair it positionally with the fixed (sorted) santa list
//! 3. Ask the validator; stop on the first accepted candidate
//!
//! # Termination
//!
//! The search is bounded. Rosters that can never be satisfied for an
//! obvious reason (fewer than two participants, someone with nobody left
//! to give to or receive from) fail before any candidate is drawn. Anything
//! else fails once the attempt ceiling is reached.
//!
//! The ceiling defaults to a multiple of the expected number of draws: a
//! random permutation of `n` elements is a single `n`-cycle with probability
//! `1/n`, and participant `s` with `e_s` exclusions accepts a random santee
//! with probability roughly `(n-1-e_s)/(n-1)`.

use crate::models::{Assignment, Registry};
use crate::rng::Shuffler;
use crate::validation;
use thiserror::Error;
use tracing::{debug, trace};

/// Multiplier applied to the expected number of draws
pub const ATTEMPT_SAFETY_FACTOR: f64 = 64.0;

/// Lower bound of the derived attempt ceiling
pub const MIN_ATTEMPT_CEILING: usize = 1_000;

/// Upper bound of the derived attempt ceiling
pub const MAX_ATTEMPT_CEILING: usize = 5_000_000;

/// The roster admits no valid assignment
///
/// Every variant means the run cannot produce a gift ring. Rejected
/// candidates during the search are not errors and never surface here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("cannot form a gift ring from {count} participant(s); at least two are required")]
    TooFewParticipants { count: usize },

    #[error("participant {santa:?} excludes every other participant")]
    NoEligibleSantee { santa: String },

    #[error("every other participant excludes {santee:?}")]
    NoEligibleSanta { santee: String },

    #[error("no valid assignment found after {attempts} attempts; exclusions are likely too dense")]
    AttemptsExhausted { attempts: usize },
}

/// An accepted assignment and how many candidates it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub assignment: Assignment,
    pub attempts: usize,
}

/// Draws candidate assignments until one passes validation
///
/// # Example
/// ```
/// use secret_santa_core::{validation, AssignmentGenerator, Participant, Registry, RngManager};
///
/// let registry = Registry::from_participants(
///     ["A", "B", "C", "D"].map(|n| Participant::new(n, "x@example.com", Vec::<String>::new())),
/// ).unwrap();
///
/// let mut generator = AssignmentGenerator::new(RngManager::new(42));
/// let generated = generator.generate(&registry).unwrap();
/// assert!(validation::is_valid(&generated.assignment, &registry));
/// ```
#[derive(Debug, Clone)]
pub struct AssignmentGenerator<S: Shuffler> {
    shuffler: S,
    max_attempts: Option<usize>,
}

impl<S: Shuffler> AssignmentGenerator<S> {
    /// Create a generator with the derived attempt ceiling
    pub fn new(shuffler: S) -> Self {
        Self {
            shuffler,
            max_attempts: None,
        }
    }

    /// Override the attempt ceiling (`None` restores the derived one)
    pub fn with_max_attempts(mut self, max_attempts: Option<usize>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Search for an assignment satisfying every rule
    pub fn generate(&mut self, registry: &Registry) -> Result<Generated, AssignmentError> {
        check_feasible(registry)?;

        let ceiling = self
            .max_attempts
            .unwrap_or_else(|| attempt_ceiling(registry));
        let santas: Vec<String> = registry.ids().map(str::to_string).collect();
        let mut santees = santas.clone();

        debug!(
            participants = santas.len(),
            ceiling, "searching for assignment"
        );

        for attempt in 1..=ceiling {
            self.shuffler.shuffle(&mut santees);
            let candidate = Assignment::from_orderings(&santas, &santees);

            match validation::check(&candidate, registry) {
                Ok(()) => {
                    debug!(attempts = attempt, "accepted assignment");
                    return Ok(Generated {
                        assignment: candidate,
                        attempts: attempt,
                    });
                }
                Err(rejection) => {
                    trace!(attempt, reason = rejection.kind(), "rejected candidate");
                }
            }
        }

        Err(AssignmentError::AttemptsExhausted { attempts: ceiling })
    }

    pub fn into_shuffler(self) -> S {
        self.shuffler
    }
}

/// Fail fast on rosters no permutation can satisfy
pub fn check_feasible(registry: &Registry) -> Result<(), AssignmentError> {
    if registry.len() < 2 {
        return Err(AssignmentError::TooFewParticipants {
            count: registry.len(),
        });
    }

    for santa in registry.participants() {
        let has_santee = registry
            .ids()
            .any(|other| other != santa.id() && !santa.excludes(other));
        if !has_santee {
            return Err(AssignmentError::NoEligibleSantee {
                santa: santa.id().to_string(),
            });
        }
    }

    for santee in registry.ids() {
        let has_santa = registry
            .participants()
            .any(|santa| santa.id() != santee && !santa.excludes(santee));
        if !has_santa {
            return Err(AssignmentError::NoEligibleSanta {
                santee: santee.to_string(),
            });
        }
    }

    Ok(())
}

/// Attempt ceiling derived from group size and exclusion density
pub fn attempt_ceiling(registry: &Registry) -> usize {
    let n = registry.len();
    if n < 2 {
        return MIN_ATTEMPT_CEILING;
    }

    let others = (n - 1) as f64;
    let mut expected = n as f64;
    for participant in registry.participants() {
        let excluded = participant
            .exclusions()
            .iter()
            .filter(|name| name.as_str() != participant.id() && registry.contains(name))
            .count();
        let eligible = (n - 1).saturating_sub(excluded).max(1) as f64;
        expected *= others / eligible;
    }

    let ceiling = (expected * ATTEMPT_SAFETY_FACTOR).ceil();
    if !ceiling.is_finite() || ceiling >= MAX_ATTEMPT_CEILING as f64 {
        MAX_ATTEMPT_CEILING
    } else {
        (ceiling as usize).max(MIN_ATTEMPT_CEILING)
    }
}
