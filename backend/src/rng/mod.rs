//! Deterministic random number generation
//!
//! Uses xorshift64* algorithm for fast, deterministic random number generation.
//! CRITICAL: All randomness in the assigner MUST go through this module, so a
//! fixed seed reproduces the same assignment for the same roster.

mod xorshift;

pub use xorshift::RngManager;

/// Source of random permutations used by the assignment generator.
///
/// The generator only ever needs to reorder the santee list, so this is the
/// single seam through which randomness enters the search. Tests inject
/// scripted implementations to drive the generator through known candidates.
pub trait Shuffler {
    /// Reorder `items` in place.
    fn shuffle<T>(&mut self, items: &mut [T]);
}

impl<S: Shuffler + ?Sized> Shuffler for &mut S {
    fn shuffle<T>(&mut self, items: &mut [T]) {
        (**self).shuffle(items)
    }
}
