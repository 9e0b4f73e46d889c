//! Randomness abstraction.
//!
//! All game randomness (the initial shuffle, first-player choice, Potion's
//! target queen, Jester's coin flip and queen draw) flows through the
//! [`RandomnessProvider`] trait, so outcomes are reproducible under test
//! with a seeded provider.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of every random outcome the engine produces.
pub trait RandomnessProvider {
    /// Shuffle a slice in place, uniformly.
    fn shuffle<T>(&mut self, items: &mut [T]);

    /// Pick a uniform index in `0..len`.
    ///
    /// `len` must be non-zero; callers pick from collections they have
    /// already checked to be non-empty.
    fn pick_index(&mut self, len: usize) -> usize;

    /// Flip a coin that lands true with the given probability.
    fn coin_flip(&mut self, probability: f64) -> bool;
}

/// Provider backed by the thread-local OS rng, for live play.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandomness;

impl RandomnessProvider for ThreadRandomness {
    fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut rand::thread_rng());
    }

    fn pick_index(&mut self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }

    fn coin_flip(&mut self, probability: f64) -> bool {
        rand::thread_rng().gen_bool(probability)
    }
}

/// Deterministic provider: the same seed produces the same game.
#[derive(Debug, Clone)]
pub struct SeededRandomness {
    inner: ChaCha8Rng,
}

impl SeededRandomness {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomnessProvider for SeededRandomness {
    fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }

    fn pick_index(&mut self, len: usize) -> usize {
        self.inner.gen_range(0..len)
    }

    fn coin_flip(&mut self, probability: f64) -> bool {
        self.inner.gen_bool(probability)
    }
}
