//! Seedable RNG shared by the engines that draw at random.
//!
//! Wraps ChaCha8 so a session can be replayed from a seed (`seed_games`
//! export, tests). The browser default is seeded from entropy, which on
//! wasm32 comes from `crypto.getRandomValues` through `getrandom/js`.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: Option<u64>,
}

impl GameRng {
    /// Create a deterministic RNG from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Create an RNG seeded from OS/browser entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            inner: ChaCha8Rng::from_entropy(),
            seed: None,
        }
    }

    /// The seed this RNG was created from, if it was seeded explicitly.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Uniform draw from `low..=high`.
    pub fn between(&mut self, low: usize, high: usize) -> usize {
        self.inner.gen_range(low..=high)
    }

    /// Uniform Fisher–Yates shuffle in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut self.inner);
    }

    /// Uniform choice from a slice; `None` when empty.
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        slice.choose(&mut self.inner)
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_draws() {
        let mut a = GameRng::new(7);
        let mut b = GameRng::new(7);
        for _ in 0..50 {
            assert_eq!(a.between(1, 8), b.between(1, 8));
        }
    }

    #[test]
    fn between_is_inclusive() {
        let mut rng = GameRng::new(1);
        let mut seen_low = false;
        let mut seen_high = false;
        for _ in 0..500 {
            match rng.between(1, 3) {
                1 => seen_low = true,
                3 => seen_high = true,
                2 => {}
                other => panic!("out of range draw {other}"),
            }
        }
        assert!(seen_low && seen_high);
    }

    #[test]
    fn choose_empty_is_none() {
        let mut rng = GameRng::new(3);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
    }

    #[test]
    fn entropy_rng_has_no_seed() {
        assert_eq!(GameRng::from_entropy().seed(), None);
        assert_eq!(GameRng::new(9).seed(), Some(9));
    }
}
