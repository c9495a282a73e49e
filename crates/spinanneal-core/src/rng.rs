//! # Deterministic Random Numbers
//!
//! A single [`SpinRng`] stream drives every random decision in the engine:
//! initial spin assignments, random traversal picks, and Metropolis
//! acceptance draws. The generator is pcg32 (PCG-XSH-RR 64/32, 64-bit state
//! plus a fixed odd stream) via [`rand_pcg::Pcg32`], so a non-negative seed
//! reproduces the exact same stream on every run of this crate. Byte
//! equality with other pcg32 wrappers is not promised; stream
//! reproducibility within this implementation is.

use rand::{Rng, RngCore};
use rand_pcg::Pcg32;

/// Stream selector shared by every seeded generator.
const STREAM: u64 = 54;

/// Scale factor mapping a full 32-bit draw onto [0, 1).
const U32_SPAN: f64 = 4_294_967_296.0;

/// Seedable random number generator with the engine's seed convention.
///
/// A negative seed requests entropy seeding, which trades reproducibility
/// for fresh randomness on every call. A non-negative seed selects a fully
/// deterministic stream.
#[derive(Debug, Clone)]
pub struct SpinRng {
    inner: Pcg32,
}

impl SpinRng {
    /// Build a generator from the signed seed convention.
    pub fn new(seed: i64) -> Self {
        let state = if seed < 0 {
            rand::thread_rng().gen::<u64>()
        } else {
            seed as u64
        };
        Self {
            inner: Pcg32::new(state, STREAM),
        }
    }

    /// Uniform double in [0, 1) built from exactly 32 random bits.
    pub fn uniform01(&mut self) -> f64 {
        f64::from(self.inner.next_u32()) / U32_SPAN
    }

    /// Unbiased uniform integer in [0, bound). `bound` must be positive.
    pub fn below(&mut self, bound: usize) -> usize {
        self.inner.gen_range(0..bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = SpinRng::new(1234);
        let mut b = SpinRng::new(1234);
        for _ in 0..256 {
            assert_eq!(a.uniform01().to_bits(), b.uniform01().to_bits());
        }
        for _ in 0..256 {
            assert_eq!(a.below(97), b.below(97));
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = SpinRng::new(0);
        let mut b = SpinRng::new(1);
        let draws_a: Vec<u64> = (0..16).map(|_| a.uniform01().to_bits()).collect();
        let draws_b: Vec<u64> = (0..16).map(|_| b.uniform01().to_bits()).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn test_uniform01_range() {
        let mut rng = SpinRng::new(7);
        for _ in 0..10_000 {
            let x = rng.uniform01();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn test_below_range() {
        let mut rng = SpinRng::new(7);
        for bound in [1usize, 2, 3, 17, 1000] {
            for _ in 0..200 {
                assert!(rng.below(bound) < bound);
            }
        }
    }

    #[test]
    fn test_below_hits_every_value() {
        let mut rng = SpinRng::new(99);
        let mut seen = [false; 8];
        for _ in 0..1_000 {
            seen[rng.below(8)] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
