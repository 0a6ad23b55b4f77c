//! The seedable RNG driving dataset contents and key sampling.

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};

/// Seed used when the configuration does not specify one.
pub const DEFAULT_SEED: u64 = 0x5eed_0000_1e55;

/// A fast, non-cryptographic generator with a reproducible sequence.
///
/// Two instances created with the same seed yield the same sequence. There is no external entropy,
/// so [`Prng::default`] reproduces the same sequence on every run as well.
#[derive(Clone, Debug)]
pub struct Prng(SmallRng);

impl Prng {
    /// Creates a generator from the given seed.
    pub fn new(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }

    /// Returns a uniformly distributed index in `[0, bound)`.
    ///
    /// `bound` must be non-zero.
    pub fn below(&mut self, bound: usize) -> usize {
        self.0.random_range(0..bound)
    }
}

impl Default for Prng {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl RngCore for Prng {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        self.0.fill_bytes(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Prng::new(1234);
        let mut b = Prng::new(1234);

        for _ in 0..10_000 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn default_is_reproducible() {
        let mut a = Prng::default();
        let mut b = Prng::new(DEFAULT_SEED);

        for _ in 0..16 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = Prng::new(1);
        let mut b = Prng::new(2);

        let a: Vec<_> = (0..8).map(|_| a.next_u32()).collect();
        let b: Vec<_> = (0..8).map(|_| b.next_u32()).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn bits_are_balanced() {
        const DRAWS: usize = 1_000_000;

        let mut rng = Prng::new(42);
        let mut set = [0usize; 32];
        for _ in 0..DRAWS {
            let value = rng.next_u32();
            for (bit, count) in set.iter_mut().enumerate() {
                if value & (1 << bit) != 0 {
                    *count += 1;
                }
            }
        }

        for (bit, count) in set.into_iter().enumerate() {
            let ratio = count as f64 / DRAWS as f64;
            assert!((ratio - 0.5).abs() < 0.01, "bit {bit} set in {ratio} of draws");
        }
    }

    #[test]
    fn below_stays_in_bounds() {
        let mut rng = Prng::new(7);
        for _ in 0..1000 {
            assert!(rng.below(10) < 10);
        }
        assert_eq!(rng.below(1), 0);
    }
}
