//! Zipfian key sampling.
//!
//! Keys are ranked by their numeric value: key `0` has rank `0` and is the hottest key. The
//! probability of drawing rank `r` out of `N` keys is
//!
//! ```text
//! P(r) = (r + 1)^-s / H(N, s)        H(N, s) = sum over k in 1..=N of k^-s
//! ```
//!
//! where `s` is the skew. A skew of `0` degrades to a uniform distribution, the YCSB default of
//! [`DEFAULT_SKEW`] concentrates a large share of draws on a handful of keys.

use std::fmt;

use rand_distr::Distribution;
use rand_distr::weighted::{self, WeightedIndex};

use crate::Key;
use crate::rng::Prng;

/// The skew used by YCSB's zipfian request distribution.
pub const DEFAULT_SKEW: f64 = 0.99;

/// Errors that can occur when constructing a [`ZipfSampler`].
#[derive(Debug, thiserror::Error)]
pub enum ZipfError {
    /// There are no keys to sample from.
    #[error("key space must contain at least one key")]
    EmptyKeySpace,

    /// The skew is negative, infinite or NaN.
    #[error("zipf skew must be finite and non-negative, got {0}")]
    InvalidSkew(f64),

    /// The cumulative weight table could not be built.
    #[error("failed to build zipf weight table: {0}")]
    Weights(#[from] weighted::Error),
}

/// Draws keys from `[0, key_count)` following a zipfian distribution.
///
/// The cumulative weights of all ranks are computed once on construction, each draw is a single
/// uniform sample from the [`Prng`] followed by a binary search over that table.
pub struct ZipfSampler {
    key_count: u64,
    skew: f64,
    normalization: f64,
    index: WeightedIndex<f64>,
    rng: Prng,
}

impl ZipfSampler {
    /// Creates a sampler over `key_count` keys with the given skew, drawing from `rng`.
    pub fn new(key_count: u64, skew: f64, rng: Prng) -> Result<Self, ZipfError> {
        if key_count == 0 {
            return Err(ZipfError::EmptyKeySpace);
        }
        if !skew.is_finite() || skew < 0.0 {
            return Err(ZipfError::InvalidSkew(skew));
        }

        let weights = (0..key_count).map(|rank| rank_weight(rank, skew));
        let normalization: f64 = weights.clone().sum();
        let index = WeightedIndex::new(weights)?;

        Ok(Self {
            key_count,
            skew,
            normalization,
            index,
            rng,
        })
    }

    /// The number of keys this sampler draws from.
    pub fn key_count(&self) -> u64 {
        self.key_count
    }

    /// Draws the next key.
    pub fn sample(&mut self) -> Key {
        self.index.sample(&mut self.rng) as Key
    }

    /// The theoretical probability of drawing the key at `rank`.
    ///
    /// Returns `0.0` for ranks outside of the key space.
    pub fn probability(&self, rank: u64) -> f64 {
        if rank >= self.key_count {
            return 0.0;
        }
        rank_weight(rank, self.skew) / self.normalization
    }

    /// Draws `count` keys in the order they should be issued.
    pub fn generate_zipf_lookup_keys(&mut self, count: usize) -> Vec<Key> {
        (0..count).map(|_| self.sample()).collect()
    }
}

impl fmt::Debug for ZipfSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipfSampler")
            .field("key_count", &self.key_count)
            .field("skew", &self.skew)
            .finish_non_exhaustive()
    }
}

fn rank_weight(rank: u64, skew: f64) -> f64 {
    ((rank + 1) as f64).powf(-skew)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRAWS: usize = 1_000_000;

    fn frequencies(sampler: &mut ZipfSampler, draws: usize) -> Vec<usize> {
        let mut counts = vec![0; sampler.key_count() as usize];
        for _ in 0..draws {
            counts[sampler.sample() as usize] += 1;
        }
        counts
    }

    #[test]
    fn zero_skew_is_uniform() {
        let mut sampler = ZipfSampler::new(100, 0.0, Prng::new(1)).unwrap();
        let counts = frequencies(&mut sampler, DRAWS);

        for (rank, count) in counts.into_iter().enumerate() {
            let freq = count as f64 / DRAWS as f64;
            assert!(
                (freq - 0.01).abs() < 0.001,
                "rank {rank} drawn with frequency {freq}"
            );
        }
    }

    #[test]
    fn skewed_ranks_follow_theory() {
        let mut sampler = ZipfSampler::new(100, DEFAULT_SKEW, Prng::new(2)).unwrap();
        let counts = frequencies(&mut sampler, DRAWS);

        let observed = counts[0] as f64 / counts[50] as f64;
        let expected = sampler.probability(0) / sampler.probability(50);

        assert!(observed >= 5.0, "rank 0 only {observed}x as frequent as rank 50");
        assert!(
            (observed / expected - 1.0).abs() < 0.1,
            "observed ratio {observed}, expected {expected}"
        );

        let freq = counts[0] as f64 / DRAWS as f64;
        assert!((freq - sampler.probability(0)).abs() < 0.005);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let sampler = ZipfSampler::new(1000, DEFAULT_SKEW, Prng::default()).unwrap();
        let total: f64 = (0..1000).map(|rank| sampler.probability(rank)).sum();

        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(sampler.probability(1000), 0.0);
    }

    #[test]
    fn single_key() {
        let mut sampler = ZipfSampler::new(1, DEFAULT_SKEW, Prng::default()).unwrap();
        assert!(sampler.generate_zipf_lookup_keys(1000).iter().all(|&k| k == 0));
    }

    #[test]
    fn same_seed_same_keys() {
        let mut a = ZipfSampler::new(500, DEFAULT_SKEW, Prng::new(9)).unwrap();
        let mut b = ZipfSampler::new(500, DEFAULT_SKEW, Prng::new(9)).unwrap();

        let keys = a.generate_zipf_lookup_keys(10_000);
        assert_eq!(keys.len(), 10_000);
        assert!(keys.iter().all(|&k| k < 500));
        assert_eq!(keys, b.generate_zipf_lookup_keys(10_000));
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(matches!(
            ZipfSampler::new(0, 1.0, Prng::default()),
            Err(ZipfError::EmptyKeySpace)
        ));
        assert!(matches!(
            ZipfSampler::new(10, -0.5, Prng::default()),
            Err(ZipfError::InvalidSkew(_))
        ));
        assert!(matches!(
            ZipfSampler::new(10, f64::NAN, Prng::default()),
            Err(ZipfError::InvalidSkew(_))
        ));
    }
}
