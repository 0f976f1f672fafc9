use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Random number generator used by every seeded learner in the workspace.
pub type SeededRng = Xoshiro256PlusPlus;

/// Builds the generator for `seed`, drawing a fresh seed when none is given.
///
/// Returns the generator together with the seed actually used so callers can
/// record it.
pub fn seeded_rng(seed: Option<u64>) -> (SeededRng, u64) {
    let seed = seed.unwrap_or_else(rand::random);
    (Xoshiro256PlusPlus::seed_from_u64(seed), seed)
}

/// Draws `n` indices from `0..n` with replacement.
pub fn bootstrap_indices<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    (0..n).map(|_| rng.random_range(0..n)).collect()
}

/// Picks `k` distinct feature indices out of `n_features`, in random order.
///
/// `k` is clamped to `n_features`.
pub fn feature_subset<R: Rng + ?Sized>(n_features: usize, k: usize, rng: &mut R) -> Vec<usize> {
    index::sample(rng, n_features, k.min(n_features)).into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let (mut a, seed_a) = seeded_rng(Some(7));
        let (mut b, seed_b) = seeded_rng(Some(7));
        assert_eq!(seed_a, 7);
        assert_eq!(seed_a, seed_b);
        assert_eq!(bootstrap_indices(20, &mut a), bootstrap_indices(20, &mut b));
    }

    #[test]
    fn test_bootstrap_indices_in_range() {
        let (mut rng, _) = seeded_rng(Some(42));
        let sample = bootstrap_indices(10, &mut rng);
        assert_eq!(sample.len(), 10);
        assert!(sample.iter().all(|&i| i < 10));
        assert!(bootstrap_indices(0, &mut rng).is_empty());
    }

    #[test]
    fn test_feature_subset_distinct_and_clamped() {
        let (mut rng, _) = seeded_rng(Some(3));
        let subset = feature_subset(5, 3, &mut rng);
        assert_eq!(subset.len(), 3);
        let unique: HashSet<_> = subset.iter().collect();
        assert_eq!(unique.len(), 3);

        let all = feature_subset(3, 10, &mut rng);
        let mut sorted = all.clone();
        sorted.sort();
        assert_eq!(sorted, vec![0, 1, 2]);
    }
}
