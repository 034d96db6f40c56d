//! Weighted rarity sampling
//!
//! Each element occupies `weight` consecutive slots in pool order; a uniform
//! draw over all slots picks the owning element. Slots are never
//! materialized: the pool keeps running totals and binary-searches them.

use rand::Rng;

use crate::catalog::{Element, RarityWeights};
use crate::error::{LayermintError, Result};

/// Precomputed weighted pool over one layer's elements
#[derive(Debug, Clone)]
pub struct WeightedPool<'a> {
    elements: &'a [Element],
    /// `cumulative[i]` = sum of weights of elements `0..=i`
    cumulative: Vec<u64>,
}

impl<'a> WeightedPool<'a> {
    /// Build a pool. `label` names the pool in errors.
    ///
    /// Fails with `EmptyPool` when there are no elements and with
    /// `InvalidConfig` when their weights sum to zero.
    pub fn new(label: &str, elements: &'a [Element], weights: &RarityWeights) -> Result<Self> {
        if elements.is_empty() {
            return Err(LayermintError::EmptyPool {
                layer: label.to_string(),
            });
        }

        let mut total = 0u64;
        let cumulative = elements
            .iter()
            .map(|e| {
                total += u64::from(weights.weight(e.tier));
                total
            })
            .collect();
        if total == 0 {
            return Err(LayermintError::config(format!(
                "every element in '{}' has a zero rarity weight",
                label
            )));
        }

        Ok(Self {
            elements,
            cumulative,
        })
    }

    /// Total number of logical slots.
    pub fn total_weight(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    /// Selection probability of the element at `index`.
    pub fn probability(&self, index: usize) -> f64 {
        let prev = if index == 0 { 0 } else { self.cumulative[index - 1] };
        (self.cumulative[index] - prev) as f64 / self.total_weight() as f64
    }

    /// Element owning logical slot `slot` (`slot < total_weight()`).
    pub fn element_at_slot(&self, slot: u64) -> &'a Element {
        let index = self.cumulative.partition_point(|&c| c <= slot);
        &self.elements[index]
    }

    /// Draw one element.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &'a Element {
        let slot = rng.gen_range(0..self.total_weight());
        self.element_at_slot(slot)
    }

    pub fn elements(&self) -> &'a [Element] {
        self.elements
    }
}

/// One-shot weighted selection over `elements`.
pub fn sample_weighted<'a, R: Rng + ?Sized>(
    elements: &'a [Element],
    weights: &RarityWeights,
    rng: &mut R,
) -> Result<&'a Element> {
    let pool = WeightedPool::new("<pool>", elements, weights)?;
    Ok(pool.sample(rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RarityTier;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::PathBuf;

    fn element(id: usize, name: &str, tier: RarityTier) -> Element {
        Element {
            id,
            name: name.to_string(),
            file_name: format!("{}{}.png", name, tier.suffix()),
            path: PathBuf::from(format!("{}.png", name)),
            tier,
        }
    }

    fn counts(pool: &WeightedPool<'_>, trials: usize, seed: u64) -> Vec<usize> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut counts = vec![0usize; pool.elements().len()];
        for _ in 0..trials {
            let picked = pool.sample(&mut rng);
            counts[picked.id - 1] += 1;
        }
        counts
    }

    fn chi_square(observed: &[usize], pool: &WeightedPool<'_>, trials: usize) -> f64 {
        observed
            .iter()
            .enumerate()
            .map(|(i, &o)| {
                let expected = pool.probability(i) * trials as f64;
                (o as f64 - expected).powi(2) / expected
            })
            .sum()
    }

    #[test]
    fn test_zero_total_weight_fails() {
        let elements = vec![element(1, "cap", RarityTier::Original)];
        let weights = RarityWeights::default().with_weight(RarityTier::Original, 0);

        let err = WeightedPool::new("hat", &elements, &weights).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");

        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample_weighted(&elements, &weights, &mut rng).is_err());
    }

    #[test]
    fn test_zero_weight_element_never_drawn() {
        let elements = vec![
            element(1, "cap", RarityTier::Original),
            element(2, "crown", RarityTier::Rare),
        ];
        let weights = RarityWeights::default().with_weight(RarityTier::Original, 0);
        let pool = WeightedPool::new("hat", &elements, &weights).unwrap();

        assert_eq!(counts(&pool, 200, 3), vec![0, 200]);
    }

    #[test]
    fn test_empty_pool_fails() {
        let err = WeightedPool::new("hat", &[], &RarityWeights::default()).unwrap_err();
        match err {
            LayermintError::EmptyPool { layer } => assert_eq!(layer, "hat"),
            other => panic!("expected EmptyPool, got {:?}", other),
        }

        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample_weighted(&[], &RarityWeights::default(), &mut rng).is_err());
    }

    #[test]
    fn test_slots_follow_pool_order() {
        let elements = vec![
            element(1, "a", RarityTier::SuperRare),
            element(2, "b", RarityTier::SuperSuperRare),
        ];
        let pool = WeightedPool::new("x", &elements, &RarityWeights::default()).unwrap();

        assert_eq!(pool.total_weight(), 10);
        for slot in 0..7 {
            assert_eq!(pool.element_at_slot(slot).name, "a");
        }
        for slot in 7..10 {
            assert_eq!(pool.element_at_slot(slot).name, "b");
        }
    }

    #[test]
    fn test_hat_example_distribution() {
        let elements = vec![
            element(1, "hat1", RarityTier::Original),
            element(2, "hat2", RarityTier::Rare),
        ];
        let pool = WeightedPool::new("hat", &elements, &RarityWeights::default()).unwrap();
        assert_abs_diff_eq!(pool.probability(0), 65.0 / 90.0, epsilon = 1e-12);

        let trials = 10_000;
        let observed = counts(&pool, trials, 42);
        assert_abs_diff_eq!(observed[0] as f64 / trials as f64, 0.722, epsilon = 0.02);
        assert_abs_diff_eq!(observed[1] as f64 / trials as f64, 0.278, epsilon = 0.02);

        // df = 1, p = 0.001
        assert!(chi_square(&observed, &pool, trials) < 10.83);
    }

    #[test]
    fn test_all_tiers_goodness_of_fit() {
        let elements: Vec<_> = RarityTier::ALL
            .iter()
            .enumerate()
            .map(|(i, t)| element(i + 1, &format!("e{}", i), *t))
            .collect();
        let pool = WeightedPool::new("all", &elements, &RarityWeights::default()).unwrap();

        let trials = 50_000;
        let observed = counts(&pool, trials, 7);
        // df = 3, p = 0.001
        assert!(chi_square(&observed, &pool, trials) < 16.27);
    }

    #[test]
    fn test_fallback_weight_for_unconfigured_tier() {
        let elements = vec![
            element(1, "common", RarityTier::Original),
            element(2, "odd", RarityTier::SuperSuperRare),
        ];
        let weights = RarityWeights::new(Default::default()).with_weight(RarityTier::Original, 9);
        let pool = WeightedPool::new("x", &elements, &weights).unwrap();

        assert_eq!(pool.total_weight(), 10);
        assert_abs_diff_eq!(pool.probability(1), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_seeded_sampling_is_deterministic() {
        let elements = vec![
            element(1, "a", RarityTier::Original),
            element(2, "b", RarityTier::Rare),
            element(3, "c", RarityTier::SuperRare),
        ];
        let pool = WeightedPool::new("x", &elements, &RarityWeights::default()).unwrap();
        assert_eq!(counts(&pool, 500, 99), counts(&pool, 500, 99));
    }
}
