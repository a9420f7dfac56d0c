//! Single-trial reliability: how self-consistent repeated measurements of
//! the same stimulus are, estimated from correlations between randomly
//! sampled repeat pairs.

use crate::correlation::pairwise_correlation;
use crate::MetricsError;
use log::info;
use ndarray::{s, ArrayView3};
use rand::seq::index;
use rand::Rng;

/// Lower clamp on the reliability estimate. Keeps the downstream
/// `rs / sqrt(rac)` normalization from blowing up on near-zero reliability.
pub(crate) const RELIABILITY_FLOOR: f64 = 0.05;

/// [`single_trial_reliability_with_rng`] drawing from the process RNG.
pub fn single_trial_reliability(
    raster: ArrayView3<f64>,
    max_pairs: usize,
) -> Result<f64, MetricsError> {
    single_trial_reliability_with_rng(raster, max_pairs, &mut rand::thread_rng())
}

/// Estimates reliability from a repeats × channels × time raster by
/// averaging the pairwise correlation of up to `max_pairs` randomly sampled
/// repeat pairs (see [`crate::DEFAULT_MAX_PAIRS`]), each pair finite-masked
/// independently. The mean is clamped below at 0.05.
///
/// Fewer than two repeats cannot constrain self-consistency, so the estimate
/// is a defined 0.0 (logged, not an error). Exactly two repeats would leave
/// a single pair; that configuration is not supported and errors instead of
/// degrading silently.
pub fn single_trial_reliability_with_rng<R: Rng + ?Sized>(
    raster: ArrayView3<f64>,
    max_pairs: usize,
    rng: &mut R,
) -> Result<f64, MetricsError> {
    let channels = raster.shape()[1];
    if channels > 1 {
        return Err(MetricsError::MultiChannel { channels });
    }

    let repeats = raster.shape()[0];
    if repeats <= 1 {
        info!("raster has {repeats} repeat(s); reliability set to 0");
        return Ok(0.0);
    }

    let pair_count = repeats * (repeats - 1) / 2;
    let n = max_pairs.min(pair_count);
    if n == 1 {
        return Err(MetricsError::SingleTrialPair);
    }

    let mut sum = 0.0;
    for rank in index::sample(rng, pair_count, n) {
        let (first, second) = pair_from_rank(rank, repeats);
        sum += pairwise_correlation(
            raster.slice(s![first, 0, ..]),
            raster.slice(s![second, 0, ..]),
        );
    }
    let mean = sum / n as f64;

    // Comparison, not f64::max: a NaN mean (some pair had zero variance)
    // must propagate so the ceiling estimator skips the epoch.
    Ok(if mean < RELIABILITY_FLOOR {
        RELIABILITY_FLOOR
    } else {
        mean
    })
}

/// Maps a rank in `0..repeats*(repeats-1)/2` to the corresponding unordered
/// pair `(first, second)`, `first < second`, in lexicographic order. Lets us
/// sample pairs uniformly without materializing the pair list.
fn pair_from_rank(rank: usize, repeats: usize) -> (usize, usize) {
    debug_assert!(rank < repeats * (repeats - 1) / 2);
    let mut remaining = rank;
    for first in 0..repeats {
        let row = repeats - first - 1;
        if remaining < row {
            return (first, first + 1 + remaining);
        }
        remaining -= row;
    }
    unreachable!("pair rank {rank} out of range for {repeats} repeats")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::StandardNormal;
    use std::collections::BTreeSet;

    fn sine_raster(repeats: usize, samples: usize, noise: f64, seed: u64) -> Array3<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        Array3::from_shape_fn((repeats, 1, samples), |(_, _, t)| {
            let jitter: f64 = rng.sample(StandardNormal);
            (t as f64 * 0.2).sin() + noise * jitter
        })
    }

    #[test]
    fn one_or_zero_repeats_give_zero() {
        let single = sine_raster(1, 50, 0.0, 0);
        assert_eq!(single_trial_reliability(single.view(), 100).unwrap(), 0.0);
        let none = Array3::<f64>::zeros((0, 1, 50));
        assert_eq!(single_trial_reliability(none.view(), 100).unwrap(), 0.0);
    }

    #[test]
    fn two_repeats_are_unsupported() {
        let raster = sine_raster(2, 50, 0.1, 1);
        assert!(matches!(
            single_trial_reliability(raster.view(), 100),
            Err(MetricsError::SingleTrialPair)
        ));
    }

    #[test]
    fn multichannel_raster_rejected() {
        let raster = Array3::<f64>::zeros((5, 3, 50));
        assert!(matches!(
            single_trial_reliability(raster.view(), 100),
            Err(MetricsError::MultiChannel { channels: 3 })
        ));
    }

    #[test]
    fn near_identical_repeats_are_highly_reliable() {
        let raster = sine_raster(5, 200, 0.05, 3);
        let mut rng = StdRng::seed_from_u64(9);
        let rac = single_trial_reliability_with_rng(raster.view(), 100, &mut rng).unwrap();
        assert!(rac > 0.9, "expected near-1 reliability, got {rac}");
    }

    #[test]
    fn independent_noise_is_clamped_at_the_floor() {
        let mut rng = StdRng::seed_from_u64(17);
        let raster = Array3::from_shape_fn((6, 1, 300), |_| rng.sample(StandardNormal));
        let mut est_rng = StdRng::seed_from_u64(4);
        let rac =
            single_trial_reliability_with_rng(raster.view(), 100, &mut est_rng).unwrap();
        assert!(rac >= RELIABILITY_FLOOR, "clamp violated: {rac}");
    }

    #[test]
    fn seeded_estimates_are_reproducible() {
        let raster = sine_raster(8, 100, 0.3, 5);
        let mut rng_a = StdRng::seed_from_u64(21);
        let mut rng_b = StdRng::seed_from_u64(21);
        let a = single_trial_reliability_with_rng(raster.view(), 10, &mut rng_a).unwrap();
        let b = single_trial_reliability_with_rng(raster.view(), 10, &mut rng_b).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn pair_unranking_covers_every_pair_once() {
        let repeats = 7;
        let pair_count = repeats * (repeats - 1) / 2;
        let pairs: BTreeSet<(usize, usize)> = (0..pair_count)
            .map(|rank| pair_from_rank(rank, repeats))
            .collect();
        assert_eq!(pairs.len(), pair_count);
        for &(first, second) in &pairs {
            assert!(first < second && second < repeats);
        }
    }
}
