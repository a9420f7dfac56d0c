//! Empirical null floor: the correlation attainable by chance alignment
//! alone, estimated by correlating independently resampled prediction and
//! response subsequences.

use crate::correlation::{check_lengths, continuous_channel, finite_pairs, pearson};
use crate::signal::Recording;
use crate::MetricsError;
use rand::Rng;

/// Number of resampling trials per estimate.
const SHUFFLE_TRIALS: usize = 1000;
/// Cap on the number of samples drawn per trial.
const MAX_SHUFFLE_SAMPLES: usize = 500;
/// Rank of the reported null-distribution quantile.
const FLOOR_PERCENTILE: f64 = 0.95;

/// [`null_floor_with_rng`] drawing from the process RNG.
pub fn null_floor(
    result: &Recording,
    pred_name: &str,
    resp_name: &str,
) -> Result<f64, MetricsError> {
    null_floor_with_rng(result, pred_name, resp_name, &mut rand::thread_rng())
}

/// Estimates the correlation expected from chance alone: after joint
/// finite-masking, runs 1000 trials that each correlate two independently
/// resampled (with replacement) subsequences of up to 500 points, then
/// reports the 95th percentile of the finite trial results. A model score at
/// or below this floor carries no information.
///
/// Returns 0.0 when nothing survives the finite mask, or when every trial
/// correlation is non-finite.
pub fn null_floor_with_rng<R: Rng + ?Sized>(
    result: &Recording,
    pred_name: &str,
    resp_name: &str,
    rng: &mut R,
) -> Result<f64, MetricsError> {
    let pred = continuous_channel(result, pred_name)?;
    let resp = continuous_channel(result, resp_name)?;
    check_lengths(pred.len(), resp.len())?;
    let (x1, x2) = finite_pairs(pred, resp);
    if x1.is_empty() {
        return Ok(0.0);
    }

    let n = x1.len().min(MAX_SHUFFLE_SAMPLES);
    let mut shuffled_pred = vec![0.0; n];
    let mut shuffled_resp = vec![0.0; n];
    let mut draws = Vec::with_capacity(SHUFFLE_TRIALS);
    for _ in 0..SHUFFLE_TRIALS {
        for k in 0..n {
            shuffled_pred[k] = x1[rng.gen_range(0..x1.len())];
            shuffled_resp[k] = x2[rng.gen_range(0..x2.len())];
        }
        draws.push(pearson(&shuffled_pred, &shuffled_resp));
    }

    draws.retain(|r| r.is_finite());
    if draws.is_empty() {
        return Ok(0.0);
    }
    draws.sort_by(|a, b| a.total_cmp(b));
    Ok(draws[(draws.len() as f64 * FLOOR_PERCENTILE) as usize])
}
