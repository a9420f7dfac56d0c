//! Noise-corrected ceiling: per-stimulus agreement between prediction and
//! response, normalized by the response's own single-trial reliability and
//! averaged across stimuli with sample-count weights.

use crate::correlation::{check_lengths, finite_pairs, pearson};
use crate::reliability::single_trial_reliability_with_rng;
use crate::signal::Recording;
use crate::MetricsError;
use log::debug;
use ndarray::s;
use rand::Rng;
use regex::Regex;

/// Anchored pattern selecting stimulus-presentation epochs.
const STIM_EPOCH_PATTERN: &str = "^STIM_";

/// [`noise_corrected_ceiling_with_rng`] drawing from the process RNG.
pub fn noise_corrected_ceiling(
    result: &Recording,
    fullrec: &Recording,
    pred_name: &str,
    resp_name: &str,
    max_pairs: usize,
) -> Result<f64, MetricsError> {
    noise_corrected_ceiling_with_rng(
        result,
        fullrec,
        pred_name,
        resp_name,
        max_pairs,
        &mut rand::thread_rng(),
    )
}

/// Scores the prediction in `result` against the multi-repeat response in
/// `fullrec`, one `STIM_` epoch at a time.
///
/// Per epoch with any finite predicted data: the response raster's
/// single-trial reliability `rac` is estimated, every repeat is correlated
/// against the epoch's predicted trace, and the mean repeat agreement `rs`
/// contributes `rs / sqrt(rac)` to a sample-count-weighted running average.
/// Epochs whose reliability is not positive (including a NaN poisoned by a
/// zero-variance repeat pair) contribute nothing. A predicted epoch whose
/// length differs from the response presentations of the same name is a
/// [`MetricsError::LengthMismatch`].
///
/// The caller must supply at least one matching epoch with finite predicted
/// data; otherwise no epoch contributes and the weighted average degenerates
/// to the IEEE quotient 0/0, i.e. NaN.
pub fn noise_corrected_ceiling_with_rng<R: Rng + ?Sized>(
    result: &Recording,
    fullrec: &Recording,
    pred_name: &str,
    resp_name: &str,
    max_pairs: usize,
    rng: &mut R,
) -> Result<f64, MetricsError> {
    let pred = result
        .get(pred_name)
        .ok_or_else(|| MetricsError::MissingSignal(pred_name.to_owned()))?;
    let resp = fullrec
        .get(resp_name)
        .ok_or_else(|| MetricsError::MissingSignal(resp_name.to_owned()))?;

    let pattern = Regex::new(STIM_EPOCH_PATTERN).expect("literal pattern is valid");
    let stim_names = pred.epochs().names_matching(&pattern);
    let folded_pred = pred.extract_epochs(&stim_names)?;

    let mut weighted_sum = 0.0;
    let mut total_samples = 0usize;
    for (name, folded) in &folded_pred {
        if !folded.iter().any(|v| v.is_finite()) {
            continue;
        }

        let raster = resp.extract_epoch(name)?;
        let rac = single_trial_reliability_with_rng(raster.view(), max_pairs, rng)?;
        debug!("epoch {name}: single-trial reliability {rac:.4}");
        if rac > 0.0 {
            let repeats = raster.shape()[0];
            let pred_trace = folded.slice(s![0, 0, ..]);
            check_lengths(pred_trace.len(), raster.shape()[2])?;
            let mut repeat_sum = 0.0;
            let mut last_valid = 0usize;
            for repeat in 0..repeats {
                let (x, y) = finite_pairs(raster.slice(s![repeat, 0, ..]), pred_trace);
                repeat_sum += if x.is_empty() { 0.0 } else { pearson(&x, &y) };
                last_valid = x.len();
            }
            let rs = repeat_sum / repeats as f64;
            debug!("epoch {name}: mean repeat agreement {rs:.4} over {repeats} repeats");

            // The epoch weight is the valid-sample count of the LAST repeat
            // processed, matching the estimator's historical behavior. The
            // per-epoch total is arguably the better weight; unchanged
            // pending a decision on intent.
            weighted_sum += (rs / rac.sqrt()) * last_valid as f64;
            total_samples += last_valid;
        }
    }

    Ok(weighted_sum / total_samples as f64)
}
