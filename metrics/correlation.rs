//! Pearson correlation with joint finite-masking, and the raw
//! prediction/response agreement score built on it.

use crate::signal::Recording;
use crate::MetricsError;
use ndarray::{ArrayView1, Axis};

/// Pearson correlation between two equal-length sequences after dropping
/// every position where either value is non-finite.
///
/// Returns 0.0 when no jointly finite position exists ("no usable signal" is
/// a valid outcome in this domain, not an error). A constant-valued input
/// leaves the correlation undefined and yields NaN; consumers treat NaN as
/// non-finite and exclude it from aggregation.
pub fn pairwise_correlation(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let (x, y) = finite_pairs(a, b);
    if x.is_empty() {
        return 0.0;
    }
    pearson(&x, &y)
}

/// Correlation between a recording's full predicted and observed time
/// series. Either signal having more than one channel is a [`MetricsError`];
/// see [`crate::DEFAULT_PRED_NAME`] / [`crate::DEFAULT_RESP_NAME`] for the
/// conventional signal names.
pub fn raw_agreement(
    result: &Recording,
    pred_name: &str,
    resp_name: &str,
) -> Result<f64, MetricsError> {
    let pred = continuous_channel(result, pred_name)?;
    let resp = continuous_channel(result, resp_name)?;
    check_lengths(pred.len(), resp.len())?;
    Ok(pairwise_correlation(pred, resp))
}

/// Two sequences drawn from independent sources must agree on length before
/// they can be paired position by position.
pub(crate) fn check_lengths(pred: usize, resp: usize) -> Result<(), MetricsError> {
    if pred != resp {
        return Err(MetricsError::LengthMismatch { pred, resp });
    }
    Ok(())
}

/// Looks up a signal and returns its single channel as a 1-D view.
pub(crate) fn continuous_channel<'a>(
    rec: &'a Recording,
    name: &str,
) -> Result<ArrayView1<'a, f64>, MetricsError> {
    let signal = rec
        .get(name)
        .ok_or_else(|| MetricsError::MissingSignal(name.to_owned()))?;
    let channels = signal.channels();
    if channels > 1 {
        return Err(MetricsError::MultiChannel { channels });
    }
    Ok(signal.as_continuous().index_axis_move(Axis(0), 0))
}

/// Splits two sequences into the jointly finite value pairs.
pub(crate) fn finite_pairs(a: ArrayView1<f64>, b: ArrayView1<f64>) -> (Vec<f64>, Vec<f64>) {
    debug_assert_eq!(a.len(), b.len());
    let mut x = Vec::with_capacity(a.len());
    let mut y = Vec::with_capacity(a.len());
    for (&ai, &bi) in a.iter().zip(b.iter()) {
        if ai.is_finite() && bi.is_finite() {
            x.push(ai);
            y.push(bi);
        }
    }
    (x, y)
}

/// Pearson correlation of two equal-length, all-finite slices. NaN when
/// either side has zero variance.
pub(crate) fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    sxy / (sxx * syy).sqrt()
}
