//! Prediction-quality metrics for neural encoding models.
//!
//! Given a model's predicted response and the measured response to the same
//! stimuli, this crate estimates how well they agree and how much agreement
//! was even attainable:
//!
//! - [`raw_agreement`]: Pearson correlation between prediction and response.
//! - [`null_floor`]: the correlation expected from chance alignment alone,
//!   from an empirical distribution of mismatched resamples.
//! - [`single_trial_reliability`]: self-consistency of repeated measurements
//!   of the same stimulus, from pairwise trial correlations.
//! - [`noise_corrected_ceiling`]: per-stimulus agreement normalized by the
//!   response's own reliability, weighted across stimuli by sample count.
//!
//! All estimators are pure functions over immutable [`Recording`] inputs.
//! The randomized ones come in two forms: a convenience form drawing from
//! the process RNG, and a `*_with_rng` form taking any [`rand::Rng`] so
//! callers can seed for reproducibility. No global state is touched; a call
//! is thread-safe exactly when the RNG it owns or borrows is not shared.

#![deny(dead_code)]
#![deny(unused_imports)]

pub mod ceiling;
pub mod correlation;
pub mod floor;
pub mod reliability;
pub mod signal;

use thiserror::Error;

pub use ceiling::{noise_corrected_ceiling, noise_corrected_ceiling_with_rng};
pub use correlation::{pairwise_correlation, raw_agreement};
pub use floor::{null_floor, null_floor_with_rng};
pub use reliability::{single_trial_reliability, single_trial_reliability_with_rng};
pub use signal::{Epoch, EpochSet, Recording, Signal, SignalError};

/// Conventional name of the predicted signal in a recording.
pub const DEFAULT_PRED_NAME: &str = "pred";
/// Conventional name of the observed response signal in a recording.
pub const DEFAULT_RESP_NAME: &str = "resp";
/// Default cap on the number of trial pairs sampled by reliability estimation.
pub const DEFAULT_MAX_PAIRS: usize = 100;

/// Errors raised by the estimators. Precondition violations only; degenerate
/// data (nothing finite, too few repeats) resolves to a defined score of 0
/// instead of an error.
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("multi-channel signals not supported (got {channels} channels)")]
    MultiChannel { channels: usize },

    #[error(
        "reliability estimation from exactly one trial pair (two repeats) is not supported; \
         provide at least three repeats"
    )]
    SingleTrialPair,

    #[error("no signal named '{0}' in the recording")]
    MissingSignal(String),

    #[error(
        "prediction and response must be the same length to correlate \
         (prediction has {pred} samples, response has {resp})"
    )]
    LengthMismatch { pred: usize, resp: usize },

    #[error(transparent)]
    Signal(#[from] SignalError),
}
