//! In-memory signal containers: dense time series, named epochs, and the
//! recording that groups signals for the estimators.
//!
//! A [`Signal`] is a channels × time array of `f64` samples; non-finite
//! samples mean "absent", never zero. Epochs are named half-open sample
//! intervals attached to the signal. The same name may occur several times;
//! each occurrence is one repeat, which is what lets [`Signal::extract_epoch`]
//! build the repeats × channels × time raster the reliability estimator
//! consumes. All containers are immutable once constructed.

use ndarray::{Array2, Array3, ArrayView2, s};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Validation and extraction failures of the signal data model.
#[derive(Error, Debug)]
pub enum SignalError {
    #[error(
        "epoch '{name}' ends at sample {end}, but signal '{signal}' has only {len} samples"
    )]
    EpochOutOfBounds {
        name: String,
        end: usize,
        signal: String,
        len: usize,
    },

    #[error("epoch '{name}' has start {start} after end {end}")]
    EpochInverted {
        name: String,
        start: usize,
        end: usize,
    },

    #[error("signal '{0}' has no channels")]
    NoChannels(String),

    #[error("no epoch named '{0}' in this signal")]
    EpochNotFound(String),
}

/// A named half-open sample interval `[start, end)` within a signal,
/// typically marking one stimulus presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Epoch {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

impl Epoch {
    pub fn new(name: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered collection of possibly-overlapping epochs attached to a signal.
#[derive(Debug, Clone, Default)]
pub struct EpochSet {
    epochs: Vec<Epoch>,
}

impl EpochSet {
    pub fn new(epochs: Vec<Epoch>) -> Self {
        Self { epochs }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Epoch> {
        self.epochs.iter()
    }

    /// Unique epoch names matching `pattern`, sorted ascending. Sorting makes
    /// downstream per-epoch aggregation order deterministic.
    pub fn names_matching(&self, pattern: &Regex) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .epochs
            .iter()
            .map(|e| e.name.as_str())
            .filter(|name| pattern.is_match(name))
            .collect();
        names.into_iter().map(str::to_owned).collect()
    }

    fn occurrences<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Epoch> {
        self.epochs.iter().filter(move |e| e.name == name)
    }
}

/// A named dense time series with attached epochs.
#[derive(Debug, Clone)]
pub struct Signal {
    name: String,
    /// channels × time
    data: Array2<f64>,
    epochs: EpochSet,
}

impl Signal {
    /// Builds a signal, validating that it has at least one channel and that
    /// every epoch lies within the time axis.
    pub fn new(
        name: impl Into<String>,
        data: Array2<f64>,
        epochs: EpochSet,
    ) -> Result<Self, SignalError> {
        let name = name.into();
        if data.nrows() == 0 {
            return Err(SignalError::NoChannels(name));
        }
        let len = data.ncols();
        for e in epochs.iter() {
            if e.start > e.end {
                return Err(SignalError::EpochInverted {
                    name: e.name.clone(),
                    start: e.start,
                    end: e.end,
                });
            }
            if e.end > len {
                return Err(SignalError::EpochOutOfBounds {
                    name: e.name.clone(),
                    end: e.end,
                    signal: name,
                    len,
                });
            }
        }
        Ok(Self { name, data, epochs })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channels(&self) -> usize {
        self.data.nrows()
    }

    /// Number of time samples.
    pub fn len(&self) -> usize {
        self.data.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dense channels × time view. Missing samples appear as NaN.
    pub fn as_continuous(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn epochs(&self) -> &EpochSet {
        &self.epochs
    }

    /// Stacks every occurrence of `name` into a repeats × channels × time
    /// raster, in occurrence order. Occurrences shorter than the longest one
    /// are right-padded with NaN, the same "absent sample" marker used
    /// everywhere else.
    pub fn extract_epoch(&self, name: &str) -> Result<Array3<f64>, SignalError> {
        let occurrences: Vec<&Epoch> = self.epochs.occurrences(name).collect();
        if occurrences.is_empty() {
            return Err(SignalError::EpochNotFound(name.to_owned()));
        }
        let width = occurrences.iter().map(|e| e.len()).max().unwrap_or(0);
        let mut raster =
            Array3::from_elem((occurrences.len(), self.channels(), width), f64::NAN);
        for (repeat, epoch) in occurrences.iter().enumerate() {
            let slab = self.data.slice(s![.., epoch.start..epoch.end]);
            raster
                .slice_mut(s![repeat, .., ..epoch.len()])
                .assign(&slab);
        }
        Ok(raster)
    }

    /// The "folded" view: one raster per requested name.
    pub fn extract_epochs(
        &self,
        names: &[String],
    ) -> Result<BTreeMap<String, Array3<f64>>, SignalError> {
        names
            .iter()
            .map(|name| Ok((name.clone(), self.extract_epoch(name)?)))
            .collect()
    }
}

/// An addressable, read-only collection of named signals. The estimators'
/// sole input container.
#[derive(Debug, Clone, Default)]
pub struct Recording {
    signals: BTreeMap<String, Signal>,
}

impl Recording {
    pub fn new(signals: impl IntoIterator<Item = Signal>) -> Self {
        Self {
            signals: signals
                .into_iter()
                .map(|s| (s.name().to_owned(), s))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Signal> {
        self.signals.get(name)
    }
}
