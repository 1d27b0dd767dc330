//! Summary statistics over execution-time samples.

use anyhow::{Result, bail};
use serde::Serialize;
use tracing::warn;

/// Minimum number of samples needed before the best and worst run can be dropped.
pub const MIN_SAMPLES_FOR_TRIM: usize = 3;

/// Mean and spread of a series of execution times, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimingSummary {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation (divides by `count`).
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
}

/// Computes mean and population standard deviation of `samples`.
///
/// # Errors
///
/// Returns an error if `samples` is empty or contains a non-finite value.
pub fn summarize(samples: &[f64]) -> Result<TimingSummary> {
    if samples.is_empty() {
        bail!("Cannot summarize an empty set of execution times");
    }
    if let Some(bad) = samples.iter().find(|s| !s.is_finite()) {
        bail!("Execution time samples must be finite, got {bad}");
    }

    #[expect(clippy::cast_precision_loss, reason = "sample counts are small")]
    let n = samples.len() as f64;

    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples
        .iter()
        .map(|sample| {
            let delta = sample - mean;
            delta * delta
        })
        .sum::<f64>()
        / n;

    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(TimingSummary {
        count: samples.len(),
        mean,
        stddev: variance.sqrt(),
        min,
        max,
    })
}

/// Drops the single fastest and slowest sample.
///
/// With fewer than [`MIN_SAMPLES_FOR_TRIM`] samples nothing is dropped.
#[must_use]
pub fn discard_best_worst(samples: &[f64]) -> Vec<f64> {
    if samples.len() < MIN_SAMPLES_FOR_TRIM {
        warn!(
            runs = samples.len(),
            "Not enough runs to discard best/worst. Using all runs."
        );
        return samples.to_vec();
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted[1..sorted.len() - 1].to_vec()
}

/// Summarizes `samples`, optionally dropping the best and worst run first.
///
/// # Errors
///
/// Returns an error if there are no samples.
pub fn summarize_runs(samples: &[f64], discard_extremes: bool) -> Result<TimingSummary> {
    if discard_extremes {
        summarize(&discard_best_worst(samples))
    } else {
        summarize(samples)
    }
}

/// How many times faster the indexed runs were on average.
#[must_use]
pub fn speedup(baseline: &TimingSummary, indexed: &TimingSummary) -> Option<f64> {
    (indexed.mean > 0.0).then(|| baseline.mean / indexed.mean)
}
