//! Evaluate command - profile, recommend, then time the workload with and
//! without the recommended indexes.

use std::time::Instant;

use anyhow::{Context, Result, bail};
use database::{create_indexes, drop_indexes, list_indexes};
use index_structs::{ExecTimeSample, IndexSpec, Namespace};
use mongodb::Client;
use serde::Serialize;
use tracing::{debug, info};
use tracker::Experiment;
use workloads::Workload;

use super::profile::capture_profile;
use super::recommend::recommend_indexes;
use crate::settings::RunSettings;
use crate::stats::{TimingSummary, speedup, summarize_runs};

/// Final result row of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub mean_exec_time_no_indexes: f64,
    pub stddev_exec_time_no_indexes: f64,
    pub mean_exec_time_with_indexes: f64,
    pub stddev_exec_time_with_indexes: f64,
    pub num_recommended_indexes: usize,
    pub speedup: Option<f64>,
}

impl EvaluationSummary {
    /// Aggregates both timing series.
    ///
    /// # Errors
    ///
    /// Returns an error if either series is empty.
    pub fn from_runs(
        no_indexes: &[f64],
        with_indexes: &[f64],
        num_recommended_indexes: usize,
        discard_best_worst: bool,
    ) -> Result<Self> {
        let baseline = summarize_runs(no_indexes, discard_best_worst)
            .context("Failed to summarize runs without indexes")?;
        let indexed = summarize_runs(with_indexes, discard_best_worst)
            .context("Failed to summarize runs with indexes")?;

        Ok(Self::new(&baseline, &indexed, num_recommended_indexes))
    }

    #[must_use]
    pub fn new(
        baseline: &TimingSummary,
        indexed: &TimingSummary,
        num_recommended_indexes: usize,
    ) -> Self {
        Self {
            mean_exec_time_no_indexes: baseline.mean,
            stddev_exec_time_no_indexes: baseline.stddev,
            mean_exec_time_with_indexes: indexed.mean,
            stddev_exec_time_with_indexes: indexed.stddev,
            num_recommended_indexes,
            speedup: speedup(baseline, indexed),
        }
    }
}

/// Runs the full evaluation pipeline.
///
/// # Errors
///
/// Returns an error if profiling or the recommender fails, nothing was
/// recommended, or any timed run fails.
pub async fn run(
    client: &Client,
    workload: &dyn Workload,
    settings: &RunSettings,
    experiment: &mut Experiment,
) -> Result<EvaluationSummary> {
    capture_profile(client, workload, settings.slowms, experiment).await?;

    let indexes = recommend_indexes(settings, workload.namespace(), experiment).await?;
    ensure_recommendations(&indexes, workload.namespace())?;

    let no_indexes = timed_series(client, workload, &[], settings.num_runs, experiment).await?;
    let with_indexes =
        timed_series(client, workload, &indexes, settings.num_runs, experiment).await?;

    let summary = EvaluationSummary::from_runs(
        &no_indexes,
        &with_indexes,
        indexes.len(),
        settings.discard_best_worst,
    )?;

    info!(
        mean_no_indexes = summary.mean_exec_time_no_indexes,
        mean_with_indexes = summary.mean_exec_time_with_indexes,
        speedup = ?summary.speedup,
        "Evaluation finished"
    );

    experiment.log_results(&summary, None).await?;

    Ok(summary)
}

/// Fails when there is nothing to compare against the unindexed baseline.
///
/// # Errors
///
/// Returns an error if `indexes` is empty.
pub fn ensure_recommendations(indexes: &[IndexSpec], namespace: &Namespace) -> Result<()> {
    if indexes.is_empty() {
        bail!("The recommender returned no indexes for {namespace}; nothing to evaluate");
    }
    Ok(())
}

/// Times `num_runs` executions with exactly `indexes` in place and logs one
/// result row per run.
async fn timed_series(
    client: &Client,
    workload: &dyn Workload,
    indexes: &[IndexSpec],
    num_runs: usize,
    experiment: &mut Experiment,
) -> Result<Vec<f64>> {
    let indexed = !indexes.is_empty();
    let mut samples = Vec::with_capacity(num_runs);

    for step in 0..num_runs {
        info!(run = step + 1, num_runs, indexed, "Starting timed run");

        let sample = timed_run(client, workload, indexes, step)
            .await
            .with_context(|| format!("Timed run {}/{num_runs} failed", step + 1))?;
        experiment.log_results(&sample, Some(sample.step)).await?;

        samples.push(sample.seconds);
    }

    Ok(samples)
}

async fn timed_run(
    client: &Client,
    workload: &dyn Workload,
    indexes: &[IndexSpec],
    step: usize,
) -> Result<ExecTimeSample> {
    let namespace = workload.namespace();

    drop_indexes(client, namespace).await?;
    create_indexes(client, namespace, indexes).await?;
    let in_place = list_indexes(client, namespace).await?;
    debug!(%namespace, indexes = ?in_place, "Indexes in place");

    let started = Instant::now();
    workload.execute(client).await?;
    let elapsed = started.elapsed().as_secs_f64();

    info!(%namespace, exec_time = elapsed, "Workload executed");

    Ok(ExecTimeSample::new(step, !indexes.is_empty(), elapsed))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_summary_row_keys() {
        let summary = EvaluationSummary::from_runs(&[2.0, 4.0], &[1.0, 1.0], 2, false).unwrap();
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({
                "mean_exec_time_no_indexes": 3.0,
                "stddev_exec_time_no_indexes": 1.0,
                "mean_exec_time_with_indexes": 1.0,
                "stddev_exec_time_with_indexes": 0.0,
                "num_recommended_indexes": 2,
                "speedup": 3.0
            })
        );
    }

    #[test]
    fn test_summary_discards_extremes_per_series() {
        let summary = EvaluationSummary::from_runs(
            &[10.0, 1.0, 2.0, 3.0],
            &[0.5, 0.1, 0.9, 0.5],
            1,
            true,
        )
        .unwrap();
        assert!((summary.mean_exec_time_no_indexes - 2.5).abs() < 1e-9);
        assert!((summary.mean_exec_time_with_indexes - 0.5).abs() < 1e-9);
        assert!(summary.stddev_exec_time_with_indexes.abs() < 1e-9);
        assert!((summary.speedup.unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_recommendations_abort() {
        let namespace = Namespace::new("ember2018", "ember_test").unwrap();
        let err = ensure_recommendations(&[], &namespace).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The recommender returned no indexes for ember2018.ember_test; nothing to evaluate"
        );

        let indexes = [IndexSpec::new([("appeared", index_structs::Direction::Ascending)]).unwrap()];
        assert!(ensure_recommendations(&indexes, &namespace).is_ok());
    }

    #[test]
    fn test_summary_rejects_empty_series() {
        assert!(EvaluationSummary::from_runs(&[], &[1.0], 1, false).is_err());
    }
}
