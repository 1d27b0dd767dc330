//! Profile command - captures the workload's queries in `system.profile`.

use anyhow::{Context, Result};
use database::{disable_profiling, enable_profiling, profile_to_json, read_profile};
use mongodb::Client;
use tracing::{info, warn};
use tracker::Experiment;
use workloads::Workload;

use super::recommend::recommend_indexes;
use crate::settings::RunSettings;

/// Artifact holding the captured profile entries.
pub const PROFILE_ARTIFACT: &str = "system_profile.json";

/// Runs the profile command: capture the workload, then ask for recommendations.
///
/// # Errors
///
/// Returns an error if profiling, the workload, or the recommender fails.
pub async fn run(
    client: &Client,
    workload: &dyn Workload,
    settings: &RunSettings,
    experiment: &mut Experiment,
) -> Result<()> {
    let profile_count = capture_profile(client, workload, settings.slowms, experiment).await?;

    let indexes = recommend_indexes(settings, workload.namespace(), experiment).await?;

    experiment
        .log_results(
            &serde_json::json!({
                "profile_entries": profile_count,
                "num_recommended_indexes": indexes.len(),
            }),
            None,
        )
        .await?;

    Ok(())
}

/// Profiles one pass of the workload (setup, execute, cleanup) and stores the
/// captured entries as an artifact. Returns the number of entries.
///
/// # Errors
///
/// Returns an error if the collection is missing or any step fails. Profiling
/// is switched off again before a hook error is returned.
pub async fn capture_profile(
    client: &Client,
    workload: &dyn Workload,
    slowms: u32,
    experiment: &Experiment,
) -> Result<u64> {
    let namespace = workload.namespace();

    enable_profiling(client, namespace, slowms)
        .await
        .context("Failed to enable profiling")?;

    info!(workload = %workload.name(), %namespace, "Running workload under the profiler");

    if let Err(e) = run_hooks(client, workload).await {
        if let Err(disable_err) = disable_profiling(client, namespace).await {
            warn!(error = %disable_err, "Failed to disable profiling after workload error");
        }
        return Err(e);
    }

    let profile_count = disable_profiling(client, namespace)
        .await
        .context("Failed to disable profiling")?;

    if profile_count == 0 {
        warn!(
            %namespace,
            slowms,
            "No queries were captured; lower slowms to profile faster queries"
        );
    }

    let entries = read_profile(client, namespace)
        .await
        .context("Failed to read profile entries")?;
    experiment
        .log_json(&profile_to_json(entries), PROFILE_ARTIFACT)
        .await?;

    Ok(profile_count)
}

async fn run_hooks(client: &Client, workload: &dyn Workload) -> Result<()> {
    workload
        .setup(client)
        .await
        .context("Workload setup failed")?;
    workload
        .execute(client)
        .await
        .context("Workload execution failed")?;
    workload
        .cleanup(client)
        .await
        .context("Workload cleanup failed")?;
    Ok(())
}
