//! Recommend command - runs the index recommender on an existing profile.

use anyhow::{Context, Result};
use index_structs::{IndexSpec, Namespace};
use recommender::parse_recommendations;
use tracing::info;
use tracker::Experiment;
use workloads::Workload;

use crate::settings::RunSettings;

/// Artifact holding the parsed recommendations.
pub const RECOMMENDATIONS_ARTIFACT: &str = "mindexer_recommended_indexes.json";

/// Prefix for the recommender's captured stdout/stderr artifacts.
pub const MINDEXER_ARTIFACT_PREFIX: &str = "mindexer";

/// Runs the recommend command against whatever `system.profile` currently holds.
///
/// # Errors
///
/// Returns an error if the recommender fails.
pub async fn run(
    workload: &dyn Workload,
    settings: &RunSettings,
    experiment: &mut Experiment,
) -> Result<()> {
    let indexes = recommend_indexes(settings, workload.namespace(), experiment).await?;

    for index in &indexes {
        println!("{index}");
    }

    experiment
        .log_results(
            &serde_json::json!({ "num_recommended_indexes": indexes.len() }),
            None,
        )
        .await?;

    Ok(())
}

/// Invokes the recommender for `namespace`, parses its output and stores the
/// recommendations as an artifact.
///
/// # Errors
///
/// Returns an error if the process cannot be run or exits unsuccessfully.
pub async fn recommend_indexes(
    settings: &RunSettings,
    namespace: &Namespace,
    experiment: &Experiment,
) -> Result<Vec<IndexSpec>> {
    let options = settings.mindexer_options(namespace);
    info!(command = %options.display_command(), "Running index recommender");

    let output = experiment
        .execute_command(options.command(), MINDEXER_ARTIFACT_PREFIX, true)
        .await
        .with_context(|| format!("Index recommender `{}` failed", options.program))?;

    let indexes = parse_recommendations(&output.stdout);

    info!(
        %namespace,
        count = indexes.len(),
        duration_ms = output.duration.as_millis(),
        "Recommendations parsed"
    );

    experiment
        .log_json(&indexes, RECOMMENDATIONS_ARTIFACT)
        .await?;

    Ok(indexes)
}
