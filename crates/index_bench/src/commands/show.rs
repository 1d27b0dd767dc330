//! Show command - prints a stored run's metadata and results.

use core::fmt::Write as _;

use anyhow::{Context, Result};
use object_store::ObjectStore;
use tracker::{ExperimentMetadata, ResultRow, load_metadata, load_results};
use uuid::Uuid;

/// Loads and prints the run `id`.
///
/// # Errors
///
/// Returns an error if the run does not exist or its files are malformed.
pub async fn run(store: &dyn ObjectStore, id: Uuid) -> Result<()> {
    let metadata = load_metadata(store, id)
        .await
        .with_context(|| format!("No experiment with id {id}"))?;
    let results = load_results(store, id).await?;

    print!("{}", render(&metadata, &results));

    Ok(())
}

/// Human readable report of a run.
#[must_use]
pub fn render(metadata: &ExperimentMetadata, results: &[ResultRow]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "id:       {}", metadata.id);
    let _ = writeln!(out, "name:     {}", metadata.name);
    let _ = writeln!(out, "command:  {}", metadata.command);
    let _ = writeln!(out, "status:   {}", metadata.status);
    let _ = writeln!(out, "started:  {}", metadata.started_at.to_rfc3339());
    if let Some(finished_at) = metadata.finished_at {
        let _ = writeln!(out, "finished: {}", finished_at.to_rfc3339());
    }
    if let Some(error) = &metadata.error {
        let _ = writeln!(out, "error:    {error}");
    }

    if results.is_empty() {
        let _ = writeln!(out, "results:  none");
        return out;
    }

    let _ = writeln!(out, "results:");
    for row in results {
        let step = row
            .step
            .map_or_else(|| "-".to_string(), |step| step.to_string());
        let values = serde_json::Value::Object(row.values.clone());
        let _ = writeln!(out, "  [{step}] {values}");
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use tracker::ExperimentStatus;

    use super::*;

    fn metadata() -> ExperimentMetadata {
        ExperimentMetadata {
            id: Uuid::nil(),
            name: "ember-5".to_string(),
            command: "evaluate".to_string(),
            status: ExperimentStatus::Failed,
            started_at: Utc::now(),
            finished_at: None,
            error: Some("The recommender returned no indexes".to_string()),
        }
    }

    #[test]
    fn test_render_failed_run_without_results() {
        let report = render(&metadata(), &[]);
        assert!(report.contains("status:   failed"));
        assert!(report.contains("error:    The recommender returned no indexes"));
        assert!(report.ends_with("results:  none\n"));
    }

    #[test]
    fn test_render_rows_with_steps() {
        let serde_json::Value::Object(values) = json!({ "exec_time": 0.5, "index": true }) else {
            unreachable!()
        };
        let rows = [
            ResultRow {
                step: Some(2),
                timestamp: Utc::now(),
                values: values.clone(),
            },
            ResultRow {
                step: None,
                timestamp: Utc::now(),
                values,
            },
        ];

        let report = render(&metadata(), &rows);
        assert!(report.contains("  [2] {\"exec_time\":0.5,\"index\":true}"));
        assert!(report.contains("  [-] "));
    }
}
