//! CLI command implementations.

pub mod evaluate;
pub mod profile;
pub mod recommend;
pub mod show;
pub mod workloads;

use anyhow::Result;
use tracing::error;
use tracker::Experiment;

/// Records the outcome of `result` on the experiment and passes it through.
///
/// A failed run is marked `failed` before the error propagates.
///
/// # Errors
///
/// Returns the error carried by `result`, or the tracker error if the outcome cannot be stored.
pub async fn finish_experiment<T>(experiment: &mut Experiment, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            experiment.complete().await?;
            Ok(value)
        }
        Err(e) => {
            error!(experiment_id = %experiment.id(), error = %format!("{e:#}"), "Experiment failed");
            if let Err(store_err) = experiment.fail(&format!("{e:#}")).await {
                error!(error = %store_err, "Failed to record experiment failure");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::anyhow;
    use object_store::ObjectStore;
    use object_store::local::LocalFileSystem;
    use tempfile::TempDir;
    use tracker::{ExperimentStatus, Params, load_metadata};

    use super::*;

    async fn start() -> (TempDir, Arc<dyn ObjectStore>, Experiment) {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn ObjectStore> =
            Arc::new(LocalFileSystem::new_with_prefix(dir.path()).unwrap());
        let experiment = Experiment::start(store.clone(), "test-evaluate", "evaluate", Params::new())
            .await
            .unwrap();
        (dir, store, experiment)
    }

    #[tokio::test]
    async fn test_failed_run_is_marked_and_error_returned() {
        let (_dir, store, mut experiment) = start().await;

        let err = finish_experiment::<()>(
            &mut experiment,
            Err(anyhow!("no indexes").context("Evaluation aborted")),
        )
        .await
        .unwrap_err();
        assert_eq!(format!("{err:#}"), "Evaluation aborted: no indexes");

        let metadata = load_metadata(store.as_ref(), experiment.id()).await.unwrap();
        assert_eq!(metadata.status, ExperimentStatus::Failed);
        assert_eq!(metadata.error.as_deref(), Some("Evaluation aborted: no indexes"));
        assert!(metadata.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_successful_run_is_marked_completed() {
        let (_dir, store, mut experiment) = start().await;

        let value = finish_experiment(&mut experiment, Ok(7)).await.unwrap();
        assert_eq!(value, 7);

        let metadata = load_metadata(store.as_ref(), experiment.id()).await.unwrap();
        assert_eq!(metadata.status, ExperimentStatus::Completed);
        assert!(metadata.error.is_none());
    }
}
