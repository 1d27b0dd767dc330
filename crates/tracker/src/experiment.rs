//! Experiment runs and their stored output.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use object_store::ObjectStore;
use object_store::path::Path as ObjectStorePath;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{Params, Result, TrackerError};

/// Top-level folder for all runs inside the store.
const RUNS_DIR: &str = "runs";

const METADATA_FILE: &str = "metadata.json";
const PARAMS_FILE: &str = "params.json";
const RESULTS_FILE: &str = "results.json";
const ARTIFACTS_DIR: &str = "artifacts";

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExperimentStatus {
    Running,
    Completed,
    Failed,
}

/// Contents of `metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentMetadata {
    pub id: Uuid,
    pub name: String,
    pub command: String,
    pub status: ExperimentStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// One logged result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub step: Option<usize>,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub values: Map<String, Value>,
}

/// Captured output of a subprocess.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

/// A single tracked run.
pub struct Experiment {
    store: Arc<dyn ObjectStore>,
    metadata: ExperimentMetadata,
    params: Params,
    results: Vec<ResultRow>,
}

fn experiment_dir(id: Uuid) -> String {
    format!("{RUNS_DIR}/{id}")
}

impl Experiment {
    /// Starts a run and writes its metadata and parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the store fails.
    pub async fn start(
        store: Arc<dyn ObjectStore>,
        name: impl Into<String>,
        command: impl Into<String>,
        params: Params,
    ) -> Result<Self> {
        let metadata = ExperimentMetadata {
            id: Uuid::new_v4(),
            name: name.into(),
            command: command.into(),
            status: ExperimentStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            error: None,
        };

        let experiment = Self {
            store,
            metadata,
            params,
            results: Vec::new(),
        };

        experiment.write_metadata().await?;
        experiment
            .put(PARAMS_FILE, serde_json::to_string_pretty(&experiment.params)?)
            .await?;

        info!(
            experiment_id = %experiment.id(),
            name = %experiment.metadata.name,
            command = %experiment.metadata.command,
            "Experiment started"
        );

        Ok(experiment)
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.metadata.id
    }

    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }

    #[must_use]
    pub const fn metadata(&self) -> &ExperimentMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn results(&self) -> &[ResultRow] {
        &self.results
    }

    /// Store path of this run's directory.
    #[must_use]
    pub fn dir(&self) -> String {
        experiment_dir(self.id())
    }

    /// Stores `content` as the text artifact `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the store fails.
    pub async fn log_text(&self, content: impl Into<String>, name: &str) -> Result<()> {
        self.put(&format!("{ARTIFACTS_DIR}/{name}"), content.into())
            .await?;
        debug!(experiment_id = %self.id(), artifact = name, "Artifact stored");
        Ok(())
    }

    /// Stores `value` as pretty-printed JSON artifact `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn log_json<T: Serialize + ?Sized>(&self, value: &T, name: &str) -> Result<()> {
        self.log_text(serde_json::to_string_pretty(value)?, name)
            .await
    }

    /// Appends a result row and rewrites `results.json`.
    ///
    /// `values` must serialize to a JSON object.
    ///
    /// # Errors
    ///
    /// Returns a validation error for non-object values, or a store error.
    pub async fn log_results<T: Serialize + ?Sized>(
        &mut self,
        values: &T,
        step: Option<usize>,
    ) -> Result<()> {
        let Value::Object(values) = serde_json::to_value(values)? else {
            return Err(TrackerError::Validation(
                "Result rows must be JSON objects".to_string(),
            ));
        };

        debug!(experiment_id = %self.id(), ?step, ?values, "Logging results");

        self.results.push(ResultRow {
            step,
            timestamp: Utc::now(),
            values,
        });

        self.put(RESULTS_FILE, serde_json::to_string_pretty(&self.results)?)
            .await
    }

    /// Runs `command`, stores its stdout and stderr as `<prefix>_stdout.txt`
    /// and `<prefix>_stderr.txt`, and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned, or
    /// [`TrackerError::CommandFailed`] when it exits unsuccessfully and
    /// `raise_on_error` is set.
    pub async fn execute_command(
        &self,
        mut command: Command,
        prefix: &str,
        raise_on_error: bool,
    ) -> Result<CommandOutput> {
        let program = command.as_std().get_program().to_string_lossy().into_owned();
        info!(experiment_id = %self.id(), %program, "Running command");

        let started = Instant::now();
        let output = command.output().await?;
        let duration = started.elapsed();

        let captured = CommandOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration,
        };

        self.log_text(captured.stdout.clone(), &format!("{prefix}_stdout.txt"))
            .await?;
        self.log_text(captured.stderr.clone(), &format!("{prefix}_stderr.txt"))
            .await?;

        if !captured.success {
            warn!(%program, code = ?captured.code, "Command exited unsuccessfully");
            if raise_on_error {
                return Err(TrackerError::CommandFailed {
                    program,
                    code: captured.code,
                    stderr: captured.stderr.trim().to_string(),
                });
            }
        }

        info!(%program, duration_ms = duration.as_millis(), "Command finished");

        Ok(captured)
    }

    /// Marks the run completed.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the metadata fails.
    pub async fn complete(&mut self) -> Result<()> {
        self.finish(ExperimentStatus::Completed, None).await
    }

    /// Marks the run failed with `error`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the metadata fails.
    pub async fn fail(&mut self, error: &str) -> Result<()> {
        self.finish(ExperimentStatus::Failed, Some(error.to_string()))
            .await
    }

    async fn finish(&mut self, status: ExperimentStatus, error: Option<String>) -> Result<()> {
        self.metadata.status = status;
        self.metadata.finished_at = Some(Utc::now());
        self.metadata.error = error;
        self.write_metadata().await?;

        info!(experiment_id = %self.id(), %status, "Experiment finished");

        Ok(())
    }

    async fn write_metadata(&self) -> Result<()> {
        self.put(METADATA_FILE, serde_json::to_string_pretty(&self.metadata)?)
            .await
    }

    async fn put(&self, relative: &str, content: String) -> Result<()> {
        let path = ObjectStorePath::from(format!("{}/{relative}", self.dir()));
        self.store.put(&path, Bytes::from(content).into()).await?;
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    store: &dyn ObjectStore,
    id: Uuid,
    file: &str,
) -> Result<T> {
    let path = ObjectStorePath::from(format!("{}/{file}", experiment_dir(id)));
    let bytes = store.get(&path).await?.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Reads a stored run's metadata.
///
/// # Errors
///
/// Returns an error if the run does not exist or the file is malformed.
pub async fn load_metadata(store: &dyn ObjectStore, id: Uuid) -> Result<ExperimentMetadata> {
    read_json(store, id, METADATA_FILE).await
}

/// Reads a stored run's result rows. A run that logged nothing has no rows.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is malformed.
pub async fn load_results(store: &dyn ObjectStore, id: Uuid) -> Result<Vec<ResultRow>> {
    match read_json(store, id, RESULTS_FILE).await {
        Err(TrackerError::Store(object_store::Error::NotFound { .. })) => Ok(Vec::new()),
        other => other,
    }
}
