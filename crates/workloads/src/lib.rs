//! Benchmark workloads.
//!
//! A workload is a namespace plus three lifecycle hooks. Only `execute` is
//! timed; `setup` and `cleanup` run around it during profiling.

use core::str::FromStr;

use async_trait::async_trait;
use index_structs::{Namespace, NamespaceError};
use mongodb::Client;
use strum::IntoEnumIterator;

mod ember;
mod linkbench;
mod query;
mod test_workload;

pub use ember::EmberWorkload;
pub use linkbench::LinkbenchWorkload;
pub use query::{QuerySpec, run_queries};
pub use test_workload::TestWorkload;

/// A benchmark scenario run against one namespace.
#[async_trait]
pub trait Workload: Send + Sync {
    /// Registry name of the workload.
    fn name(&self) -> WorkloadName;

    /// Namespace the workload reads from.
    fn namespace(&self) -> &Namespace;

    /// Called before the workload is executed during profiling.
    async fn setup(&self, _client: &Client) -> anyhow::Result<()> {
        Ok(())
    }

    /// Executes the workload queries.
    async fn execute(&self, client: &Client) -> anyhow::Result<()>;

    /// Called after the workload is executed during profiling.
    async fn cleanup(&self, _client: &Client) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Names of the built-in workloads.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WorkloadName {
    Ember,
    Linkbench,
    Test,
}

impl WorkloadName {
    /// Database and collection the workload targets unless overridden.
    #[must_use]
    pub const fn default_namespace(self) -> (&'static str, &'static str) {
        match self {
            Self::Ember => ("ember2018", "ember_train"),
            Self::Linkbench => ("linkbench", "linktable"),
            Self::Test => ("ember2018", "ember_test"),
        }
    }

    /// Comma separated list of every registered name.
    #[must_use]
    pub fn available() -> String {
        Self::iter()
            .map(|name| <&'static str>::from(name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Errors raised when resolving a workload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkloadError {
    #[error("Workload configuration is missing.")]
    Missing,
    #[error("Unknown workload: {name}. Available workloads: {available}")]
    Unknown { name: String, available: String },
    #[error(transparent)]
    Namespace(#[from] NamespaceError),
}

/// Creates the workload registered under `name`.
///
/// `namespace` replaces the workload's default database/collection when given.
///
/// # Errors
///
/// Returns an error if the name is empty or unknown.
pub fn get_workload(
    name: &str,
    namespace: Option<Namespace>,
) -> Result<Box<dyn Workload>, WorkloadError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WorkloadError::Missing);
    }

    let workload_name = WorkloadName::from_str(name).map_err(|_| WorkloadError::Unknown {
        name: name.to_string(),
        available: WorkloadName::available(),
    })?;

    let namespace = match namespace {
        Some(namespace) => namespace,
        None => {
            let (db, collection) = workload_name.default_namespace();
            Namespace::new(db, collection)?
        }
    };

    let workload: Box<dyn Workload> = match workload_name {
        WorkloadName::Ember => Box::new(EmberWorkload::new(namespace)),
        WorkloadName::Linkbench => Box::new(LinkbenchWorkload::new(namespace)),
        WorkloadName::Test => Box::new(TestWorkload::new(namespace)),
    };

    Ok(workload)
}
