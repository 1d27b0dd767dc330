//! Run settings resolved from experiment parameters.

use anyhow::{Context, Result, bail};
use config::Config;
use index_structs::Namespace;
use recommender::{DEFAULT_SAMPLE_RATIO, MindexerOptions};
use serde_json::json;
use tracker::Params;
use workloads::{WorkloadError, WorkloadName};

/// Default workload when none is configured.
pub const DEFAULT_WORKLOAD: &str = "test";

/// Default profiler threshold in milliseconds.
pub const DEFAULT_SLOWMS: u32 = 100;

/// Settings shared by all benchmark commands.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub uri: String,
    pub workload: String,
    /// Replaces the workload's default namespace when set.
    pub namespace: Option<Namespace>,
    pub slowms: u32,
    pub num_runs: usize,
    pub discard_best_worst: bool,
    pub mindexer_bin: String,
    pub sample_ratio: f64,
    pub max_indexes: u32,
    pub verbose: bool,
}

impl RunSettings {
    /// Resolves settings, falling back to `config` for the URI and executable.
    ///
    /// `db` and `collection` override the workload namespace; when only one is
    /// given the other comes from the workload's default.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter has the wrong type or an invalid value.
    pub fn from_params(params: &Params, config: &Config) -> Result<Self> {
        let uri: String = params.get("uri", config.mongodb_uri.clone())?;
        let workload: String = match params.lookup("workload") {
            None => DEFAULT_WORKLOAD.to_string(),
            Some(_) => params.get("workload", String::new())?,
        };
        if workload.trim().is_empty() {
            return Err(WorkloadError::Missing.into());
        }
        let slowms: u32 = params.get("slowms", DEFAULT_SLOWMS)?;
        let num_runs: usize = params.get("num_runs", 1)?;
        let discard_best_worst: bool = params.get("discard_best_worst", false)?;
        let mindexer_bin: String = params.get("mindexer.bin", config.mindexer_bin.clone())?;
        let sample_ratio: f64 = params.get("mindexer.sample_ratio", DEFAULT_SAMPLE_RATIO)?;
        let max_indexes: u32 = params.get("mindexer.max_indexes", 0)?;
        let verbose: bool = params.get("mindexer.verbose", false)?;

        if num_runs == 0 {
            bail!("num_runs must be at least 1");
        }
        if !(sample_ratio > 0.0 && sample_ratio <= 1.0) {
            bail!("mindexer.sample_ratio must be in (0, 1], got {sample_ratio}");
        }

        let db: Option<String> = params.get("db", None)?;
        let collection: Option<String> = params.get("collection", None)?;
        let namespace = if db.is_some() || collection.is_some() {
            let name: WorkloadName = workload
                .trim()
                .parse()
                .with_context(|| format!("Unknown workload: {workload}"))?;
            let (default_db, default_collection) = name.default_namespace();
            Some(Namespace::new(
                db.unwrap_or_else(|| default_db.to_string()),
                collection.unwrap_or_else(|| default_collection.to_string()),
            )?)
        } else {
            None
        };

        Ok(Self {
            uri,
            workload,
            namespace,
            slowms,
            num_runs,
            discard_best_worst,
            mindexer_bin,
            sample_ratio,
            max_indexes,
            verbose,
        })
    }

    /// Recommender options for `namespace`.
    #[must_use]
    pub fn mindexer_options(&self, namespace: &Namespace) -> MindexerOptions {
        MindexerOptions::new(&self.mindexer_bin, &self.uri, namespace.clone())
            .with_sample_ratio(self.sample_ratio)
            .with_max_indexes(self.max_indexes)
            .with_verbose(self.verbose)
    }

    /// Writes the resolved values back so the stored parameters are complete.
    pub fn record_into(&self, params: &mut Params) {
        params.set_default("uri", json!(self.uri));
        params.set_default("workload", json!(self.workload));
        params.set_default("slowms", json!(self.slowms));
        params.set_default("num_runs", json!(self.num_runs));
        params.set_default("discard_best_worst", json!(self.discard_best_worst));
        params.set_default("mindexer.sample_ratio", json!(self.sample_ratio));
        params.set_default("mindexer.max_indexes", json!(self.max_indexes));
        params.set_default("mindexer.verbose", json!(self.verbose));
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn config() -> Config {
        Config {
            mongodb_uri: "mongodb://db.internal:27017".to_string(),
            mindexer_bin: "mindexer".to_string(),
            base_path: PathBuf::from("experiments"),
        }
    }

    fn params(value: serde_json::Value) -> Params {
        Params::from_value(value).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = RunSettings::from_params(&Params::new(), &config()).unwrap();
        assert_eq!(settings.uri, "mongodb://db.internal:27017");
        assert_eq!(settings.workload, "test");
        assert_eq!(settings.slowms, 100);
        assert_eq!(settings.num_runs, 1);
        assert!(!settings.discard_best_worst);
        assert!((settings.sample_ratio - 0.01).abs() < f64::EPSILON);
        assert_eq!(settings.max_indexes, 0);
        assert!(!settings.verbose);
        assert!(settings.namespace.is_none());
    }

    #[test]
    fn test_nested_mindexer_params() {
        let settings = RunSettings::from_params(
            &params(json!({
                "workload": "ember",
                "num_runs": 5,
                "discard_best_worst": true,
                "mindexer": { "sample_ratio": 0.2, "max_indexes": 4, "verbose": true }
            })),
            &config(),
        )
        .unwrap();

        assert_eq!(settings.num_runs, 5);
        assert!(settings.discard_best_worst);

        let namespace = Namespace::new("ember2018", "ember_train").unwrap();
        let options = settings.mindexer_options(&namespace);
        assert!((options.sample_ratio - 0.2).abs() < f64::EPSILON);
        assert_eq!(options.max_indexes, 4);
        assert!(options.verbose);
        assert_eq!(options.uri, "mongodb://db.internal:27017");
    }

    #[test]
    fn test_partial_namespace_override() {
        let settings = RunSettings::from_params(
            &params(json!({ "workload": "test", "collection": "ember_small" })),
            &config(),
        )
        .unwrap();
        assert_eq!(
            settings.namespace.unwrap().to_string(),
            "ember2018.ember_small"
        );
    }

    #[test]
    fn test_invalid_values() {
        assert!(RunSettings::from_params(&params(json!({ "num_runs": 0 })), &config()).is_err());
        assert!(RunSettings::from_params(&params(json!({ "slowms": -5 })), &config()).is_err());
        assert!(
            RunSettings::from_params(
                &params(json!({ "mindexer": { "sample_ratio": 1.5 } })),
                &config()
            )
            .is_err()
        );
    }

    #[test]
    fn test_null_or_blank_workload_is_missing() {
        for value in [json!(null), json!(""), json!("  ")] {
            let err = RunSettings::from_params(&params(json!({ "workload": value })), &config())
                .unwrap_err();
            assert_eq!(err.to_string(), "Workload configuration is missing.");
        }
    }

    #[test]
    fn test_record_into_fills_missing_params() {
        let mut stored = params(json!({ "slowms": 20 }));
        let settings = RunSettings::from_params(&stored, &config()).unwrap();
        settings.record_into(&mut stored);

        assert_eq!(stored.lookup("slowms"), Some(&json!(20)));
        assert_eq!(stored.lookup("workload"), Some(&json!("test")));
        assert_eq!(stored.lookup("mindexer.max_indexes"), Some(&json!(0)));
    }
}
