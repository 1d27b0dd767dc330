//! Nested experiment parameters addressed by dotted keys.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{Result, TrackerError};

/// Experiment parameters, e.g. `{"slowms": 100, "mindexer": {"sample_ratio": 0.01}}`.
///
/// `mindexer.sample_ratio` addresses the nested value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Params {
    root: Map<String, Value>,
}

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds parameters from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the value is not an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(TrackerError::Validation(format!(
                "Parameters must be a JSON object, got {other}"
            ))),
        }
    }

    /// Loads parameters from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON object.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&content)?;
        Self::from_value(value)
    }

    /// Sets a value, creating intermediate objects for dotted keys.
    pub fn set(&mut self, key: &str, value: Value) {
        let mut parts: Vec<&str> = key.split('.').collect();
        let Some(last) = parts.pop() else {
            return;
        };

        let mut current = &mut self.root;
        for part in parts {
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(next) = entry else {
                return;
            };
            current = next;
        }

        current.insert(last.to_string(), value);
    }

    /// Applies a `key=value` override. The value is parsed as JSON and kept
    /// as a plain string when that fails.
    ///
    /// # Errors
    ///
    /// Returns a validation error if there is no `=` or the key is empty.
    pub fn apply_override(&mut self, assignment: &str) -> Result<()> {
        let Some((key, raw)) = assignment.split_once('=') else {
            return Err(TrackerError::Validation(format!(
                "Parameter override must look like key=value, got {assignment}"
            )));
        };

        let key = key.trim();
        if key.is_empty() || key.split('.').any(str::is_empty) {
            return Err(TrackerError::Validation(format!(
                "Invalid parameter name in override {assignment}"
            )));
        }

        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        self.set(key, value);

        Ok(())
    }

    /// Looks up a raw value by dotted key.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        let mut parts = key.split('.');
        let first = parts.next()?;
        let mut current = self.root.get(first)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Returns the typed value for `key`, or `default` when it is absent or null.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the value has the wrong type.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        match self.lookup(key) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                TrackerError::Validation(format!("Invalid value for parameter {key}: {e}"))
            }),
        }
    }

    /// Sets `key` only if it is not present yet.
    pub fn set_default(&mut self, key: &str, value: Value) {
        if self.lookup(key).is_none() {
            self.set(key, value);
        }
    }

    /// The parameters as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_dotted_lookup() {
        let params = Params::from_value(json!({
            "slowms": 50,
            "mindexer": { "sample_ratio": 0.1, "verbose": true }
        }))
        .unwrap();

        assert_eq!(params.get("slowms", 100u32).unwrap(), 50);
        assert!((params.get("mindexer.sample_ratio", 0.01f64).unwrap() - 0.1).abs() < f64::EPSILON);
        assert!(params.get("mindexer.verbose", false).unwrap());
        assert_eq!(params.get("mindexer.max_indexes", 0u32).unwrap(), 0);
        assert_eq!(params.get("num_runs", 1usize).unwrap(), 1);
    }

    #[test]
    fn test_wrong_type_is_validation_error() {
        let params = Params::from_value(json!({ "num_runs": "three" })).unwrap();
        let err = params.get("num_runs", 1usize).unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
    }

    #[test]
    fn test_overrides() {
        let mut params = Params::new();
        params.apply_override("workload=test").unwrap();
        params.apply_override("mindexer.max_indexes=3").unwrap();
        params.apply_override("discard_best_worst=true").unwrap();

        assert_eq!(
            params.to_value(),
            json!({
                "workload": "test",
                "mindexer": { "max_indexes": 3 },
                "discard_best_worst": true
            })
        );
    }

    #[test]
    fn test_override_replaces_scalar_with_object() {
        let mut params = Params::from_value(json!({ "mindexer": 1 })).unwrap();
        params.apply_override("mindexer.verbose=true").unwrap();
        assert_eq!(params.lookup("mindexer.verbose"), Some(&json!(true)));
    }

    #[test]
    fn test_invalid_overrides() {
        let mut params = Params::new();
        assert!(params.apply_override("no_equals").is_err());
        assert!(params.apply_override("=1").is_err());
        assert!(params.apply_override("a..b=1").is_err());
    }

    #[test]
    fn test_set_default_keeps_existing() {
        let mut params = Params::from_value(json!({ "slowms": 5 })).unwrap();
        params.set_default("slowms", json!(100));
        params.set_default("num_runs", json!(1));
        assert_eq!(params.to_value(), json!({ "slowms": 5, "num_runs": 1 }));
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(Params::from_value(json!([1, 2])).is_err());
    }
}
