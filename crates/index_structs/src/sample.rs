use serde::Serialize;

/// One timed execution of a workload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExecTimeSample {
    /// Zero-based run number within its series.
    #[serde(skip)]
    pub step: usize,

    /// Whether the recommended indexes were in place.
    #[serde(rename = "index")]
    pub indexed: bool,

    /// Wall-clock duration in seconds.
    #[serde(rename = "exec_time")]
    pub seconds: f64,
}

impl ExecTimeSample {
    #[must_use]
    pub const fn new(step: usize, indexed: bool, seconds: f64) -> Self {
        Self {
            step,
            indexed,
            seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_serializes_as_result_row() {
        let sample = ExecTimeSample::new(3, true, 0.25);
        let json = serde_json::to_value(sample).unwrap();
        assert_eq!(json, serde_json::json!({"index": true, "exec_time": 0.25}));
    }
}
