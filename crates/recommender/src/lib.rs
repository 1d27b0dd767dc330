//! Wrapper around the external `mindexer` index recommendation tool.
//!
//! The tool is driven as a subprocess. Its only contract is the text it
//! prints: a `>> recommending` marker line followed by one index literal
//! per line, e.g. `{'appeared': 1, 'general.size': -1}`.

use std::ffi::OsString;
use std::process::Stdio;

use index_structs::Namespace;
use tokio::process::Command;

mod parser;

pub use parser::{ParseError, RECOMMENDATION_MARKER, parse_index_literal, parse_recommendations};

/// Default fraction of the collection the recommender samples.
pub const DEFAULT_SAMPLE_RATIO: f64 = 0.01;

/// Options for one recommender invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct MindexerOptions {
    /// Executable name or path.
    pub program: String,
    /// MongoDB connection string passed through to the tool.
    pub uri: String,
    /// Namespace whose profile is analysed.
    pub namespace: Namespace,
    /// Fraction of documents sampled for cardinality estimates.
    pub sample_ratio: f64,
    /// Maximum number of indexes to recommend (0 means no limit).
    pub max_indexes: u32,
    /// Pass `-v` to the tool.
    pub verbose: bool,
}

impl MindexerOptions {
    /// Options with the tool's default sampling and no index limit.
    #[must_use]
    pub fn new(program: impl Into<String>, uri: impl Into<String>, namespace: Namespace) -> Self {
        Self {
            program: program.into(),
            uri: uri.into(),
            namespace,
            sample_ratio: DEFAULT_SAMPLE_RATIO,
            max_indexes: 0,
            verbose: false,
        }
    }

    #[must_use]
    pub const fn with_sample_ratio(mut self, sample_ratio: f64) -> Self {
        self.sample_ratio = sample_ratio;
        self
    }

    #[must_use]
    pub const fn with_max_indexes(mut self, max_indexes: u32) -> Self {
        self.max_indexes = max_indexes;
        self
    }

    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Command-line arguments, without the program name.
    #[must_use]
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--uri".into(),
            self.uri.clone().into(),
            "-d".into(),
            self.namespace.db().into(),
            "-c".into(),
            self.namespace.collection().into(),
            "--sample-ratio".into(),
            self.sample_ratio.to_string().into(),
            "--max-indexes".into(),
            self.max_indexes.to_string().into(),
        ];

        if self.verbose {
            args.push("-v".into());
        }

        args
    }

    /// Human readable command line for logs. The URI is shown as given.
    #[must_use]
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(
            self.args()
                .into_iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }

    /// Builds the subprocess with stdout and stderr piped.
    #[must_use]
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(self.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> MindexerOptions {
        MindexerOptions::new(
            "mindexer",
            "mongodb://localhost:27017",
            Namespace::new("ember2018", "ember_test").unwrap(),
        )
    }

    #[test]
    fn test_default_args() {
        let args: Vec<String> = options()
            .args()
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();
        assert_eq!(
            args,
            [
                "--uri",
                "mongodb://localhost:27017",
                "-d",
                "ember2018",
                "-c",
                "ember_test",
                "--sample-ratio",
                "0.01",
                "--max-indexes",
                "0",
            ]
        );
    }

    #[test]
    fn test_verbose_and_limits() {
        let opts = options()
            .with_sample_ratio(0.5)
            .with_max_indexes(3)
            .with_verbose(true);
        assert_eq!(
            opts.display_command(),
            "mindexer --uri mongodb://localhost:27017 -d ember2018 -c ember_test \
             --sample-ratio 0.5 --max-indexes 3 -v"
        );
    }
}
