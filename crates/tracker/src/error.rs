/// Errors raised by the experiment tracker.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Invalid user input, such as a malformed parameter.
    #[error("{0}")]
    Validation(String),

    #[error("Command `{program}` failed with exit code {code:?}: {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Artifact store error: {0}")]
    Store(#[from] object_store::Error),
}

pub type Result<T> = core::result::Result<T, TrackerError>;
