use thiserror::Error;

/// Failure classes for the marks pipeline. All are fatal; there is no retry.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read {path}: {message}")]
    InputRead { path: String, message: String },

    #[error("student `{student}` has no usable mark for subject `{subject}`")]
    MissingScore { student: String, subject: String },

    #[error("chart rendering failed: {0}")]
    Render(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
