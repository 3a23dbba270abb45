use thiserror::Error;

/// A record-level failure. The record is skipped and the run continues.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Field '{field}' is not valid JSON: {source}")]
    InvalidEmbeddedJson {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Unexpected shape at '{path}': expected {expected}")]
    UnexpectedShape { path: String, expected: &'static str },

    #[error("Invalid timestamp in '{field}': {value}")]
    InvalidTimestamp { field: String, value: String },

    #[error("Invalid numeric value in '{field}': {value}")]
    InvalidNumber { field: String, value: String },

    #[error("{response_type} response has no activity to pick a normalizer")]
    MissingActivity { response_type: String },
}

pub type NormalizeResult<T> = std::result::Result<T, NormalizeError>;
