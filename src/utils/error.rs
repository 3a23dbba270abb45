use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unknown response type code {code} on record {record_id}")]
    UnknownResponseType { record_id: String, code: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::ConfigError { .. } | EtlError::InvalidConfigValueError { .. } => {
                ErrorSeverity::High
            }
            EtlError::SerializationError(_) | EtlError::UnknownResponseType { .. } => {
                ErrorSeverity::High
            }
            EtlError::CsvError(_) => ErrorSeverity::Medium,
            EtlError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::ConfigError { .. } | EtlError::InvalidConfigValueError { .. } => {
                "Check the command line flags, environment variables and config file"
            }
            EtlError::SerializationError(_) => {
                "Make sure the input is a complete JSON array of response records"
            }
            EtlError::UnknownResponseType { .. } => {
                "Response types must be 1 (questionnaire), 2 (task) or 3 (healthdata)"
            }
            EtlError::CsvError(_) | EtlError::IoError(_) => {
                "Check that the output directory exists and is writable"
            }
        }
    }

    /// Exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
