use thiserror::Error;

/// Failure of a single geocode request. Never aborts a batch: the pipeline
/// marks the record `ERROR` and moves on.
#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("Geocoder request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Geocoder returned HTTP {status}")]
    HttpStatus { status: u16, body: String },

    #[error("Malformed geocoder response: {reason}")]
    Malformed { reason: String, raw: String },
}

impl GeocodeError {
    /// Raw payload attached to the failure, if the service sent one.
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            GeocodeError::Transport(_) => None,
            GeocodeError::HttpStatus { body, .. } => Some(body),
            GeocodeError::Malformed { raw, .. } => Some(raw),
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found: {id}")]
    NotFound { id: String },

    #[error("Store file {path} is corrupt at line {line}: {reason}")]
    Corrupt {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Field name {field} is reserved by the store (names cannot start with '$')")]
    ReservedField { field: String },

    #[error("Store write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Import failed: {message}")]
    ImportError { message: String },

    #[error(transparent)]
    GeocodeError(#[from] GeocodeError),

    #[error(transparent)]
    StoreError(#[from] StoreError),

    #[error("Export to {path} failed: {message}")]
    ExportError { path: String, message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration field '{field}' is missing")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Import,
    Geocoding,
    Storage,
    Export,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn import(message: impl Into<String>) -> Self {
        EtlError::ImportError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::ImportError { .. } | EtlError::CsvError(_) => ErrorCategory::Import,
            EtlError::GeocodeError(_) => ErrorCategory::Geocoding,
            EtlError::StoreError(_) => ErrorCategory::Storage,
            EtlError::ExportError { .. } => ErrorCategory::Export,
            EtlError::IoError(_) | EtlError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // per-record failures, the batch keeps going
            ErrorCategory::Geocoding => ErrorSeverity::Medium,
            ErrorCategory::Storage => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Import | ErrorCategory::Export => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::ImportError { message } => {
                format!("Could not load the input records: {}", message)
            }
            EtlError::ExportError { path, .. } => {
                format!("Could not write the output file {}", path)
            }
            EtlError::MissingConfigError { field } => {
                format!("Missing required option: {}", field)
            }
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("Option '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the command line flags and the TOML configuration file"
            }
            ErrorCategory::Import => {
                "Make sure the input file exists and matches --type (json or csv)"
            }
            ErrorCategory::Geocoding => {
                "Check that the geocoder host and port are reachable"
            }
            ErrorCategory::Storage => {
                "Check permissions on the store file; processed records are kept, re-run to resume"
            }
            ErrorCategory::Export => {
                "Check the output directory is writable; re-run with --database to export again"
            }
            ErrorCategory::System => "Inspect the log output for details",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
