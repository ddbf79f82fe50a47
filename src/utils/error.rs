use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Cannot connect to source: {message}")]
    ConnectionError { message: String },

    #[error("Search failed: {message}")]
    SearchError { message: String },

    #[error("Error getting record {record_id}: {message}")]
    RecordError { record_id: String, message: String },

    #[error("XML parse error: {message}")]
    XmlError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Notification error: {message}")]
    NotificationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Storage,
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
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_)
            | EtlError::ConnectionError { .. }
            | EtlError::SearchError { .. }
            | EtlError::RecordError { .. } => ErrorCategory::Network,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::SerializationError(_)
            | EtlError::XmlError { .. }
            | EtlError::ProcessingError { .. } => ErrorCategory::Data,
            EtlError::StorageError { .. } => ErrorCategory::Storage,
            EtlError::IoError(_) | EtlError::NotificationError { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::NotificationError { .. } => ErrorSeverity::Low,
            EtlError::ApiError(_)
            | EtlError::ConnectionError { .. }
            | EtlError::SearchError { .. }
            | EtlError::RecordError { .. } => ErrorSeverity::Medium,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::SerializationError(_)
            | EtlError::XmlError { .. }
            | EtlError::ProcessingError { .. } => ErrorSeverity::High,
            EtlError::IoError(_) | EtlError::StorageError { .. } => ErrorSeverity::Critical,
        }
    }

    /// Retrying the same run may succeed.
    pub fn is_retryable(&self) -> bool {
        self.severity() == ErrorSeverity::Medium
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check that the catalogue is reachable and the source endpoints are correct, then retry"
            }
            ErrorCategory::Configuration => {
                "Review the configuration file and any ${VAR} environment substitutions"
            }
            ErrorCategory::Data => "Inspect the offending record in the catalogue",
            ErrorCategory::Storage => "Check that the output path exists and is writable",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::ConnectionError { .. } => {
                "Could not reach the metadata catalogue".to_string()
            }
            EtlError::SearchError { .. } => "Searching the metadata catalogue failed".to_string(),
            EtlError::MissingConfigError { field } => {
                format!("The configuration is missing '{}'", field)
            }
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("The configuration value '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
