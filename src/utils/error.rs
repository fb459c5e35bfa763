use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpdaterError {
    #[error("Failed to read collection '{collection}': {message}")]
    StoreReadError { collection: String, message: String },

    #[error("Failed to update record '{id}': {message}")]
    StoreWriteError { id: String, message: String },

    #[error("Malformed record '{id}': {reason}")]
    MalformedRecord { id: String, reason: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid schedule expression '{expression}': expected 'every N minutes|hours|days'")]
    ScheduleError { expression: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Store,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl UpdaterError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::StoreReadError { .. } | Self::StoreWriteError { .. } | Self::HttpError(_) => {
                ErrorCategory::Store
            }
            Self::MalformedRecord { .. } | Self::SerializationError(_) => ErrorCategory::Data,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ScheduleError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單筆記錄問題不影響整次執行
            Self::MalformedRecord { .. } => ErrorSeverity::Low,
            Self::StoreWriteError { .. } => ErrorSeverity::Medium,
            // 讀取失敗可交由排程重試
            Self::StoreReadError { .. } | Self::HttpError(_) => ErrorSeverity::Medium,
            Self::SerializationError(_)
            | Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ScheduleError { .. } => ErrorSeverity::High,
            Self::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::StoreReadError { collection, .. } => format!(
                "Check that the document store is reachable and that collection '{}' exists",
                collection
            ),
            Self::StoreWriteError { .. } => {
                "The record will be retried on the next scheduled run".to_string()
            }
            Self::MalformedRecord { .. } => {
                "Make sure the listing has a valid uploadDate and pricePerKg".to_string()
            }
            Self::HttpError(_) => {
                "Check network connectivity and the store base URL / access token".to_string()
            }
            Self::IoError(_) => "Check file paths and permissions".to_string(),
            Self::SerializationError(_) => {
                "Check that the store file contains valid JSON".to_string()
            }
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Review the configuration values and try again".to_string()
            }
            Self::MissingConfigError { field } => {
                format!("Provide a value for '{}'", field)
            }
            Self::ScheduleError { .. } => {
                "Use an expression such as 'every 24 hours' or 'every 30 minutes'".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Store => format!("Document store problem: {}", self),
            ErrorCategory::Data => format!("Listing data problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::System => format!("System problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, UpdaterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_are_retryable_severity() {
        let err = UpdaterError::StoreReadError {
            collection: "marketplace".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Store);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.recovery_suggestion().contains("marketplace"));
    }

    #[test]
    fn test_malformed_record_is_low_severity() {
        let err = UpdaterError::MalformedRecord {
            id: "abc".to_string(),
            reason: "missing uploadDate".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.to_string(), "Malformed record 'abc': missing uploadDate");
    }

    #[test]
    fn test_config_errors_message() {
        let err = UpdaterError::MissingConfigError {
            field: "FIRESTORE_PROJECT".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err
            .user_friendly_message()
            .starts_with("Configuration problem"));
    }
}
