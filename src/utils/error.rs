use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("HTTP {status} returned by {url}")]
    HttpStatusError {
        status: u16,
        url: String,
        retry_after: Option<Duration>,
    },

    #[error("Request to {url} failed after {attempts} attempts: {last_error}")]
    RetryExhaustedError {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Malformed response: {message}")]
    MalformedResponseError { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

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

    #[error("Could not write report to '{path}': {source}")]
    OutputError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    Storage,
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
            | EtlError::HttpStatusError { .. }
            | EtlError::RetryExhaustedError { .. } => ErrorCategory::Network,
            EtlError::MalformedResponseError { .. }
            | EtlError::CsvError(_)
            | EtlError::SerializationError(_) => ErrorCategory::Data,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::IoError(_) | EtlError::OutputError { .. } => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::HttpStatusError { .. } | EtlError::MalformedResponseError { .. } => {
                ErrorSeverity::Low
            }
            EtlError::ApiError(_) | EtlError::RetryExhaustedError { .. } => ErrorSeverity::Medium,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            EtlError::IoError(_) | EtlError::OutputError { .. } => ErrorSeverity::Critical,
        }
    }

    /// Server hint carried by a retryable status response.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            EtlError::HttpStatusError { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Transport failures worth another attempt at the HTTP layer. A body cut
    /// short after a success status surfaces as a decode error.
    pub fn is_transient(&self) -> bool {
        match self {
            EtlError::ApiError(e) => {
                e.is_connect()
                    || e.is_timeout()
                    || e.is_request()
                    || e.is_body()
                    || e.is_decode()
            }
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check connectivity to the portal or raise the rate-limit intervals and retry budget"
            }
            ErrorCategory::Data => {
                "The portal response format may have changed; inspect the raw payload"
            }
            ErrorCategory::Configuration => "Fix the configuration file and run again",
            ErrorCategory::Storage => {
                "Check that the output directory exists and is writable, and that the file is not open elsewhere"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::OutputError { path, .. } => {
                format!("The report was NOT produced: could not write '{}'", path)
            }
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid configuration for '{}': {}", field, reason)
            }
            EtlError::ConfigValidationError { field, message } => {
                format!("Configuration problem in '{}': {}", field, message)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_error_is_critical() {
        let err = EtlError::OutputError {
            path: "report.csv".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert!(err.user_friendly_message().contains("NOT produced"));
    }

    #[test]
    fn test_status_error_is_not_transient() {
        let err = EtlError::HttpStatusError {
            status: 404,
            url: "http://localhost/".to_string(),
            retry_after: None,
        };
        assert!(!err.is_transient());
        assert_eq!(err.category(), ErrorCategory::Network);
    }
}
