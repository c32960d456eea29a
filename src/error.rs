/// Unified error handling for the ProxySQL admin client
///
/// Every failure is returned to the caller. Validation problems are detected
/// before any statement reaches the admin interface; execution problems are
/// passed through from the driver untouched.

use crate::core::Field;
use std::fmt;
use thiserror::Error;

/// Main error type for admin client operations
#[derive(Debug, Error)]
pub enum AdminError {
    /// Malformed host field or illegal option combination
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Statement failed on the admin interface (connection, rejection, ...)
    #[error("Execution error: {0}")]
    Execution(#[from] sqlx::Error),

    /// A returned row did not have the mysql_servers shape
    #[error("Row decode error: {message}")]
    Decode { message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Reasons a host or a set of host options is rejected before execution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field}: {reason}")]
    InvalidField { field: Field, reason: String },

    #[error("missing required field: {0}")]
    MissingField(Field),

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("{operation} only accepts a table selector, got {field}")]
    FieldsNotAllowed {
        operation: &'static str,
        field: Field,
    },

    #[error("{operation} requires at least one field to match on")]
    EmptyPredicate { operation: &'static str },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Result type alias for admin client operations
pub type AdminResult<T> = Result<T, AdminError>;

impl AdminError {
    /// Create a row decode error
    pub fn decode<S: Into<String>>(message: S) -> Self {
        AdminError::Decode {
            message: message.into(),
        }
    }

    /// Check if retrying the same call could succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AdminError::Execution(_))
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AdminError::Config(_) => ErrorSeverity::Critical,
            AdminError::Execution(_) => ErrorSeverity::Warning,
            AdminError::Validation(_) | AdminError::Decode { .. } => ErrorSeverity::Error,
        }
    }
}

impl ValidationError {
    pub fn invalid<S: Into<String>>(field: Field, reason: S) -> Self {
        ValidationError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Misconfiguration that stops the client from working at all
    Critical,
    /// Rejected input or unexpected data
    Error,
    /// Transient failures talking to the admin interface
    Warning,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Warning => write!(f, "WARNING"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let error = AdminError::from(ValidationError::invalid(Field::Hostname, "must not be empty"));
        assert!(matches!(error, AdminError::Validation(_)));
        assert_eq!(
            error.to_string(),
            "Validation error: invalid hostname: must not be empty"
        );

        let missing = ValidationError::MissingField(Field::Port);
        assert_eq!(missing.to_string(), "missing required field: port");

        let empty = ValidationError::EmptyPredicate {
            operation: "remove_hosts_like",
        };
        assert_eq!(
            empty.to_string(),
            "remove_hosts_like requires at least one field to match on"
        );
    }

    #[test]
    fn test_error_severity() {
        let config_error = AdminError::Config(ConfigError::ValidationError("test".to_string()));
        assert_eq!(config_error.severity(), ErrorSeverity::Critical);

        let execution_error = AdminError::Execution(sqlx::Error::Protocol("gone".to_string()));
        assert_eq!(execution_error.severity(), ErrorSeverity::Warning);
        assert_eq!(execution_error.severity().to_string(), "WARNING");
    }

    #[test]
    fn test_error_recoverability() {
        let execution_error = AdminError::Execution(sqlx::Error::PoolTimedOut);
        assert!(execution_error.is_recoverable());

        let validation_error = AdminError::from(ValidationError::UnknownTable("x".to_string()));
        assert!(!validation_error.is_recoverable());

        assert!(!AdminError::decode("short row").is_recoverable());
    }
}
