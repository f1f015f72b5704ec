//! Application error types for duepet
//!
//! These errors wrap core errors and add storage, config and CLI variants.

use thiserror::Error;

/// Application errors
#[derive(Error, Debug)]
pub enum DuepetError {
    #[error("Task {0} not found")]
    TaskNotFound(String),

    #[error("Invalid date '{input}', expected YYYY-MM-DD")]
    InvalidDate { input: String },

    #[error("config: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("i/o failed while {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("storage: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl DuepetError {
    /// Config problem without an underlying cause
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Config problem caused by another error
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Parse failure with only a message
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Keeps the lower-level error as `source()`
    pub fn parse_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Parse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Rejected value for `field`
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// `context` reads as "while <context>"
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Storage problem without an underlying cause
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Storage problem caused by another error
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<std::io::Error> for DuepetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            context: "accessing the filesystem".to_string(),
            source: err,
        }
    }
}

impl From<confy::ConfyError> for DuepetError {
    fn from(err: confy::ConfyError) -> Self {
        Self::config_with_source("cannot load settings", err)
    }
}

impl From<serde_json::Error> for DuepetError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse_with_source("bad JSON", err)
    }
}

impl From<duepet_core::CoreError> for DuepetError {
    fn from(err: duepet_core::CoreError) -> Self {
        match err {
            duepet_core::CoreError::InvalidDate { input } => Self::InvalidDate { input },
            duepet_core::CoreError::Parse { message, source } => Self::Parse { message, source },
            duepet_core::CoreError::Validation { field, message } => {
                Self::Validation { field, message }
            }
        }
    }
}

/// Result type for duepet operations
pub type Result<T> = std::result::Result<T, DuepetError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_constructors_keep_source() {
        let io = std::io::Error::other("disk gone");
        let err = DuepetError::storage_with_source("cannot write tasks", io);
        assert_eq!(err.to_string(), "storage: cannot write tasks");
        assert_eq!(err.source().unwrap().to_string(), "disk gone");

        let err = DuepetError::config_with_source("bad file", std::io::Error::other("eof"));
        assert!(err.source().is_some());

        assert!(DuepetError::storage("empty").source().is_none());
        assert_eq!(DuepetError::parse("x").to_string(), "cannot parse: x");
        assert_eq!(
            DuepetError::validation("priority", "unknown level").to_string(),
            "invalid priority: unknown level"
        );
    }

    #[test]
    fn test_core_errors_convert() {
        let err: DuepetError = duepet_core::CoreError::invalid_date("soon").into();
        assert!(matches!(err, DuepetError::InvalidDate { ref input } if input == "soon"));

        let err: DuepetError = duepet_core::CoreError::validation("title", "empty").into();
        assert_eq!(err.to_string(), "invalid title: empty");
    }
}
