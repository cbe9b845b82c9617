use thiserror::Error;

/// Core error type for the Foreman flow engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// Operation requires an active session but none exists (or it expired)
    #[error("No active flow for owner: {0}")]
    NoActiveFlow(String),

    /// Go-back requested on a session with an empty history
    #[error("No previous step to return to for owner: {0}")]
    NoPreviousStep(String),

    /// Optimistic-concurrency check failed on upsert
    #[error("Session was modified concurrently for owner: {0}")]
    SessionConflict(String),

    /// Attempted transition not permitted by the session state machine
    #[error("Flow transition error: {0}")]
    FlowTransitionError(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// State store error
    #[error("State store error: {0}")]
    StateStoreError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Input/output error
    #[error("Input/output error: {0}")]
    IOError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl FlowError {
    /// Whether the error is an expected control-flow signal the caller can
    /// convert into a user-facing prompt, as opposed to an operational fault
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FlowError::NoActiveFlow(_) | FlowError::NoPreviousStep(_)
        )
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for FlowError {
    fn from(err: std::io::Error) -> Self {
        FlowError::IOError(err.to_string())
    }
}

impl From<String> for FlowError {
    fn from(err: String) -> Self {
        FlowError::Other(err)
    }
}

impl From<&str> for FlowError {
    fn from(err: &str) -> Self {
        FlowError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_error_display() {
        let errors = vec![
            (
                FlowError::NoActiveFlow("user-1".to_string()),
                "No active flow for owner: user-1",
            ),
            (
                FlowError::NoPreviousStep("user-1".to_string()),
                "No previous step to return to for owner: user-1",
            ),
            (
                FlowError::SessionConflict("user-1".to_string()),
                "Session was modified concurrently for owner: user-1",
            ),
            (
                FlowError::FlowTransitionError("bad".to_string()),
                "Flow transition error: bad",
            ),
            (
                FlowError::ValidationError("invalid".to_string()),
                "Validation error: invalid",
            ),
            (
                FlowError::StateStoreError("db_err".to_string()),
                "State store error: db_err",
            ),
            (
                FlowError::ConfigurationError("config_err".to_string()),
                "Configuration error: config_err",
            ),
            (
                FlowError::SerializationError("ser_err".to_string()),
                "Serialization error: ser_err",
            ),
            (FlowError::IOError("io_err".to_string()), "Input/output error: io_err"),
            (FlowError::Other("other_err".to_string()), "other_err"),
        ];

        for (error, expected_msg) in errors {
            assert_eq!(error.to_string(), expected_msg);
        }
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(FlowError::NoActiveFlow("u".to_string()).is_recoverable());
        assert!(FlowError::NoPreviousStep("u".to_string()).is_recoverable());
        assert!(!FlowError::StateStoreError("boom".to_string()).is_recoverable());
        assert!(!FlowError::SessionConflict("u".to_string()).is_recoverable());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error: FlowError = json_error.into();

        match error {
            FlowError::SerializationError(msg) => {
                assert!(msg.contains("expected value"));
            }
            _ => panic!("Expected SerializationError variant"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_error = IoError::new(ErrorKind::NotFound, "file not found");
        let error: FlowError = io_error.into();

        match error {
            FlowError::IOError(msg) => {
                assert!(msg.contains("file not found"));
            }
            _ => panic!("Expected IOError variant"),
        }
    }

    #[test]
    fn test_from_string() {
        let error: FlowError = "test error message".to_string().into();

        match error {
            FlowError::Other(msg) => {
                assert_eq!(msg, "test error message");
            }
            _ => panic!("Expected Other variant"),
        }
    }

    #[test]
    fn test_error_clone_and_eq() {
        let original = FlowError::NoActiveFlow("user-9".to_string());
        let cloned = original.clone();

        assert_eq!(original, cloned);
    }
}
