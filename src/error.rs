//! Error types for editor operations

use thiserror::Error;

/// Result type alias for editor operations
pub type Result<T> = std::result::Result<T, EditorError>;

/// Error types raised by the editor core and its collaborators
#[derive(Error, Debug)]
pub enum EditorError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image codec errors surfaced by the `image` crate
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Selected file is not an image
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File claims to be an image but could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Background removal backend failed
    #[error("Background removal failed: {0}")]
    CutoutBackend(String),

    /// Background removal finished but found nothing to keep
    #[error("No subject detected in the image")]
    NoSubject,

    /// A control was used while controls are disabled
    #[error("Controls are disabled: {0}")]
    ControlsDisabled(&'static str),

    /// An operation needs a loaded image
    #[error("No image loaded")]
    NoImage,

    /// Export of the current frame failed
    #[error("Export error: {0}")]
    Export(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Network errors talking to a remote backend
    #[error("Network error: {0}")]
    Network(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EditorError {
    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new cutout backend error
    pub fn cutout_backend<S: Into<String>>(msg: S) -> Self {
        Self::CutoutBackend(msg.into())
    }

    /// Create a new export error
    pub fn export<S: Into<String>>(msg: S) -> Self {
        Self::Export(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {}", rec),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {}).{}",
            parameter, value, valid_range, recommendation
        ))
    }

    /// Create network error with operation context
    pub fn network_error<E: std::fmt::Display>(operation: &str, error: E) -> Self {
        Self::Network(format!("{}: {}", operation, error))
    }

    /// Whether this error belongs to the background-removal backend category
    #[must_use]
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Self::CutoutBackend(_) | Self::NoSubject | Self::Network(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = EditorError::invalid_input("text/plain");
        assert!(matches!(err, EditorError::InvalidInput(_)));

        let err = EditorError::decode("truncated PNG");
        assert!(matches!(err, EditorError::Decode(_)));
    }

    #[test]
    fn test_error_display() {
        let err = EditorError::cutout_backend("missing API key");
        assert_eq!(err.to_string(), "Background removal failed: missing API key");
        assert_eq!(EditorError::NoSubject.to_string(), "No subject detected in the image");
    }

    #[test]
    fn test_config_value_error() {
        let err = EditorError::config_value_error("max display width", 0, "1-16384", Some(1920));
        let error_string = err.to_string();
        assert!(error_string.contains("max display width"));
        assert!(error_string.contains("1-16384"));
        assert!(error_string.contains("Recommended: 1920"));
    }

    #[test]
    fn test_backend_failure_category() {
        assert!(EditorError::NoSubject.is_backend_failure());
        assert!(EditorError::network_error("POST cutout", "connection refused").is_backend_failure());
        assert!(!EditorError::NoImage.is_backend_failure());
    }
}
