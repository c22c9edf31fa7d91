//! Error types for photo-editing operations

use thiserror::Error;

/// Result type alias for photo-editing operations
pub type Result<T> = std::result::Result<T, EditorError>;

/// Comprehensive error types for photo-editing operations
#[derive(Error, Debug)]
pub enum EditorError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding/decoding errors from the image crate
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Malformed or unreadable image input
    #[error("Decode error: {0}")]
    Decode(String),

    /// Out-of-bounds or degenerate crop geometry
    #[error("Invalid crop: {0}")]
    InvalidCrop(String),

    /// Degenerate or unresolvable resize specification
    #[error("Invalid resize: {0}")]
    InvalidResize(String),

    /// Remote background-removal or upscaling call failed or returned empty
    #[error("Remote service error: {0}")]
    RemoteService(String),

    /// A second edit operation was attempted while one is pending
    #[error("Concurrent edit rejected: {0}")]
    ConcurrentEdit(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EditorError {
    /// Create a new decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new invalid crop error
    pub fn invalid_crop<S: Into<String>>(msg: S) -> Self {
        Self::InvalidCrop(msg.into())
    }

    /// Create a new invalid resize error
    pub fn invalid_resize<S: Into<String>>(msg: S) -> Self {
        Self::InvalidResize(msg.into())
    }

    /// Create a new remote service error
    pub fn remote_service<S: Into<String>>(msg: S) -> Self {
        Self::RemoteService(msg.into())
    }

    /// Create a new concurrent edit error
    pub fn concurrent_edit<S: Into<String>>(msg: S) -> Self {
        Self::ConcurrentEdit(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create a remote service error with endpoint context
    pub fn remote_service_with_endpoint(service: &str, endpoint: &str, error: &str) -> Self {
        Self::RemoteService(format!(
            "{} request to '{}' failed: {}",
            service, endpoint, error
        ))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
    ) -> Self {
        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {})",
            parameter, value, valid_range
        ))
    }

    /// True for errors that leave the session usable after being surfaced
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        // Every error in the taxonomy is caught at the session boundary; only
        // Internal indicates a bug rather than a rejected operation.
        !matches!(self, Self::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = EditorError::invalid_crop("exceeds bounds");
        assert!(matches!(err, EditorError::InvalidCrop(_)));

        let err = EditorError::remote_service("empty response");
        assert!(matches!(err, EditorError::RemoteService(_)));
    }

    #[test]
    fn test_error_display() {
        let err = EditorError::concurrent_edit("upscale already pending");
        assert_eq!(
            err.to_string(),
            "Concurrent edit rejected: upscale already pending"
        );
    }

    #[test]
    fn test_remote_error_with_endpoint() {
        let err = EditorError::remote_service_with_endpoint(
            "background removal",
            "https://api.example.com/removebg",
            "timed out",
        );
        let text = err.to_string();
        assert!(text.contains("background removal"));
        assert!(text.contains("https://api.example.com/removebg"));
        assert!(text.contains("timed out"));
    }

    #[test]
    fn test_config_value_error() {
        let err = EditorError::config_value_error("jpeg_quality", 150, "0-100");
        let text = err.to_string();
        assert!(text.contains("jpeg_quality"));
        assert!(text.contains("150"));
        assert!(text.contains("0-100"));
    }

    #[test]
    fn test_recoverability() {
        assert!(EditorError::decode("corrupt bytes").is_recoverable());
        assert!(EditorError::concurrent_edit("busy").is_recoverable());
        assert!(!EditorError::internal("invariant broken").is_recoverable());
    }
}
