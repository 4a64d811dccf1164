//! Error types shared by the reconstruction crates.

use thiserror::Error;

/// Main error type for buffer handling and DSP entry points.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid parameter provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Buffer too small for operation.
    #[error("Buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// A sample window leaves the addressable area of a plane.
    #[error("Window {width}x{height} at ({x}, {y}) is outside the addressable plane area")]
    OutOfBounds {
        x: isize,
        y: isize,
        width: usize,
        height: usize,
    },

    /// Error raised by a pixel-processing stage.
    #[error("DSP error: {0}")]
    Dsp(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid parameter error.
    pub fn invalid_param(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Check if this error describes a buffer that cannot hold the requested data.
    #[must_use]
    pub fn is_buffer_error(&self) -> bool {
        matches!(self, Error::BufferTooSmall { .. } | Error::OutOfBounds { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidParameter("stride smaller than width".into());
        assert_eq!(err.to_string(), "Invalid parameter: stride smaller than width");

        let err = Error::BufferTooSmall {
            needed: 64,
            available: 32,
        };
        assert_eq!(err.to_string(), "Buffer too small: need 64 bytes, have 32");
    }

    #[test]
    fn test_out_of_bounds_display() {
        let err = Error::OutOfBounds {
            x: -3,
            y: 10,
            width: 15,
            height: 8,
        };
        assert_eq!(
            err.to_string(),
            "Window 15x8 at (-3, 10) is outside the addressable plane area"
        );
    }

    #[test]
    fn test_is_buffer_error() {
        assert!(Error::BufferTooSmall {
            needed: 1,
            available: 0
        }
        .is_buffer_error());
        assert!(!Error::invalid_param("x").is_buffer_error());
        assert!(!Error::config("threads").is_buffer_error());
    }
}
