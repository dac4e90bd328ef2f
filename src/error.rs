//! Unified error handling for the runmap library.
//!
//! Validation failures and "no data" conditions are ordinary values here,
//! never panics: the transport layer maps them onto 4xx responses, while
//! only `Internal` and `Persistence` surface as server errors.

use thiserror::Error;

/// Unified error type for runmap operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A track needs at least two points to be stored
    #[error("track from '{source_file}' has {point_count} points, minimum 2 required")]
    InsufficientPoints {
        source_file: String,
        point_count: usize,
    },

    /// Lasso polygon failed validation
    #[error("invalid polygon: {message}")]
    InvalidPolygon { message: String },

    /// Viewport parameters failed validation
    #[error("invalid viewport: {message}")]
    InvalidViewport { message: String },

    /// Snapshot save/load error
    #[error("persistence error: {message}")]
    Persistence { message: String },

    /// Generic internal error
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl Error {
    pub fn invalid_polygon(message: impl Into<String>) -> Self {
        Error::InvalidPolygon {
            message: message.into(),
        }
    }

    pub fn invalid_viewport(message: impl Into<String>) -> Self {
        Error::InvalidViewport {
            message: message.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Error::Persistence {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// True for errors caused by the caller's input rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InsufficientPoints { .. }
                | Error::InvalidPolygon { .. }
                | Error::InvalidViewport { .. }
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Persistence {
            message: e.to_string(),
        }
    }
}

/// Result type alias for runmap operations.
pub type Result<T> = std::result::Result<T, Error>;
