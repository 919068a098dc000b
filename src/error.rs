//! Defines the kinds of failure a single record can run into.

use std::backtrace::Backtrace;
use std::fmt;
use thiserror::Error;

/// The reason a record could not be resized. Storage failures carry
/// the object's location; decode failures carry the decoder's
/// message.
#[derive(Debug, Error)]
pub enum ResizeError {
    #[error("object {key:?} does not exist in bucket {bucket:?}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("access to object {key:?} in bucket {bucket:?} was denied: {message}")]
    AccessDenied {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("storage request for object {key:?} in bucket {bucket:?} failed: {message}")]
    TransientStorage {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("contents are not in a supported image format: {0}")]
    UnsupportedFormat(String),

    #[error("image data is corrupt: {0}")]
    CorruptData(String),

    #[error("failed to encode the resized image: {0}")]
    Encode(String),

    #[error("image processing task was aborted: {0}")]
    Aborted(String),
}

impl From<image::ImageError> for ResizeError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::Unsupported(_) => ResizeError::UnsupportedFormat(e.to_string()),
            _ => ResizeError::CorruptData(e.to_string()),
        }
    }
}

/// A record's failure together with the stack where it surfaced. The
/// trace is always captured, regardless of `RUST_BACKTRACE`.
#[derive(Debug)]
pub struct Failure {
    pub error: ResizeError,
    pub backtrace: Backtrace,
}

impl From<ResizeError> for Failure {
    fn from(error: ResizeError) -> Self {
        Failure {
            error,
            backtrace: Backtrace::force_capture(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
