//! Avatar loading error types.

use std::sync::Arc;

use thiserror::Error;

/// Terminal failure of a single avatar request. Never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AvatarLoaderError {
    /// The input was rejected before any network I/O.
    #[error("bad URL")]
    BadUrl,

    /// Bytes were received but could not be decoded as an image.
    #[error("bad image data")]
    BadData,

    /// The network request or session failed.
    #[error("download error")]
    DownloadError,
}

/// Outcome delivered to a `download` caller.
pub type AvatarResult = Result<Arc<image::DynamicImage>, AvatarLoaderError>;

/// Transport-level failure reported by a fetch port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request could not be sent or the connection broke.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}")]
    Status {
        /// Status code returned by the server.
        status: u16,
    },

    /// The response body could not be read.
    #[error("failed to read body: {0}")]
    Body(String),
}

impl FetchError {
    /// Creates request error.
    #[must_use]
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request(message.into())
    }

    /// Creates body error.
    #[must_use]
    pub fn body(message: impl Into<String>) -> Self {
        Self::Body(message.into())
    }
}

impl From<FetchError> for AvatarLoaderError {
    fn from(_: FetchError) -> Self {
        Self::DownloadError
    }
}
