//! Error types surfaced by the catalog client and the persistence port.

use std::io;

use thiserror::Error;

/// Failures returned by [`crate::api::CatalogClient`].
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Required configuration is missing or invalid. Raised before any network call.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Upstream answered with a status outside the 2xx range.
    #[error("API error ({status})")]
    Http {
        /// Numeric HTTP status code.
        status: u16,
    },
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The response body was not JSON of the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CatalogError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::Http { status } => Some(*status),
            _ => None,
        }
    }
}

/// Failures raised by a [`crate::favorites::KeyValueStore`] backend.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
    /// The key cannot be mapped onto the backend.
    #[error("invalid storage key `{0}`")]
    InvalidKey(String),
}

/// Convenience alias for catalog results.
pub type Result<T> = std::result::Result<T, CatalogError>;
