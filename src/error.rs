use thiserror::Error;

/// Why a single level of a fetch run was skipped.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The endpoint answered with a non-success status.
    #[error("{url} returned {status}: {message}")]
    Status { url: String, status: u16, message: String },

    /// The body was not a feature collection.
    #[error("{url} returned an unreadable feature collection: {message}")]
    Decode { url: String, message: String },
}

/// Faults raised by the versioned cache and its stores.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("compression error: {0}")]
    Codec(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("stored payload is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}
