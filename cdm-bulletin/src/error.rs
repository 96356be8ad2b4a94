/// Error types for the bulletin library
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for bulletin and station-index operations
#[derive(Error, Debug)]
pub enum BulletinError {
    /// Primary API call failed (transport, status, body or shape)
    #[error("request to {url} failed: {reason}")]
    RemoteFetch { url: String, reason: String },

    /// HTTP client could not be built
    #[cfg(feature = "api")]
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Neither the API nor the fallback dataset produced records
    #[error("no drought data available for {year}-{month:02}: {cause}")]
    NoDataAvailable { year: i32, month: u32, cause: String },

    /// Payload parsed but carried no usable `datos` entries
    #[error("payload has no usable `datos` records")]
    EmptyPayload,

    /// Failed to parse JSON
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to read a reference file
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Persistence index text was empty
    #[error("persistence index content is empty")]
    PersistenceParseEmpty,

    /// Failed to tokenize the persistence index
    #[error("failed to parse persistence index: {0}")]
    PersistenceCsv(#[from] csv::Error),

    /// No monthly index file inside the search window
    #[error("no persistence index file found in {} within the last {depth} months", dir.display())]
    NoPersistenceDataAvailable { dir: PathBuf, depth: u32 },

    /// Commune to station mapping has an unexpected shape
    #[error("invalid commune station map: {0}")]
    InvalidCommuneMap(String),
}

/// Type alias for Results using BulletinError
pub type Result<T> = std::result::Result<T, BulletinError>;
