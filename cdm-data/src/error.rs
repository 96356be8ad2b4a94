/// Error types for the fusion library
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FusionError {
    /// Base polygon file does not exist
    #[error("base polygon file not found: {}", .0.display())]
    BasePolygonFileMissing(PathBuf),

    /// Base polygon file could not be read
    #[error("failed to read base polygon file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Base polygon file is not a GeoJSON FeatureCollection
    #[error("invalid base polygon file {}: {reason}", path.display())]
    InvalidBaseGeoJson { path: PathBuf, reason: String },
}

/// Type alias for Results using FusionError
pub type Result<T> = std::result::Result<T, FusionError>;
