//! Error types for the acquisition crate.

use thiserror::Error;

/// Errors that can occur while loading boundaries, requesting imagery or
/// downloading archives.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// I/O error reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The boundary file is not valid GeoJSON.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] Box<geojson::Error>),

    /// Month outside 1-12, non-numeric year, or a date the calendar cannot hold.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// The boundary dataset is structurally unusable.
    #[error("Invalid boundary data: {0}")]
    InvalidBoundary(String),

    /// A feature is missing the identifier property.
    #[error("Feature {index} has no '{field}' property")]
    MissingIdentifier {
        /// Position of the feature in the collection.
        index: usize,
        /// Name of the identifier property.
        field: String,
    },

    /// A feature's geometry is not a polygon.
    #[error("Region {id} has unsupported geometry type {kind}")]
    UnsupportedGeometry {
        /// Region identifier.
        id: String,
        /// GeoJSON geometry type found instead.
        kind: String,
    },

    /// HTTP transport error.
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The imagery service rejected the credentials.
    #[error("Imagery service authentication failed: {0}")]
    Auth(String),

    /// The imagery service returned an error response.
    #[error("Imagery service error (HTTP {status}): {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// The filtered collection contains no images.
    #[error("No images in {catalog} for {region}{window}")]
    EmptyCollection {
        /// Catalog identifier.
        catalog: String,
        /// Region label.
        region: String,
        /// Date window description, empty when unfiltered.
        window: String,
    },

    /// The export would exceed the pixel limit.
    #[error("Export of {estimated:.0} pixels exceeds the limit of {max:.0}")]
    TooManyPixels {
        /// Estimated pixel count.
        estimated: f64,
        /// Pixel limit.
        max: f64,
    },

    /// The archive download did not complete.
    #[error("Failed to download {name}: {reason}")]
    DownloadFailed {
        /// Archive name.
        name: String,
        /// Reason for failure.
        reason: String,
    },
}

impl AcquireError {
    /// Whether the error means "nothing to fetch" rather than a failure.
    pub fn is_skip(&self) -> bool {
        matches!(self, AcquireError::EmptyCollection { .. })
    }
}

impl From<geojson::Error> for AcquireError {
    fn from(e: geojson::Error) -> Self {
        AcquireError::GeoJson(Box::new(e))
    }
}
