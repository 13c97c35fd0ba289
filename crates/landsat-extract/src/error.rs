//! Error types for the extraction crate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while turning an archive into a PNG.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// I/O error reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive is not a readable zip.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// TIFF decoding error.
    #[error("TIFF decode error: {0}")]
    TiffDecode(#[from] tiff::TiffError),

    /// PNG encoding error.
    #[error("image encode error: {0}")]
    Image(#[from] image::ImageError),

    /// Preparing or clearing a working directory failed.
    #[error("workspace error: {0}")]
    Workspace(#[from] landsat_common::WorkspaceError),

    /// An archive entry would land outside the extraction directory.
    #[error("archive entry {0:?} has an unsafe path")]
    UnsafeEntry(String),

    /// No extracted file ends with the band suffix.
    #[error("missing band file *{suffix}")]
    MissingBand {
        /// Expected file name suffix, e.g. `B3.tif`.
        suffix: String,
    },

    /// More than one extracted file ends with the band suffix.
    #[error("ambiguous band file *{suffix}: {files:?}")]
    AmbiguousBand {
        /// Expected file name suffix.
        suffix: String,
        /// Every matching file name.
        files: Vec<String>,
    },

    /// A raster has more than one sample per pixel.
    #[error("{path} is not a single-band raster ({color_type})")]
    NotSingleBand {
        /// Offending file.
        path: PathBuf,
        /// Color type reported by the decoder.
        color_type: String,
    },

    /// Band rasters differ in size.
    #[error("band {band} is {found_width}x{found_height}, expected {width}x{height}")]
    ShapeMismatch {
        /// Band whose size is off.
        band: String,
        /// Expected width.
        width: u32,
        /// Expected height.
        height: u32,
        /// Actual width.
        found_width: u32,
        /// Actual height.
        found_height: u32,
    },
}
