//! # landsat-extract
//!
//! Turns the per-band GeoTIFF archives delivered by the imagery service into
//! RGB PNG images.
//!
//! Each archive holds one single-band GeoTIFF per requested band, named
//! `<prefix>.<band>.tif`. The [`SensorGeneration`] decides which three bands
//! become red, green and blue:
//!
//! | Generation | Red | Green | Blue |
//! |------------|-----|-------|------|
//! | Landsat 5  | B3  | B2    | B1   |
//! | Landsat 8  | B4  | B3    | B2   |
//!
//! Samples are cast to 8 bits without rescaling.
//!
//! ## Example
//!
//! ```no_run
//! use landsat_common::RegionDirs;
//! use landsat_extract::{BandExtractor, ExtractOptions, SensorGeneration};
//!
//! let extractor = BandExtractor::new(ExtractOptions {
//!     sensor: SensorGeneration::Landsat5,
//!     crop: true,
//!     ..ExtractOptions::default()
//! });
//! let dirs = RegionDirs::new("./data", "NPL", "NPL-ADM2-1590546715-B1");
//! let report = extractor.process_region("NPL-ADM2-1590546715-B1", &dirs)?;
//! println!("{report}");
//! # Ok::<(), landsat_extract::ExtractError>(())
//! ```

mod bands;
mod composite;
mod error;
mod extract;
mod raster;

#[cfg(test)]
mod fixtures;

pub use bands::SensorGeneration;
pub use composite::{crop_top_left, stack_rgb, write_png, CROP_SIZE};
pub use error::ExtractError;
pub use extract::{unpack, BandExtractor, ExtractOptions};
pub use raster::BandRaster;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
