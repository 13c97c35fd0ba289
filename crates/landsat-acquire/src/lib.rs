//! # landsat-acquire
//!
//! Everything between a boundary file and a zip archive on disk:
//!
//! - [`BoundaryLoader`] reads administrative units from GeoJSON into
//!   [`Region`]s.
//! - [`DateWindow`] turns a (year, month) into a half-open date range.
//! - [`EeGeometry`] converts region polygons into service geometry.
//! - [`DownloadRequest`] describes one export; an [`ImageryService`]
//!   (normally an [`EarthEngineSession`]) resolves it into a URL.
//! - [`ArchiveFetcher`] downloads that URL into the region's imagery
//!   directory.
//!
//! ## Example
//!
//! ```no_run
//! use landsat_acquire::{
//!     ArchiveFetcher, BoundaryLoader, DateWindow, DownloadRequest, EarthEngineSession,
//!     ImageryService, SessionConfig,
//! };
//!
//! let regions = BoundaryLoader::default().load("geoBoundaries-NPL-ADM2.geojson")?;
//! let session = EarthEngineSession::open(SessionConfig::from_env("my-project", "EE_ACCESS_TOKEN")?)?;
//! let fetcher = ArchiveFetcher::new()?;
//!
//! for region in &regions {
//!     let request = DownloadRequest::new(region.archive_name(2010, 5), "LANDSAT/LT05/C01/T1", region)
//!         .with_window(DateWindow::for_month(2010, 5)?)
//!         .with_bands(["B1", "B2", "B3"]);
//!     let url = session.download_url(&request)?;
//!     fetcher.fetch(&url, std::path::Path::new(&format!("{}.zip", request.name)))?;
//! }
//! session.close();
//! # Ok::<(), landsat_acquire::AcquireError>(())
//! ```

mod boundary;
mod dates;
mod earth_engine;
mod error;
mod expr;
mod fetch;
mod geometry;
mod request;

#[cfg(test)]
mod test_server;

pub use boundary::{BoundaryLoader, BoundingBox, Region, DEFAULT_ID_FIELD};
pub use dates::DateWindow;
pub use earth_engine::{
    EarthEngineSession, SessionConfig, SessionStats, API_VERSION, DEFAULT_API_BASE,
    DEFAULT_TOKEN_ENV,
};
pub use error::AcquireError;
pub use fetch::{ArchiveFetcher, DownloadStats, DEFAULT_FETCH_TIMEOUT};
pub use geometry::EeGeometry;
pub use request::{
    CompositingMode, DownloadRequest, ExportFormat, ImageryService, DEFAULT_CRS, DEFAULT_SCALE,
    MAX_PIXELS,
};

/// Result type for acquisition operations.
pub type Result<T> = std::result::Result<T, AcquireError>;
