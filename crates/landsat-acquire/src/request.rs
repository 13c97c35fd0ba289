//! Download requests and the imagery-service seam.

use crate::boundary::{BoundingBox, Region};
use crate::dates::DateWindow;
use crate::geometry::EeGeometry;
use crate::{AcquireError, Result};
use std::fmt;

/// Native Landsat resolution in meters per pixel.
pub const DEFAULT_SCALE: f64 = 30.0;

/// Output coordinate reference system.
pub const DEFAULT_CRS: &str = "EPSG:4326";

/// Largest export the service is asked for.
pub const MAX_PIXELS: f64 = 1e9;

/// Meters per degree of latitude (and of longitude at the equator).
const METERS_PER_DEGREE: f64 = 111_320.0;

/// How a filtered collection is reduced to one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositingMode {
    /// Per-pixel median.
    #[default]
    Median,
    /// Per-pixel least-cloud Landsat composite.
    CloudFree,
}

impl fmt::Display for CompositingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositingMode::Median => write!(f, "median"),
            CompositingMode::CloudFree => write!(f, "cloud-free"),
        }
    }
}

/// Archive layout requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Zip with one GeoTIFF per band.
    #[default]
    ZippedGeoTiffPerBand,
}

impl ExportFormat {
    /// Wire name of the format.
    pub fn api_name(&self) -> &'static str {
        match self {
            ExportFormat::ZippedGeoTiffPerBand => "ZIPPED_GEO_TIFF_PER_BAND",
        }
    }
}

/// Everything needed to ask for one region's archive.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Archive name, without extension.
    pub name: String,
    /// Region label used in log lines.
    pub region: String,
    /// Catalog identifier (collection, or a single image).
    pub catalog: String,
    /// Whether `catalog` names one image rather than a collection.
    pub single_image: bool,
    /// Geometry the image is clipped to.
    pub geometry: EeGeometry,
    /// Bounding box of the geometry, the export region.
    pub bounds: BoundingBox,
    /// Date filter; `None` leaves the collection unfiltered by date.
    pub window: Option<DateWindow>,
    /// Bands to export.
    pub bands: Vec<String>,
    /// Meters per pixel.
    pub scale: f64,
    pub compositing: CompositingMode,
    pub crs: String,
    pub format: ExportFormat,
    pub max_pixels: f64,
}

impl DownloadRequest {
    /// Request for `region` from `catalog` with default scale, CRS and format.
    pub fn new(name: impl Into<String>, catalog: impl Into<String>, region: &Region) -> Self {
        Self {
            name: name.into(),
            region: region.image_name(),
            catalog: catalog.into(),
            single_image: false,
            geometry: EeGeometry::from_region(region),
            bounds: region.bbox(),
            window: None,
            bands: Vec::new(),
            scale: DEFAULT_SCALE,
            compositing: CompositingMode::default(),
            crs: DEFAULT_CRS.to_string(),
            format: ExportFormat::default(),
            max_pixels: MAX_PIXELS,
        }
    }

    pub fn with_window(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_bands<I, S>(mut self, bands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bands = bands.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_compositing(mut self, compositing: CompositingMode) -> Self {
        self.compositing = compositing;
        self
    }

    pub fn with_crs(mut self, crs: impl Into<String>) -> Self {
        self.crs = crs.into();
        self
    }

    pub fn single_image(mut self, single_image: bool) -> Self {
        self.single_image = single_image;
        self
    }

    /// Approximate pixel count of the export region at `scale`.
    pub fn estimated_pixels(&self) -> f64 {
        let width_m =
            self.bounds.width_deg() * METERS_PER_DEGREE * self.bounds.center_lat().to_radians().cos();
        let height_m = self.bounds.height_deg() * METERS_PER_DEGREE;
        (width_m / self.scale).ceil().max(1.0) * (height_m / self.scale).ceil().max(1.0)
    }

    /// Fail early when the export would be refused for size.
    pub fn check_pixel_budget(&self) -> Result<()> {
        let estimated = self.estimated_pixels();
        if estimated > self.max_pixels {
            return Err(AcquireError::TooManyPixels {
                estimated,
                max: self.max_pixels,
            });
        }
        Ok(())
    }

    /// Human-readable date window, empty when unfiltered.
    pub fn window_label(&self) -> String {
        self.window
            .map(|w| format!(" between {} and {}", w.start(), w.end()))
            .unwrap_or_default()
    }
}

/// A remote service that turns a [`DownloadRequest`] into a download URL.
///
/// Implementations must be shareable across worker threads.
pub trait ImageryService: Send + Sync {
    /// Resolve `request` into a time-limited URL of a zip archive.
    fn download_url(&self, request: &DownloadRequest) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn region(size_deg: f64) -> Region {
        let poly = polygon![
            (x: 0.0, y: 0.0),
            (x: size_deg, y: 0.0),
            (x: size_deg, y: size_deg),
            (x: 0.0, y: size_deg),
        ];
        Region::new("R", MultiPolygon::new(vec![poly])).unwrap()
    }

    #[test]
    fn test_defaults() {
        let request = DownloadRequest::new("R_2010_5", "LANDSAT/LT05/C01/T1", &region(0.1));
        assert_eq!(request.scale, 30.0);
        assert_eq!(request.crs, "EPSG:4326");
        assert_eq!(request.max_pixels, 1e9);
        assert_eq!(request.compositing, CompositingMode::Median);
        assert_eq!(request.format.api_name(), "ZIPPED_GEO_TIFF_PER_BAND");
        assert!(request.window.is_none());
        assert!(!request.single_image);
        assert_eq!(request.window_label(), "");
    }

    #[test]
    fn test_builder() {
        let window = DateWindow::for_month(2010, 5).unwrap();
        let request = DownloadRequest::new("R_2010_5", "C", &region(0.1))
            .with_window(window)
            .with_bands(["B1", "B2", "B3"])
            .with_scale(60.0)
            .with_compositing(CompositingMode::CloudFree)
            .with_crs("EPSG:32645");
        assert_eq!(request.bands, vec!["B1", "B2", "B3"]);
        assert_eq!(request.scale, 60.0);
        assert_eq!(request.crs, "EPSG:32645");
        assert_eq!(
            request.window_label(),
            " between 2010-05-01 and 2010-06-01"
        );
    }

    #[test]
    fn test_small_region_within_budget() {
        // 0.1 degree square at the equator is roughly 371 x 371 pixels.
        let request = DownloadRequest::new("R", "C", &region(0.1));
        let pixels = request.estimated_pixels();
        assert!(pixels > 130_000.0 && pixels < 140_000.0, "{pixels}");
        assert!(request.check_pixel_budget().is_ok());
    }

    #[test]
    fn test_huge_region_rejected() {
        let request = DownloadRequest::new("R", "C", &region(20.0)).with_scale(10.0);
        assert!(matches!(
            request.check_pixel_budget(),
            Err(AcquireError::TooManyPixels { .. })
        ));
    }
}
