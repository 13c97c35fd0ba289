//! Batch configuration.
//!
//! A batch is described by a YAML file. Every field has a default, so a
//! minimal file only names the country and boundary dataset:
//!
//! ```yaml
//! iso: NPL
//! boundary: geoBoundaries-NPL-ADM2.geojson
//! years: [2010]
//! months: [5]
//! sensor: landsat5
//! crop: true
//! ```

use crate::error::{RunnerError, RunnerResult};
use landsat_acquire::{
    CompositingMode, SessionConfig, DEFAULT_API_BASE, DEFAULT_CRS, DEFAULT_FETCH_TIMEOUT,
    DEFAULT_ID_FIELD, DEFAULT_SCALE, DEFAULT_TOKEN_ENV,
};
use landsat_common::is_plain_component;
use landsat_extract::{ExtractOptions, SensorGeneration};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Catalog used when none is configured.
pub const DEFAULT_CATALOG: &str = "LANDSAT/LT05/C01/T1";

/// Root of the per-country output trees.
pub const DEFAULT_BASE_DIR: &str = "./data";

/// Everything one batch needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Image collection id, or a single image id with `single_image`.
    pub catalog: String,
    /// Country code; names the directory under `base_dir`.
    pub iso: String,
    /// GeoJSON boundary dataset.
    pub boundary: PathBuf,
    /// Feature property holding the region identifier.
    pub id_field: String,
    /// Only process the region with this identifier.
    pub region: Option<String>,
    pub years: Vec<i32>,
    pub months: Vec<u32>,
    /// Bands to download. Defaults to the sensor's RGB bands.
    pub bands: Option<Vec<String>>,
    pub sensor: SensorGeneration,
    /// Meters per pixel.
    pub scale: f64,
    pub crs: String,
    /// Use the simple cloud-free composite instead of the median.
    pub cloud_free: bool,
    /// `catalog` names one image; no date filtering or compositing.
    pub single_image: bool,
    /// Crop PNGs to the top-left 256x256 window.
    pub crop: bool,
    pub png_suffix: String,
    pub base_dir: PathBuf,
    /// Worker threads across regions. 1 runs sequentially.
    pub jobs: usize,
    /// Cloud project the imagery service bills against.
    pub project: String,
    /// Environment variable holding the access token.
    pub token_env: String,
    pub api_base: String,
    /// Per-request timeout for service calls and downloads.
    pub timeout_secs: u64,
    /// Write the batch report as JSON here.
    pub report: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            catalog: DEFAULT_CATALOG.to_string(),
            iso: String::new(),
            boundary: PathBuf::new(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            region: None,
            years: Vec::new(),
            months: Vec::new(),
            bands: None,
            sensor: SensorGeneration::default(),
            scale: DEFAULT_SCALE,
            crs: DEFAULT_CRS.to_string(),
            cloud_free: false,
            single_image: false,
            crop: false,
            png_suffix: String::new(),
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            jobs: 1,
            project: String::new(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
            report: None,
        }
    }
}

impl BatchConfig {
    /// Load a configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> RunnerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Parse a configuration from YAML text.
    pub fn from_yaml(text: &str) -> RunnerResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Check the settings every subcommand depends on.
    pub fn validate(&self) -> RunnerResult<()> {
        if self.iso.trim().is_empty() {
            return Err(RunnerError::ConfigError("iso must not be empty".to_string()));
        }
        if !is_plain_component(&self.iso) {
            return Err(RunnerError::ConfigError(format!(
                "iso {:?} must be a plain directory name",
                self.iso
            )));
        }
        if let Some(region) = self.region.as_deref().filter(|r| !is_plain_component(r)) {
            return Err(RunnerError::ConfigError(format!(
                "region {:?} must be a plain directory name",
                region
            )));
        }
        if self.boundary.as_os_str().is_empty() {
            return Err(RunnerError::ConfigError("boundary must be set".to_string()));
        }
        if !self.single_image {
            if self.years.is_empty() {
                return Err(RunnerError::ConfigError("years must not be empty".to_string()));
            }
            if self.months.is_empty() {
                return Err(RunnerError::ConfigError("months must not be empty".to_string()));
            }
        }
        if let Some(month) = self.months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(RunnerError::ConfigError(format!(
                "month {} is outside 1-12",
                month
            )));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(RunnerError::ConfigError(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        if self.jobs == 0 {
            return Err(RunnerError::ConfigError("jobs must be at least 1".to_string()));
        }
        if matches!(&self.bands, Some(bands) if bands.is_empty()) {
            return Err(RunnerError::ConfigError("bands must not be empty".to_string()));
        }
        Ok(())
    }

    /// Extra checks for subcommands that talk to the imagery service.
    pub fn validate_for_download(&self) -> RunnerResult<()> {
        self.validate()?;
        if self.project.trim().is_empty() {
            return Err(RunnerError::ConfigError(
                "project must be set to download imagery".to_string(),
            ));
        }
        Ok(())
    }

    /// Bands requested from the service.
    pub fn download_bands(&self) -> Vec<String> {
        self.bands
            .clone()
            .unwrap_or_else(|| self.sensor.download_bands())
    }

    pub fn compositing(&self) -> CompositingMode {
        if self.cloud_free {
            CompositingMode::CloudFree
        } else {
            CompositingMode::Median
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Service settings, with the token read from `token_env`.
    pub fn session_config(&self) -> RunnerResult<SessionConfig> {
        Ok(SessionConfig::from_env(self.project.clone(), &self.token_env)?
            .with_api_base(self.api_base.clone())
            .with_timeout(self.timeout()))
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            sensor: self.sensor,
            crop: self.crop,
            suffix: self.png_suffix.clone(),
        }
    }

    /// The `(year, month)` pairs each region is requested for.
    pub fn periods(&self) -> Vec<(i32, u32)> {
        self.years
            .iter()
            .flat_map(|&year| self.months.iter().map(move |&month| (year, month)))
            .collect()
    }
}
