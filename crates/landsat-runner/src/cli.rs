//! Command-line interface.

use crate::config::BatchConfig;
use crate::error::RunnerResult;
use crate::pipeline::Mode;
use clap::{Args, Parser, Subcommand};
use landsat_extract::SensorGeneration;
use std::path::PathBuf;

/// Download Landsat composites per administrative region and turn them
/// into RGB PNGs.
#[derive(Debug, Parser)]
#[command(name = "landsat-prep", version)]
pub struct Cli {
    /// YAML batch configuration.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Request composites and download their archives.
    Download,
    /// Convert downloaded archives into PNGs.
    Extract,
    /// Download, then extract.
    Run,
}

impl Command {
    pub fn mode(&self) -> Mode {
        match self {
            Command::Download => Mode::Download,
            Command::Extract => Mode::Extract,
            Command::Run => Mode::Run,
        }
    }
}

/// Flags that replace values from the configuration file.
#[derive(Debug, Default, Args)]
pub struct Overrides {
    #[arg(long, global = true)]
    pub catalog: Option<String>,

    /// Country code.
    #[arg(long, global = true)]
    pub iso: Option<String>,

    /// GeoJSON boundary dataset.
    #[arg(long, global = true)]
    pub boundary: Option<PathBuf>,

    #[arg(long, global = true)]
    pub id_field: Option<String>,

    /// Only process this region identifier.
    #[arg(long, global = true)]
    pub region: Option<String>,

    #[arg(long, global = true, value_delimiter = ',')]
    pub years: Option<Vec<i32>>,

    #[arg(long, global = true, value_delimiter = ',')]
    pub months: Option<Vec<u32>>,

    #[arg(long, global = true, value_delimiter = ',')]
    pub bands: Option<Vec<String>>,

    /// landsat5 or landsat8.
    #[arg(long, global = true)]
    pub sensor: Option<SensorGeneration>,

    /// Meters per pixel.
    #[arg(long, global = true)]
    pub scale: Option<f64>,

    #[arg(long, global = true)]
    pub crs: Option<String>,

    /// Cloud-free composite instead of the median. `--cloud-free=false`
    /// turns it off.
    #[arg(long, global = true, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub cloud_free: Option<bool>,

    /// Treat the catalog as one image. `--single-image=false` turns it off.
    #[arg(long, global = true, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub single_image: Option<bool>,

    /// Crop PNGs to 256x256. `--crop=false` turns it off.
    #[arg(long, global = true, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub crop: Option<bool>,

    #[arg(long, global = true)]
    pub png_suffix: Option<String>,

    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Worker threads across regions.
    #[arg(short, long, global = true)]
    pub jobs: Option<usize>,

    #[arg(long, global = true)]
    pub project: Option<String>,

    #[arg(long, global = true)]
    pub token_env: Option<String>,

    #[arg(long, global = true)]
    pub api_base: Option<String>,

    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Write the batch report as JSON.
    #[arg(long, global = true)]
    pub report: Option<PathBuf>,
}

impl Overrides {
    /// Replace every value of `config` that was given on the command line.
    pub fn apply(&self, config: &mut BatchConfig) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }

        set(&mut config.catalog, &self.catalog);
        set(&mut config.iso, &self.iso);
        set(&mut config.boundary, &self.boundary);
        set(&mut config.id_field, &self.id_field);
        set(&mut config.years, &self.years);
        set(&mut config.months, &self.months);
        set(&mut config.sensor, &self.sensor);
        set(&mut config.cloud_free, &self.cloud_free);
        set(&mut config.single_image, &self.single_image);
        set(&mut config.crop, &self.crop);
        set(&mut config.scale, &self.scale);
        set(&mut config.crs, &self.crs);
        set(&mut config.png_suffix, &self.png_suffix);
        set(&mut config.base_dir, &self.base_dir);
        set(&mut config.jobs, &self.jobs);
        set(&mut config.project, &self.project);
        set(&mut config.token_env, &self.token_env);
        set(&mut config.api_base, &self.api_base);
        set(&mut config.timeout_secs, &self.timeout_secs);

        if self.region.is_some() {
            config.region = self.region.clone();
        }
        if self.bands.is_some() {
            config.bands = self.bands.clone();
        }
        if self.report.is_some() {
            config.report = self.report.clone();
        }
    }
}

impl Cli {
    /// The configuration file (or defaults) with command-line overrides
    /// applied.
    pub fn load_config(&self) -> RunnerResult<BatchConfig> {
        let mut config = match &self.config {
            Some(path) => BatchConfig::from_file(path)?,
            None => BatchConfig::default(),
        };
        self.overrides.apply(&mut config);
        Ok(config)
    }
}
