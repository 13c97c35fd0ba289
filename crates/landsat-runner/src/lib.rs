//! # landsat-runner
//!
//! Batch driver for `landsat-prep`: loads a [`BatchConfig`], reads the
//! boundary dataset, and runs the download and extract stages over every
//! region, collecting a [`BatchReport`].

pub mod cli;
pub mod config;
mod error;
pub mod pipeline;

pub use cli::{Cli, Command, Overrides};
pub use config::BatchConfig;
pub use error::{RunnerError, RunnerResult};
pub use pipeline::{group_regions, Mode, Pipeline, RegionGroup};

use landsat_acquire::{ArchiveFetcher, BoundaryLoader, EarthEngineSession, Region};
use landsat_common::BatchReport;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Regions of the boundary dataset, narrowed to `config.region` if set.
pub fn load_regions(config: &BatchConfig) -> RunnerResult<Vec<Region>> {
    let mut loader = BoundaryLoader::new(config.id_field.clone());
    if let Some(region) = &config.region {
        loader = loader.with_filter(region.clone());
    }
    let regions = loader.load(&config.boundary)?;
    if regions.is_empty() {
        return Err(RunnerError::ConfigError(format!(
            "no regions found in {}",
            config.boundary.display()
        )));
    }
    Ok(regions)
}

/// Run one batch end to end against the live imagery service.
///
/// The session is closed whether or not the batch succeeds.
pub fn run_batch(config: &BatchConfig, mode: Mode) -> RunnerResult<BatchReport> {
    if mode.downloads() {
        config.validate_for_download()?;
    } else {
        config.validate()?;
    }
    let regions = load_regions(config)?;

    if !mode.downloads() {
        return Pipeline::new(config).run(&regions, mode);
    }

    let session = EarthEngineSession::open(config.session_config()?)?;
    let fetcher = ArchiveFetcher::with_timeout(config.timeout())?;
    let report = Pipeline::new(config)
        .with_acquisition(&session, &fetcher)
        .run(&regions, mode);

    let downloads = fetcher.download_stats();
    let stats = session.close();
    info!(
        "Session closed: {} calls, {} URLs, {} empty collections; {} archives ({} bytes)",
        stats.calls,
        stats.urls_issued,
        stats.empty_collections,
        downloads.archives_downloaded,
        downloads.bytes_downloaded
    );
    report
}

#[derive(Serialize)]
struct ReportFile<'a> {
    generated_at: String,
    mode: String,
    iso: &'a str,
    succeeded: usize,
    skipped: usize,
    failed: usize,
    #[serde(flatten)]
    report: &'a BatchReport,
}

/// Write `report` as pretty-printed JSON.
pub fn write_report<P: AsRef<Path>>(
    report: &BatchReport,
    config: &BatchConfig,
    mode: Mode,
    path: P,
) -> RunnerResult<()> {
    let file = ReportFile {
        generated_at: chrono::Utc::now().to_rfc3339(),
        mode: mode.to_string(),
        iso: &config.iso,
        succeeded: report.succeeded(),
        skipped: report.skipped(),
        failed: report.failed(),
        report,
    };
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path.as_ref(), serde_json::to_string_pretty(&file)?)?;
    info!("Report written to {}", path.as_ref().display());
    Ok(())
}
