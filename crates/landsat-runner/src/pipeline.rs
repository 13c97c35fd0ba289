//! Per-region download and extraction.
//!
//! Regions sharing an identifier (multi-box units) share one directory
//! tree, so they are grouped and each group is prepared once. Groups own
//! disjoint trees and can run on separate threads.

use crate::config::BatchConfig;
use crate::error::{RunnerError, RunnerResult};
use landsat_acquire::{
    AcquireError, ArchiveFetcher, DateWindow, DownloadRequest, ImageryService, Region,
};
use landsat_common::{BatchReport, RegionDirs, Stage, UnitOutcome, WorkspaceError};
use landsat_extract::{BandExtractor, ExtractError};
use rayon::prelude::*;
use std::fmt;
use tracing::{debug, info, warn};

/// Which stages a batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Download,
    Extract,
    /// Download, then extract, per region.
    Run,
}

impl Mode {
    pub fn downloads(&self) -> bool {
        matches!(self, Mode::Download | Mode::Run)
    }

    pub fn extracts(&self) -> bool {
        matches!(self, Mode::Extract | Mode::Run)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Download => write!(f, "download"),
            Mode::Extract => write!(f, "extract"),
            Mode::Run => write!(f, "run"),
        }
    }
}

/// Regions sharing one identifier, in input order.
#[derive(Debug)]
pub struct RegionGroup<'a> {
    pub id: &'a str,
    pub regions: Vec<&'a Region>,
}

/// Group regions by identifier, keeping first-appearance order.
pub fn group_regions(regions: &[Region]) -> Vec<RegionGroup<'_>> {
    let mut groups: Vec<RegionGroup<'_>> = Vec::new();
    for region in regions {
        match groups.iter_mut().find(|g| g.id == region.id()) {
            Some(group) => group.regions.push(region),
            None => groups.push(RegionGroup {
                id: region.id(),
                regions: vec![region],
            }),
        }
    }
    groups
}

struct Acquisition<'a> {
    service: &'a dyn ImageryService,
    fetcher: &'a ArchiveFetcher,
}

/// Drives the download and extract stages over a set of regions.
pub struct Pipeline<'a> {
    config: &'a BatchConfig,
    acquisition: Option<Acquisition<'a>>,
    extractor: BandExtractor,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a BatchConfig) -> Self {
        Self {
            config,
            acquisition: None,
            extractor: BandExtractor::new(config.extract_options()),
        }
    }

    /// Attach the service and fetcher the download stage needs.
    pub fn with_acquisition(
        mut self,
        service: &'a dyn ImageryService,
        fetcher: &'a ArchiveFetcher,
    ) -> Self {
        self.acquisition = Some(Acquisition { service, fetcher });
        self
    }

    /// Directory tree of the region group `id`.
    pub fn dirs_for(&self, id: &str) -> Result<RegionDirs, WorkspaceError> {
        RegionDirs::checked(&self.config.base_dir, &self.config.iso, id)
    }

    /// Download requests for one region, one per period.
    pub fn requests_for(&self, region: &Region) -> RunnerResult<Vec<DownloadRequest>> {
        let config = self.config;
        let base = |name: String| {
            DownloadRequest::new(name, config.catalog.clone(), region)
                .with_bands(config.download_bands())
                .with_scale(config.scale)
                .with_compositing(config.compositing())
                .with_crs(config.crs.clone())
        };

        if config.single_image {
            return Ok(vec![base(region.image_name()).single_image(true)]);
        }

        config
            .periods()
            .into_iter()
            .map(|(year, month)| -> RunnerResult<DownloadRequest> {
                let window = DateWindow::for_month(year, month)?;
                Ok(base(region.archive_name(year, month)).with_window(window))
            })
            .collect()
    }

    /// Run `mode` over all regions.
    ///
    /// Unit failures are recorded in the report. Errors are returned only
    /// when the batch cannot start at all.
    pub fn run(&self, regions: &[Region], mode: Mode) -> RunnerResult<BatchReport> {
        if mode.downloads() && self.acquisition.is_none() {
            return Err(RunnerError::ConfigError(format!(
                "{} needs an imagery service",
                mode
            )));
        }

        let groups = group_regions(regions);
        info!(
            "Processing {} regions ({} directories) with {} job(s): {}",
            regions.len(),
            groups.len(),
            self.config.jobs,
            mode
        );

        let reports: Vec<BatchReport> = if self.config.jobs > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.jobs)
                .build()?;
            pool.install(|| {
                groups
                    .par_iter()
                    .map(|group| self.run_group(group, mode))
                    .collect()
            })
        } else {
            groups.iter().map(|group| self.run_group(group, mode)).collect()
        };

        let mut report = BatchReport::new();
        for r in reports {
            report.merge(r);
        }
        Ok(report)
    }

    fn run_group(&self, group: &RegionGroup<'_>, mode: Mode) -> BatchReport {
        let mut report = BatchReport::new();
        if mode.downloads() {
            report.merge(self.download_group(group));
        }
        if mode.extracts() {
            report.merge(self.extract_group(group));
        }
        report
    }

    /// Download every archive of one region group into its imagery dir.
    pub fn download_group(&self, group: &RegionGroup<'_>) -> BatchReport {
        let mut report = BatchReport::new();
        let Some(acquisition) = &self.acquisition else {
            report.record(
                group.id,
                group.id,
                Stage::Download,
                UnitOutcome::failed("no imagery service configured"),
            );
            return report;
        };

        let dirs = match self.dirs_for(group.id).and_then(|dirs| {
            dirs.prepare_download()?;
            Ok(dirs)
        }) {
            Ok(dirs) => dirs,
            Err(e) => {
                warn!("Cannot prepare directories for {}: {}", group.id, e);
                report.record(group.id, group.id, Stage::Download, UnitOutcome::failed(e.to_string()));
                return report;
            }
        };

        for region in &group.regions {
            let requests = match self.requests_for(region) {
                Ok(requests) => requests,
                Err(e) => {
                    report.record(
                        group.id,
                        region.image_name(),
                        Stage::Download,
                        UnitOutcome::failed(e.to_string()),
                    );
                    continue;
                }
            };

            for request in requests {
                let outcome = match download_one(acquisition, &request, &dirs) {
                    Ok(bytes) => {
                        debug!("{}: {} bytes", request.name, bytes);
                        UnitOutcome::Succeeded
                    }
                    Err(e) if e.is_skip() => {
                        info!("Skipping {}: {}", request.name, e);
                        UnitOutcome::skipped(e.to_string())
                    }
                    Err(e) => {
                        warn!("Download of {} failed: {}", request.name, e);
                        UnitOutcome::failed(e.to_string())
                    }
                };
                report.record(group.id, request.name.clone(), Stage::Download, outcome);
            }
        }
        report
    }

    /// Turn the group's archives into PNGs.
    pub fn extract_group(&self, group: &RegionGroup<'_>) -> BatchReport {
        let result = self
            .dirs_for(group.id)
            .map_err(ExtractError::from)
            .and_then(|dirs| self.extractor.process_region(group.id, &dirs));
        match result {
            Ok(report) => report,
            Err(e) => {
                warn!("Extraction for {} failed: {}", group.id, e);
                let mut report = BatchReport::new();
                report.record(group.id, group.id, Stage::Extract, UnitOutcome::failed(e.to_string()));
                report
            }
        }
    }
}

fn download_one(
    acquisition: &Acquisition<'_>,
    request: &DownloadRequest,
    dirs: &RegionDirs,
) -> Result<u64, AcquireError> {
    info!("Requesting {}{}", request.name, request.window_label());
    let url = acquisition.service.download_url(request)?;
    acquisition.fetcher.fetch(&url, &dirs.archive_path(&request.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};
    use std::path::PathBuf;

    fn region(id: &str) -> Region {
        let poly = polygon![
            (x: 85.0, y: 27.0),
            (x: 85.1, y: 27.0),
            (x: 85.1, y: 27.1),
            (x: 85.0, y: 27.1),
            (x: 85.0, y: 27.0),
        ];
        Region::new(id, MultiPolygon(vec![poly])).unwrap()
    }

    fn config() -> BatchConfig {
        BatchConfig {
            iso: "NPL".to_string(),
            boundary: PathBuf::from("npl.geojson"),
            years: vec![2010, 2011],
            months: vec![5],
            ..BatchConfig::default()
        }
    }

    #[test]
    fn test_group_regions_keeps_order() {
        let regions = vec![
            region("A"),
            region("B").with_box_seq(1),
            region("C"),
            region("B").with_box_seq(2),
        ];
        let groups = group_regions(&regions);
        let ids: Vec<&str> = groups.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(groups[1].regions.len(), 2);
    }

    #[test]
    fn test_requests_for_periods() {
        let config = config();
        let pipeline = Pipeline::new(&config);
        let requests = pipeline.requests_for(&region("R")).unwrap();

        let names: Vec<&str> = requests.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["R_2010_5", "R_2011_5"]);
        assert_eq!(requests[0].bands, vec!["B2", "B3", "B4"]);
        assert_eq!(requests[0].window.map(|w| w.start()), Some("2010-05-01".to_string()));
        assert!(!requests[0].single_image);
    }

    #[test]
    fn test_requests_for_single_image() {
        let config = BatchConfig {
            single_image: true,
            catalog: "LANDSAT/LT05/C01/T1/LT05_141041_20100512".to_string(),
            ..config()
        };
        let pipeline = Pipeline::new(&config);
        let requests = pipeline.requests_for(&region("R").with_box_seq(2)).unwrap();

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].name, "R_box2");
        assert!(requests[0].single_image);
        assert!(requests[0].window.is_none());
    }

    #[test]
    fn test_download_requires_service() {
        let config = config();
        let err = Pipeline::new(&config)
            .run(&[region("R")], Mode::Download)
            .unwrap_err();
        assert!(matches!(err, RunnerError::ConfigError(_)));
    }

    #[test]
    fn test_escaping_iso_fails_without_touching_disk() {
        let base = tempfile::tempdir().unwrap();
        let sibling = base.path().join("sibling");
        std::fs::create_dir_all(sibling.join("pngs")).unwrap();
        std::fs::write(sibling.join("pngs/keep.png"), b"x").unwrap();

        // Built without `validate`.
        let config = BatchConfig {
            base_dir: base.path().join("data"),
            iso: "..".to_string(),
            ..config()
        };
        let report = Pipeline::new(&config)
            .run(&[region("sibling")], Mode::Extract)
            .unwrap();

        assert_eq!(report.failed(), 1);
        assert!(sibling.join("pngs/keep.png").exists());
    }

    #[test]
    fn test_mode_stages() {
        assert!(Mode::Run.downloads() && Mode::Run.extracts());
        assert!(!Mode::Extract.downloads());
        assert!(!Mode::Download.extracts());
    }
}
