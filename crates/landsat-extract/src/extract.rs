//! Archive-to-PNG workflow.
//!
//! For every archive in a region's `imagery/` directory the extractor:
//!
//! 1. empties `temp/` and unpacks the archive into it,
//! 2. finds exactly one file per band suffix,
//! 3. reads the three bands as 8-bit arrays and stacks them as RGB,
//! 4. optionally crops to the top-left 256x256 window,
//! 5. writes `pngs/<archive stem><suffix>.png`,
//! 6. empties `temp/` again.
//!
//! A failing archive is reported and skipped. `temp/` is removed once the
//! region is done, whatever happened.

use crate::bands::SensorGeneration;
use crate::composite::{crop_top_left, stack_rgb, write_png, CROP_SIZE};
use crate::raster::BandRaster;
use crate::{ExtractError, Result};
use landsat_common::{BatchReport, RegionDirs, ScopedDir, Stage, UnitOutcome};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// How archives are turned into images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Band numbering of the archives.
    pub sensor: SensorGeneration,
    /// Crop to the top-left 256x256 window.
    pub crop: bool,
    /// Appended to the archive stem in the PNG name.
    pub suffix: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            sensor: SensorGeneration::default(),
            crop: false,
            suffix: String::new(),
        }
    }
}

/// Converts downloaded archives into PNG images.
#[derive(Debug, Clone, Default)]
pub struct BandExtractor {
    options: ExtractOptions,
}

impl BandExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// PNG path for `archive` inside `png_dir`.
    pub fn output_path(&self, archive: &Path, png_dir: &Path) -> PathBuf {
        let stem = archive
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        png_dir.join(format!("{}{}.png", stem, self.options.suffix))
    }

    /// Process every archive of one region.
    ///
    /// `pngs/` is recreated empty first. Per-archive outcomes go into the
    /// returned report; only failing to set up the directories is an error.
    pub fn process_region(&self, region: &str, dirs: &RegionDirs) -> Result<BatchReport> {
        let archives = dirs.archives()?;
        let temp = dirs.prepare_extract()?;
        let png_dir = dirs.png_dir();
        let mut report = BatchReport::new();

        let total = archives.len();
        for (num, archive) in archives.iter().enumerate() {
            let unit = archive
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            info!("Image {} of {} ({})", num + 1, total, unit);

            let outcome = match self.extract_archive(archive, &temp, &png_dir) {
                Ok(path) => {
                    debug!("Wrote {}", path.display());
                    UnitOutcome::Succeeded
                }
                Err(e) => {
                    warn!("Skipping {}: {}", archive.display(), e);
                    UnitOutcome::failed(e.to_string())
                }
            };
            report.record(region, unit, Stage::Extract, outcome);
        }

        if total == 0 {
            info!("No archives for {}", region);
        }

        // `temp` drops here and removes the directory.
        Ok(report)
    }

    /// Turn one archive into one PNG.
    ///
    /// `temp` is emptied before and after, also when this fails.
    pub fn extract_archive(&self, archive: &Path, temp: &ScopedDir, png_dir: &Path) -> Result<PathBuf> {
        temp.clear()?;
        let result = self.extract_into(archive, temp.path(), png_dir);
        let cleared = temp.clear();
        let path = result?;
        cleared?;
        Ok(path)
    }

    fn extract_into(&self, archive: &Path, temp: &Path, png_dir: &Path) -> Result<PathBuf> {
        unpack(archive, temp)?;

        let files = list_files(temp)?;
        let suffixes = self.options.sensor.rgb_suffixes();
        let [red, green, blue] = [
            find_band(&files, &suffixes[0])?,
            find_band(&files, &suffixes[1])?,
            find_band(&files, &suffixes[2])?,
        ];

        let red = BandRaster::from_file(temp.join(red))?;
        let green = BandRaster::from_file(temp.join(green))?;
        let blue = BandRaster::from_file(temp.join(blue))?;

        let mut image = stack_rgb([&red, &green, &blue], self.options.sensor.rgb_bands())?;
        if self.options.crop {
            image = crop_top_left(&image, CROP_SIZE);
        }

        fs::create_dir_all(png_dir)?;
        let path = self.output_path(archive, png_dir);
        write_png(&image, &path)?;
        Ok(path)
    }
}

/// Extract every entry of `archive` into `dest`.
///
/// Returns the number of files written.
pub fn unpack(archive: &Path, dest: &Path) -> Result<usize> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    let mut written = 0;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| ExtractError::UnsafeEntry(entry.name().to_string()))?;
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        written += 1;
    }

    debug!("Unpacked {} files from {}", written, archive.display());
    Ok(written)
}

/// File names directly inside `dir`.
fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            if let Some(name) = entry.file_name().to_str() {
                files.push(name.to_string());
            }
        }
    }
    files.sort();
    Ok(files)
}

/// The single file whose name ends with `suffix`.
fn find_band<'a>(files: &'a [String], suffix: &str) -> Result<&'a str> {
    let matches: Vec<&String> = files.iter().filter(|f| f.ends_with(suffix)).collect();
    match matches.as_slice() {
        [one] => Ok(one.as_str()),
        [] => Err(ExtractError::MissingBand {
            suffix: suffix.to_string(),
        }),
        many => Err(ExtractError::AmbiguousBand {
            suffix: suffix.to_string(),
            files: many.iter().map(|f| f.to_string()).collect(),
        }),
    }
}
