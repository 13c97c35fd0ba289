//! Per-region directory layout.
//!
//! Every region gets its own tree under the country code:
//!
//! ```text
//! <base>/<ISO>/<region>/imagery/*.zip   downloaded archives
//! <base>/<ISO>/<region>/temp/*.tif      transient band files
//! <base>/<ISO>/<region>/pngs/*.png      output images
//! ```
//!
//! Directories that already exist are never reused as-is: they are removed
//! and recreated so stale files from an earlier run cannot leak into this one.

use crate::{Result, WorkspaceError};
use std::fs;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Name of the archive directory inside a region.
pub const IMAGERY_DIR: &str = "imagery";

/// Name of the transient extraction directory inside a region.
pub const TEMP_DIR: &str = "temp";

/// Name of the PNG output directory inside a region.
pub const PNG_DIR: &str = "pngs";

/// Whether `name` is usable as exactly one directory or file name.
///
/// Rejects empty names, `.` and `..`, absolute paths and anything holding a
/// path separator.
pub fn is_plain_component(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(first)), None) => first == OsStr::new(name),
        _ => false,
    }
}

/// Remove `path` if it exists and create it again, empty.
///
/// Calling this twice in a row yields the same result as calling it once.
pub fn ensure_clean_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if path.exists() {
        if !path.is_dir() {
            return Err(WorkspaceError::NotADirectory(path.to_path_buf()));
        }
        debug!("Removing existing directory {}", path.display());
        fs::remove_dir_all(path).map_err(|source| WorkspaceError::Remove {
            path: path.to_path_buf(),
            source,
        })?;
    }

    fs::create_dir_all(path).map_err(|source| WorkspaceError::Create {
        path: path.to_path_buf(),
        source,
    })
}

/// Directory layout for one region of one country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionDirs {
    root: PathBuf,
}

impl RegionDirs {
    /// Layout for `region` under `<base>/<iso>/`.
    pub fn new<P: AsRef<Path>>(base: P, iso: &str, region: &str) -> Self {
        Self {
            root: base.as_ref().join(iso).join(region),
        }
    }

    /// Like [`RegionDirs::new`], but refuses an `iso` or `region` that is not
    /// a single plain path component.
    pub fn checked<P: AsRef<Path>>(base: P, iso: &str, region: &str) -> Result<Self> {
        for name in [iso, region] {
            if !is_plain_component(name) {
                return Err(WorkspaceError::InvalidName(name.to_string()));
            }
        }
        Ok(Self::new(base, iso, region))
    }

    /// The region's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding downloaded archives.
    pub fn imagery_dir(&self) -> PathBuf {
        self.root.join(IMAGERY_DIR)
    }

    /// Directory used while extracting an archive.
    pub fn temp_dir(&self) -> PathBuf {
        self.root.join(TEMP_DIR)
    }

    /// Directory receiving the PNG output.
    pub fn png_dir(&self) -> PathBuf {
        self.root.join(PNG_DIR)
    }

    /// Path of the archive called `name` (without extension).
    pub fn archive_path(&self, name: &str) -> PathBuf {
        self.imagery_dir().join(format!("{name}.zip"))
    }

    /// Start a fresh download: `imagery/` is emptied.
    pub fn prepare_download(&self) -> Result<()> {
        ensure_clean_dir(self.imagery_dir())
    }

    /// Start a fresh extraction: `pngs/` is emptied and `temp/` is acquired.
    ///
    /// The returned guard removes `temp/` when dropped.
    pub fn prepare_extract(&self) -> Result<ScopedDir> {
        ensure_clean_dir(self.png_dir())?;
        ScopedDir::acquire(self.temp_dir())
    }

    /// Clean all three working directories at once.
    pub fn prepare_all(&self) -> Result<()> {
        ensure_clean_dir(self.imagery_dir())?;
        ensure_clean_dir(self.temp_dir())?;
        ensure_clean_dir(self.png_dir())
    }

    /// List the `*.zip` archives in `imagery/`, sorted by file name.
    pub fn archives(&self) -> Result<Vec<PathBuf>> {
        let dir = self.imagery_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut archives = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let is_zip = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("zip"))
                .unwrap_or(false);
            if path.is_file() && is_zip {
                archives.push(path);
            }
        }
        archives.sort();
        Ok(archives)
    }
}

/// A directory that exists, empty, for as long as the guard lives.
///
/// The directory is removed when the guard is dropped, including when the
/// owner unwinds early through `?`.
#[derive(Debug)]
pub struct ScopedDir {
    path: PathBuf,
}

impl ScopedDir {
    /// Create `path` empty, replacing anything already there.
    pub fn acquire<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        ensure_clean_dir(&path)?;
        Ok(Self { path })
    }

    /// Path of the managed directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete every entry inside the directory, keeping the directory itself.
    pub fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            fs::create_dir_all(&self.path)?;
            return Ok(());
        }

        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Number of entries currently inside the directory.
    pub fn entry_count(&self) -> Result<usize> {
        Ok(fs::read_dir(&self.path)?.count())
    }
}

impl Drop for ScopedDir {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_dir_all(&self.path) {
                warn!("Failed to remove {}: {}", self.path.display(), e);
            }
        }
    }
}
