//! # landsat-common
//!
//! Shared building blocks for the landsat-prep workspace:
//!
//! - [`RegionDirs`]: the per-region directory layout
//!   (`<base>/<ISO>/<region>/{imagery,temp,pngs}`) together with the
//!   [`ensure_clean_dir`] primitive and the [`ScopedDir`] guard.
//! - [`UnitOutcome`] and [`BatchReport`]: per-unit results collected across a
//!   batch so that one region's (or one archive's) failure never hides the
//!   others.
//!
//! ## Example
//!
//! ```no_run
//! use landsat_common::{RegionDirs, ScopedDir};
//!
//! let dirs = RegionDirs::new("./data", "NPL", "NPL-ADM2-1590546715-B1");
//! dirs.prepare_download()?;          // imagery/ is now empty
//! let temp = ScopedDir::acquire(dirs.temp_dir())?;
//! // ... extract archives into `temp.path()` ...
//! drop(temp);                        // temp/ is gone
//! # Ok::<(), landsat_common::WorkspaceError>(())
//! ```

mod error;
mod outcome;
mod workspace;

pub use error::WorkspaceError;
pub use outcome::{BatchReport, Stage, UnitOutcome, UnitReport};
pub use workspace::{
    ensure_clean_dir, is_plain_component, RegionDirs, ScopedDir, IMAGERY_DIR, PNG_DIR,
    TEMP_DIR,
};

/// Result type for workspace operations.
pub type Result<T> = std::result::Result<T, WorkspaceError>;
