//! Archive download.
//!
//! The fetcher performs one plain GET per archive, follows redirects, and
//! writes the complete body to disk only once it has arrived, so a failed
//! transfer never leaves a partial zip behind for the extractor to trip on.
//! There is no retry and no checksum.

use crate::{AcquireError, Result};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Default transfer timeout. Large regions can take minutes to render.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(300);

/// Download statistics for the fetcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadStats {
    /// Number of archives downloaded this session.
    pub archives_downloaded: usize,
    /// Total bytes downloaded this session.
    pub bytes_downloaded: u64,
}

/// Blocking HTTP downloader for imagery archives.
pub struct ArchiveFetcher {
    client: reqwest::blocking::Client,
    archives_downloaded: AtomicUsize,
    bytes_downloaded: AtomicU64,
}

impl std::fmt::Debug for ArchiveFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveFetcher")
            .field("stats", &self.download_stats())
            .finish()
    }
}

impl ArchiveFetcher {
    /// Create a fetcher with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    /// Create a fetcher with a specific timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            archives_downloaded: AtomicUsize::new(0),
            bytes_downloaded: AtomicU64::new(0),
        })
    }

    /// Get download statistics for this session.
    pub fn download_stats(&self) -> DownloadStats {
        DownloadStats {
            archives_downloaded: self.archives_downloaded.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
        }
    }

    /// Download `url` into `dest`. Returns the number of bytes written.
    pub fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        let name = dest
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("archive")
            .to_string();

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        debug!("GET {}", url);
        let response = self.client.get(url).send()?;

        if !response.status().is_success() {
            return Err(AcquireError::DownloadFailed {
                name,
                reason: format!("HTTP {}", response.status()),
            });
        }

        let bytes = response.bytes()?;
        if bytes.is_empty() {
            return Err(AcquireError::DownloadFailed {
                name,
                reason: "empty response body".to_string(),
            });
        }

        if let Err(e) = fs::write(dest, &bytes) {
            let _ = fs::remove_file(dest);
            return Err(e.into());
        }

        let len = bytes.len() as u64;
        self.archives_downloaded.fetch_add(1, Ordering::Relaxed);
        self.bytes_downloaded.fetch_add(len, Ordering::Relaxed);
        info!("Saved {} ({} bytes)", dest.display(), len);

        Ok(len)
    }
}
