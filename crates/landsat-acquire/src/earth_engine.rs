//! Google Earth Engine REST client.
//!
//! A [`EarthEngineSession`] is opened once per batch and handed to every
//! component that needs the service; there is no global initialization.
//! Requests are blocking.
//!
//! ## Request flow
//!
//! 1. For collection requests, the filtered collection's size is computed
//!    with `value:compute`. An empty collection ends the request with
//!    [`AcquireError::EmptyCollection`].
//! 2. The image expression (load / filter / composite / select / clip /
//!    reproject) is posted to `thumbnails`, which returns a resource name.
//! 3. The download URL is `{api_base}/v1/{name}:getPixels`.
//!
//! Authentication uses an OAuth access token, e.g. the output of
//! `gcloud auth print-access-token`, read from an environment variable.

use crate::expr::{constant, expression, invoke};
use crate::fetch::DEFAULT_FETCH_TIMEOUT;
use crate::geometry::EeGeometry;
use crate::request::{CompositingMode, DownloadRequest, ImageryService};
use crate::{AcquireError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Public Earth Engine endpoint.
pub const DEFAULT_API_BASE: &str = "https://earthengine.googleapis.com";

/// REST API version.
pub const API_VERSION: &str = "v1";

/// Environment variable holding the access token by default.
pub const DEFAULT_TOKEN_ENV: &str = "EE_ACCESS_TOKEN";

/// Default timeout for service calls, shared with archive downloads.
const DEFAULT_TIMEOUT: Duration = DEFAULT_FETCH_TIMEOUT;

/// Connection settings for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Cloud project the requests are billed to.
    pub project: String,
    /// Base URL of the API.
    pub api_base: String,
    /// OAuth access token.
    pub token: String,
    /// Per-call timeout.
    pub timeout: Duration,
}

impl SessionConfig {
    pub fn new(project: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Read the token from the environment variable `token_env`.
    pub fn from_env(project: impl Into<String>, token_env: &str) -> Result<Self> {
        let token = std::env::var(token_env).map_err(|_| {
            AcquireError::Auth(format!("environment variable {} is not set", token_env))
        })?;
        Ok(Self::new(project, token))
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Counters reported when a session closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Calls made to the service.
    pub calls: usize,
    /// Download URLs handed out.
    pub urls_issued: usize,
    /// Requests that found an empty collection.
    pub empty_collections: usize,
}

#[derive(Debug, Deserialize)]
struct ComputeResponse {
    result: Value,
}

#[derive(Debug, Deserialize)]
struct ThumbnailResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// An open connection to Earth Engine.
pub struct EarthEngineSession {
    config: SessionConfig,
    client: reqwest::blocking::Client,
    calls: AtomicUsize,
    urls_issued: AtomicUsize,
    empty_collections: AtomicUsize,
}

impl std::fmt::Debug for EarthEngineSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EarthEngineSession")
            .field("project", &self.config.project)
            .field("api_base", &self.config.api_base)
            .finish()
    }
}

impl EarthEngineSession {
    /// Open a session.
    pub fn open(config: SessionConfig) -> Result<Self> {
        if config.token.trim().is_empty() {
            return Err(AcquireError::Auth("access token is empty".to_string()));
        }
        if config.project.trim().is_empty() {
            return Err(AcquireError::Auth("cloud project is empty".to_string()));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token.trim()))
            .map_err(|_| AcquireError::Auth("access token contains invalid characters".to_string()))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        info!(
            "Opened Earth Engine session (project {}, {})",
            config.project, config.api_base
        );

        Ok(Self {
            config,
            client,
            calls: AtomicUsize::new(0),
            urls_issued: AtomicUsize::new(0),
            empty_collections: AtomicUsize::new(0),
        })
    }

    /// Close the session and return its counters.
    pub fn close(self) -> SessionStats {
        let stats = self.stats();
        info!(
            "Closed Earth Engine session: {} calls, {} download URLs, {} empty collections",
            stats.calls, stats.urls_issued, stats.empty_collections
        );
        stats
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            calls: self.calls.load(Ordering::Relaxed),
            urls_issued: self.urls_issued.load(Ordering::Relaxed),
            empty_collections: self.empty_collections.load(Ordering::Relaxed),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of images in a collection node.
    pub fn collection_size(&self, collection: Value) -> Result<u64> {
        let body = json!({
            "expression": expression(invoke("Collection.size", vec![("collection", collection)])),
        });
        let response: ComputeResponse = self.post("value:compute", &body)?;
        response.result.as_u64().ok_or_else(|| AcquireError::Service {
            status: 200,
            message: format!("collection size is not a count: {}", response.result),
        })
    }

    /// Resolve a thumbnail resource name into its download URL.
    pub fn pixels_url(&self, name: &str) -> String {
        format!("{}/{}/{}:getPixels", self.config.api_base, API_VERSION, name)
    }

    fn post<T: for<'de> Deserialize<'de>>(&self, method: &str, body: &Value) -> Result<T> {
        let url = format!(
            "{}/{}/projects/{}/{}",
            self.config.api_base, API_VERSION, self.config.project, method
        );
        debug!("POST {}", url);
        self.calls.fetch_add(1, Ordering::Relaxed);

        let response = self.client.post(&url).json(body).send()?;
        let status = response.status();
        let text = response.text()?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| text.trim().to_string());
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(AcquireError::Auth(message));
            }
            return Err(AcquireError::Service {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

impl ImageryService for EarthEngineSession {
    fn download_url(&self, request: &DownloadRequest) -> Result<String> {
        request.check_pixel_budget()?;

        let image = if request.single_image {
            single_image(request)
        } else {
            let collection = filtered_collection(request);
            let size = self.collection_size(collection.clone())?;
            info!(
                "{} has {} images available{}",
                request.region,
                size,
                request.window_label()
            );
            if size == 0 {
                self.empty_collections.fetch_add(1, Ordering::Relaxed);
                return Err(AcquireError::EmptyCollection {
                    catalog: request.catalog.clone(),
                    region: request.region.clone(),
                    window: request.window_label(),
                });
            }
            composite(request, collection)
        };

        let body = json!({
            "expression": expression(export_image(request, image)),
            "fileFormat": request.format.api_name(),
            "bandIds": request.bands,
            "filenamePrefix": request.name,
        });
        let thumbnail: ThumbnailResponse = self.post("thumbnails", &body)?;
        self.urls_issued.fetch_add(1, Ordering::Relaxed);

        let url = self.pixels_url(&thumbnail.name);
        debug!("Download URL for {}: {}", request.name, url);
        Ok(url)
    }
}

/// `ImageCollection.load`, filtered by date (when given) and bounds.
pub(crate) fn filtered_collection(request: &DownloadRequest) -> Value {
    let mut collection = invoke(
        "ImageCollection.load",
        vec![("id", constant(&request.catalog))],
    );

    if let Some(window) = &request.window {
        let range = invoke(
            "DateRange",
            vec![
                ("start", constant(window.start())),
                ("end", constant(window.end())),
            ],
        );
        let filter = invoke(
            "Filter.dateRangeContains",
            vec![("leftValue", range), ("rightField", constant("system:time_start"))],
        );
        collection = invoke(
            "Collection.filter",
            vec![("collection", collection), ("filter", filter)],
        );
    }

    let bounds_filter = invoke(
        "Filter.intersects",
        vec![
            ("leftField", constant(".all")),
            ("rightValue", request.geometry.node().clone()),
        ],
    );
    invoke(
        "Collection.filter",
        vec![("collection", collection), ("filter", bounds_filter)],
    )
}

/// Reduce a collection to one image with the requested bands.
pub(crate) fn composite(request: &DownloadRequest, collection: Value) -> Value {
    match request.compositing {
        CompositingMode::CloudFree => {
            let image = invoke("Landsat.simpleComposite", vec![("collection", collection)]);
            select_bands(image, &request.bands, None)
        }
        CompositingMode::Median => {
            let image = invoke(
                "ImageCollection.reduce",
                vec![
                    ("collection", collection),
                    ("reducer", invoke("Reducer.median", Vec::new())),
                ],
            );
            // The reducer appends `_median` to every band name.
            let reduced: Vec<String> = request.bands.iter().map(|b| format!("{b}_median")).collect();
            select_bands(image, &reduced, Some(&request.bands))
        }
    }
}

fn single_image(request: &DownloadRequest) -> Value {
    let image = invoke("Image.load", vec![("id", constant(&request.catalog))]);
    select_bands(image, &request.bands, None)
}

fn select_bands(image: Value, bands: &[String], new_names: Option<&[String]>) -> Value {
    if bands.is_empty() {
        return image;
    }
    let mut arguments = vec![("input", image), ("bandSelectors", constant(bands))];
    if let Some(names) = new_names {
        arguments.push(("newNames", constant(names)));
    }
    invoke("Image.select", arguments)
}

/// Clip to the region, reproject, and bound the export to the region's box.
pub(crate) fn export_image(request: &DownloadRequest, image: Value) -> Value {
    let clipped = invoke(
        "Image.clip",
        vec![("input", image), ("geometry", request.geometry.node().clone())],
    );
    let reprojected = invoke(
        "Image.reproject",
        vec![
            ("image", clipped),
            ("crs", invoke("Projection", vec![("crs", constant(&request.crs))])),
            ("scale", constant(request.scale)),
        ],
    );
    invoke(
        "Image.clipToBoundsAndScale",
        vec![
            ("input", reprojected),
            ("geometry", EeGeometry::rectangle(&request.bounds).into_node()),
            ("scale", constant(request.scale)),
        ],
    )
}
