//! Shared fixtures for runner integration tests.

#![allow(dead_code)]

use landsat_acquire::{AcquireError, DownloadRequest, ImageryService};
use std::collections::HashSet;
use std::io::{BufRead, BufReader, Cursor, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use tiff::encoder::{colortype, TiffEncoder};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

// ============================================================================
// Archives
// ============================================================================

fn tiff_bytes(size: u32, value: u16) -> Vec<u8> {
    let data = vec![value; (size * size) as usize];
    let mut cursor = Cursor::new(Vec::new());
    TiffEncoder::new(&mut cursor)
        .unwrap()
        .write_image::<colortype::Gray16>(size, size, &data)
        .unwrap();
    cursor.into_inner()
}

/// Zip of constant-valued bands named `download.<band>.tif`.
pub fn band_archive(size: u32, bands: &[(&str, u16)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (band, value) in bands {
        zip.start_file(format!("download.{band}.tif"), SimpleFileOptions::default())
            .unwrap();
        zip.write_all(&tiff_bytes(size, *value)).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

// ============================================================================
// HTTP stub
// ============================================================================

/// Serves the same body to `connections` GET requests, then stops.
pub struct ArchiveServer {
    addr: String,
    handle: JoinHandle<usize>,
}

impl ArchiveServer {
    pub fn start(body: Vec<u8>, connections: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let mut served = 0;
            for stream in listener.incoming().take(connections) {
                respond(stream.unwrap(), &body);
                served += 1;
            }
            served
        });
        Self { addr, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.addr, path)
    }

    /// Wait until every expected connection was served.
    pub fn finish(self) -> usize {
        self.handle.join().unwrap()
    }
}

fn respond(mut stream: TcpStream, body: &[u8]) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
            break;
        }
    }
    write!(
        stream,
        "HTTP/1.1 200 OK\r\nContent-Type: application/zip\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .unwrap();
    stream.write_all(body).unwrap();
    stream.flush().unwrap();
}

// ============================================================================
// Imagery service
// ============================================================================

/// Imagery service that hands out URLs of an [`ArchiveServer`].
///
/// Regions listed in `empty` have no images; regions in `failing` get a
/// service error.
pub struct MockService {
    base_url: String,
    empty: HashSet<String>,
    failing: HashSet<String>,
    requests: Mutex<Vec<String>>,
}

impl MockService {
    pub fn new(server: &ArchiveServer) -> Self {
        Self {
            base_url: server.url("pixels"),
            empty: HashSet::new(),
            failing: HashSet::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_empty(mut self, region: &str) -> Self {
        self.empty.insert(region.to_string());
        self
    }

    pub fn with_failing(mut self, region: &str) -> Self {
        self.failing.insert(region.to_string());
        self
    }

    /// Names of every request seen, sorted.
    pub fn requests(&self) -> Vec<String> {
        let mut names = self.requests.lock().unwrap().clone();
        names.sort();
        names
    }
}

impl ImageryService for MockService {
    fn download_url(&self, request: &DownloadRequest) -> Result<String, AcquireError> {
        self.requests.lock().unwrap().push(request.name.clone());

        if self.empty.contains(&request.region) {
            return Err(AcquireError::EmptyCollection {
                catalog: request.catalog.clone(),
                region: request.region.clone(),
                window: request.window_label(),
            });
        }
        if self.failing.contains(&request.region) {
            return Err(AcquireError::Service {
                status: 500,
                message: "internal error".to_string(),
            });
        }
        Ok(format!("{}/{}", self.base_url, request.name))
    }
}

// ============================================================================
// Boundaries
// ============================================================================

/// Square feature with the given `shapeID`, `offset` degrees east.
pub fn square_feature(id: &str, offset: f64) -> String {
    let (x0, x1) = (85.0 + offset, 85.01 + offset);
    format!(
        r#"{{"type":"Feature","properties":{{"shapeID":"{id}"}},
            "geometry":{{"type":"Polygon","coordinates":[[[{x0},27.0],[{x1},27.0],[{x1},27.01],[{x0},27.01],[{x0},27.0]]]}}}}"#
    )
}

pub fn feature_collection(features: &[String]) -> String {
    format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features.join(",")
    )
}
