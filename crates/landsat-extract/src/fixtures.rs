//! Synthetic GeoTIFF and zip builders shared by the unit tests.

use std::fs::File;
use std::io::{Cursor, Write};
use std::path::Path;
use tiff::encoder::{colortype, TiffEncoder};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Encode a 16-bit single-band TIFF in memory.
pub(crate) fn gray16_tiff_bytes(width: u32, height: u32, data: &[u16]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    TiffEncoder::new(&mut cursor)
        .unwrap()
        .write_image::<colortype::Gray16>(width, height, data)
        .unwrap();
    cursor.into_inner()
}

pub(crate) fn write_gray16_tiff(path: &Path, width: u32, height: u32, data: &[u16]) {
    std::fs::write(path, gray16_tiff_bytes(width, height, data)).unwrap();
}

pub(crate) fn write_rgb8_tiff(path: &Path, width: u32, height: u32) {
    let data = vec![0u8; (width * height * 3) as usize];
    let file = File::create(path).unwrap();
    TiffEncoder::new(file)
        .unwrap()
        .write_image::<colortype::RGB8>(width, height, &data)
        .unwrap();
}

/// Write a zip containing `(name, bytes)` entries.
pub(crate) fn write_zip(path: &Path, entries: &[(&str, Vec<u8>)]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, bytes) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap();
}

/// Zip of constant-valued bands, one `<prefix>.<band>.tif` per band.
pub(crate) fn write_band_zip(path: &Path, prefix: &str, size: u32, bands: &[(&str, u16)]) {
    let entries: Vec<(String, Vec<u8>)> = bands
        .iter()
        .map(|(band, value)| {
            let data = vec![*value; (size * size) as usize];
            (format!("{prefix}.{band}.tif"), gray16_tiff_bytes(size, size, &data))
        })
        .collect();
    let entries: Vec<(&str, Vec<u8>)> = entries
        .iter()
        .map(|(name, bytes)| (name.as_str(), bytes.clone()))
        .collect();
    write_zip(path, &entries);
}
