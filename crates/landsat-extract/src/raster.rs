//! Single-band raster loading.

use crate::{ExtractError, Result};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::ColorType;

/// One band, already cast to 8 bits, in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandRaster {
    /// Pixel values, north to south, west to east.
    data: Vec<u8>,
    /// Width in pixels.
    width: u32,
    /// Height in pixels.
    height: u32,
}

impl BandRaster {
    /// Wrap existing 8-bit data. `data.len()` must equal `width * height`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
        })
    }

    /// Load a band from a GeoTIFF file, casting every sample to `u8`.
    ///
    /// The cast wraps the way an unsigned 8-bit array cast does: integers are
    /// taken modulo 256 and floats are truncated first.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let mut decoder = Decoder::new(std::io::BufReader::new(file))?;

        // A full Landsat scene band is about 8000 x 8000 16-bit samples.
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 1024 * 1024 * 1024; // 1 GB
        limits.intermediate_buffer_size = 1024 * 1024 * 1024; // 1 GB
        limits.ifd_value_size = 1024 * 1024 * 1024;
        decoder = decoder.with_limits(limits);

        match decoder.colortype()? {
            ColorType::Gray(_) => {}
            other => {
                return Err(ExtractError::NotSingleBand {
                    path: path.to_path_buf(),
                    color_type: format!("{:?}", other),
                })
            }
        }

        let (width, height) = decoder.dimensions()?;
        let data = Self::decode_u8(&mut decoder)?;

        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Decode the first image and cast it to 8 bits.
    fn decode_u8<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Result<Vec<u8>> {
        let result = decoder.read_image()?;

        Ok(match result {
            DecodingResult::U8(data) => data,
            DecodingResult::U16(data) => data.into_iter().map(|v| v as u8).collect(),
            DecodingResult::U32(data) => data.into_iter().map(|v| v as u8).collect(),
            DecodingResult::U64(data) => data.into_iter().map(|v| v as u8).collect(),
            DecodingResult::I8(data) => data.into_iter().map(|v| v as u8).collect(),
            DecodingResult::I16(data) => data.into_iter().map(|v| v as u8).collect(),
            DecodingResult::I32(data) => data.into_iter().map(|v| v as u8).collect(),
            DecodingResult::I64(data) => data.into_iter().map(|v| v as u8).collect(),
            DecodingResult::F32(data) => data.into_iter().map(|v| float_to_u8(v as f64)).collect(),
            DecodingResult::F64(data) => data.into_iter().map(float_to_u8).collect(),
        })
    }

    /// Get the dimensions of this band in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Value at pixel (x, y).
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((y * self.width + x) as usize).copied()
    }
}

/// Truncate toward zero, then wrap into 0..=255. NaN becomes 0.
fn float_to_u8(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.trunc() as i64) as u8
}
