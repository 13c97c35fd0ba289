//! Band stacking, cropping and PNG output.

use crate::raster::BandRaster;
use crate::{ExtractError, Result};
use image::{ImageFormat, Rgb, RgbImage};
use std::path::Path;

/// Edge length of the fixed crop window.
pub const CROP_SIZE: u32 = 256;

/// Stack three bands into an RGB image, first band red, last band blue.
///
/// `names` label the bands in error messages.
pub fn stack_rgb(bands: [&BandRaster; 3], names: [&str; 3]) -> Result<RgbImage> {
    let (width, height) = bands[0].dimensions();
    for (band, name) in bands.iter().zip(names).skip(1) {
        let (found_width, found_height) = band.dimensions();
        if (found_width, found_height) != (width, height) {
            return Err(ExtractError::ShapeMismatch {
                band: name.to_string(),
                width,
                height,
                found_width,
                found_height,
            });
        }
    }

    let [red, green, blue] = bands.map(BandRaster::data);
    Ok(RgbImage::from_fn(width, height, |x, y| {
        let i = (y * width + x) as usize;
        Rgb([red[i], green[i], blue[i]])
    }))
}

/// Top-left `size` x `size` window of `image`.
///
/// Parts of the window beyond the image are filled with black, so the result
/// is always `size` x `size`.
pub fn crop_top_left(image: &RgbImage, size: u32) -> RgbImage {
    let mut out = RgbImage::from_pixel(size, size, Rgb([0, 0, 0]));
    let width = image.width().min(size);
    let height = image.height().min(size);
    for y in 0..height {
        for x in 0..width {
            out.put_pixel(x, y, *image.get_pixel(x, y));
        }
    }
    out
}

/// Write `image` as PNG.
pub fn write_png(image: &RgbImage, path: &Path) -> Result<()> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(width: u32, height: u32, value: u8) -> BandRaster {
        BandRaster::new(width, height, vec![value; (width * height) as usize]).unwrap()
    }

    #[test]
    fn test_stack_order() {
        let (r, g, b) = (band(3, 2, 200), band(3, 2, 150), band(3, 2, 100));
        let image = stack_rgb([&r, &g, &b], ["B3", "B2", "B1"]).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert!(image.pixels().all(|p| p.0 == [200, 150, 100]));
    }

    #[test]
    fn test_stack_keeps_pixel_positions() {
        let r = BandRaster::new(2, 1, vec![1, 2]).unwrap();
        let g = BandRaster::new(2, 1, vec![3, 4]).unwrap();
        let b = BandRaster::new(2, 1, vec![5, 6]).unwrap();
        let image = stack_rgb([&r, &g, &b], ["R", "G", "B"]).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [1, 3, 5]);
        assert_eq!(image.get_pixel(1, 0).0, [2, 4, 6]);
    }

    #[test]
    fn test_stack_shape_mismatch() {
        let (r, g, b) = (band(3, 2, 1), band(3, 2, 1), band(2, 2, 1));
        let err = stack_rgb([&r, &g, &b], ["B4", "B3", "B2"]).unwrap_err();
        match err {
            ExtractError::ShapeMismatch {
                band,
                found_width,
                ..
            } => {
                assert_eq!(band, "B2");
                assert_eq!(found_width, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_crop_larger_image() {
        let image = RgbImage::from_pixel(300, 280, Rgb([9, 8, 7]));
        let cropped = crop_top_left(&image, CROP_SIZE);
        assert_eq!(cropped.dimensions(), (256, 256));
        assert!(cropped.pixels().all(|p| p.0 == [9, 8, 7]));
    }

    #[test]
    fn test_crop_pads_small_image() {
        let image = RgbImage::from_pixel(10, 5, Rgb([1, 2, 3]));
        let cropped = crop_top_left(&image, CROP_SIZE);
        assert_eq!(cropped.dimensions(), (256, 256));
        assert_eq!(cropped.get_pixel(9, 4).0, [1, 2, 3]);
        assert_eq!(cropped.get_pixel(10, 4).0, [0, 0, 0]);
        assert_eq!(cropped.get_pixel(0, 5).0, [0, 0, 0]);
    }

    #[test]
    fn test_write_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let image = RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]));
        write_png(&image, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
