//! High dynamic range RGB bitmaps.
//!
//! A `Bitmap` is the finished, normalized image: one linear RGB float
//! triple per pixel with no border. Saving goes through the `image` crate,
//! as PNG (sRGB tonemapped, 8 bit) or OpenEXR (linear float).

use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgb32FImage, RgbImage};

use crate::error::{BitmapError, BitmapResult};

/// Channels stored per pixel.
pub const BITMAP_CHANNEL_COUNT: usize = 3;

/// Linear RGB float image in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    data: Vec<f32>,
}

impl Bitmap {
    /// Create a black bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize * BITMAP_CHANNEL_COUNT],
        }
    }

    /// Wrap an existing `width * height * 3` buffer.
    pub fn from_raw(width: u32, height: u32, data: Vec<f32>) -> BitmapResult<Self> {
        let expected = width as usize * height as usize * BITMAP_CHANNEL_COUNT;
        if data.len() != expected {
            return Err(BitmapError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Clear the bitmap to zero.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * BITMAP_CHANNEL_COUNT
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> [f32; 3] {
        let i = self.index(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: [f32; 3]) {
        let i = self.index(x, y);
        self.data[i..i + BITMAP_CHANNEL_COUNT].copy_from_slice(&color);
    }

    /// Raw linear RGB values.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Tonemap to 8-bit sRGB.
    pub fn to_rgb8(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let [r, g, b] = self.get(x, y);
            image::Rgb([to_srgb8(r), to_srgb8(g), to_srgb8(b)])
        })
    }

    /// Save as PNG or EXR depending on the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> BitmapResult<()> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "png" => self.save_png(path),
            "exr" => self.save_exr(path),
            _ => Err(BitmapError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save as a PNG file with sRGB tonemapping.
    pub fn save_png(&self, path: impl AsRef<Path>) -> BitmapResult<()> {
        let path = path.as_ref();
        self.to_rgb8().save_with_format(path, ImageFormat::Png)?;
        log::info!("Wrote {}x{} PNG to {}", self.width, self.height, path.display());
        Ok(())
    }

    /// Save as a linear OpenEXR file.
    pub fn save_exr(&self, path: impl AsRef<Path>) -> BitmapResult<()> {
        let path = path.as_ref();
        let buffer = Rgb32FImage::from_raw(self.width, self.height, self.data.clone()).ok_or(
            BitmapError::SizeMismatch {
                expected: self.width as usize * self.height as usize * BITMAP_CHANNEL_COUNT,
                actual: self.data.len(),
            },
        )?;
        DynamicImage::ImageRgb32F(buffer).save_with_format(path, ImageFormat::OpenExr)?;
        log::info!("Wrote {}x{} EXR to {}", self.width, self.height, path.display());
        Ok(())
    }
}

/// Linear to sRGB transfer curve.
#[inline]
pub fn linear_to_srgb(value: f32) -> f32 {
    if value <= 0.0031308 {
        12.92 * value
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

#[inline]
fn to_srgb8(value: f32) -> u8 {
    (255.0 * linear_to_srgb(value).clamp(0.0, 1.0)).round() as u8
}
