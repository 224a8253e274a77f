// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// RasterBuffer — the in-memory RGBA pixel grid passed between the
// enhancement pipeline, the page writer, and the page renderer.

use image::{DynamicImage, RgbaImage};
use scanwerk_core::error::{Result, ScanwerkError};

/// Bytes per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// A `width` x `height` grid of interleaved 8-bit RGBA pixels.
///
/// The pixel vector always holds exactly `width * height * 4` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterBuffer {
    /// Wrap raw RGBA bytes, checking the length invariant.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * CHANNELS;
        if pixels.len() != expected {
            return Err(ScanwerkError::InvalidBuffer(format!(
                "{}x{} buffer needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A buffer with every pixel set to `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * CHANNELS);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Build a buffer pixel-by-pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Convert any decoded image into RGBA.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self::from_rgba_image(image.to_rgba8())
    }

    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// True when the buffer holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Byte offset of pixel (x, y).
    #[inline]
    pub fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// RGBA value at (x, y). Panics when out of bounds, like slice indexing.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        self.pixels[i..i + CHANNELS].copy_from_slice(&rgba);
    }

    /// Mean R, G, B over the whole buffer.
    pub fn average_color(&self) -> [f64; 3] {
        self.region_average(0, 0, self.width, self.height)
    }

    /// Mean R, G, B over a rectangle, clamped to the buffer bounds.
    pub fn region_average(&self, x: u32, y: u32, width: u32, height: u32) -> [f64; 3] {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        let mut sums = [0u64; 3];
        let mut count = 0u64;
        for py in y..y_end {
            for px in x..x_end {
                let i = self.offset(px, py);
                sums[0] += self.pixels[i] as u64;
                sums[1] += self.pixels[i + 1] as u64;
                sums[2] += self.pixels[i + 2] as u64;
                count += 1;
            }
        }
        if count == 0 {
            return [0.0; 3];
        }
        sums.map(|s| s as f64 / count as f64)
    }

    // -- Conversions ----------------------------------------------------------

    /// Copy into an `image` crate buffer.
    pub fn to_rgba_image(&self) -> RgbaImage {
        // Length invariant guarantees `from_raw` succeeds.
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    pub fn to_dynamic(&self) -> DynamicImage {
        DynamicImage::ImageRgba8(self.to_rgba_image())
    }
}
