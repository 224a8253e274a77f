// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan enhancement pipeline — contrast boost, luminance grayscale, 3x3
// sharpening, near-white background suppression, and auto-levels for
// photographed or scanned document pages.

use scanwerk_core::EnhancementSettings;
use tracing::{debug, info, instrument};

use crate::raster::{CHANNELS, RasterBuffer};

/// Sharpening kernel, row-major.
const SHARPEN_KERNEL: [[i32; 3]; 3] = [[0, -1, 0], [-1, 5, -1], [0, -1, 0]];

/// The five pipeline stages, in the order `enhance` applies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Contrast,
    Grayscale,
    Sharpen,
    BackgroundSuppression,
    AutoLevels,
}

impl Stage {
    pub const ORDER: [Stage; 5] = [
        Stage::Contrast,
        Stage::Grayscale,
        Stage::Sharpen,
        Stage::BackgroundSuppression,
        Stage::AutoLevels,
    ];
}

/// Enhances scanned document images ("scan mode").
///
/// Every run reads its input without modifying it and returns a new buffer of
/// identical dimensions. Output is a pure function of the input pixels and the
/// [`EnhancementSettings`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EnhancementPipeline {
    settings: EnhancementSettings,
}

impl EnhancementPipeline {
    pub fn new(settings: EnhancementSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EnhancementSettings {
        &self.settings
    }

    /// Run all five stages in order.
    #[instrument(skip_all, fields(width = buffer.width(), height = buffer.height()))]
    pub fn enhance(&self, buffer: &RasterBuffer) -> RasterBuffer {
        info!(
            contrast = self.settings.contrast_factor,
            threshold = self.settings.background_threshold,
            "Running scan enhancement pipeline"
        );
        let mut working = buffer.clone();
        for stage in Stage::ORDER {
            working = self.apply_stage(stage, working);
        }
        working
    }

    /// Apply a single stage, consuming the working buffer.
    pub fn apply_stage(&self, stage: Stage, mut buffer: RasterBuffer) -> RasterBuffer {
        debug!(?stage, "Applying enhancement stage");
        match stage {
            Stage::Contrast => {
                enhance_contrast(&mut buffer, self.settings.contrast_factor);
                buffer
            }
            Stage::Grayscale => {
                convert_to_grayscale(&mut buffer);
                buffer
            }
            Stage::Sharpen => sharpen(&buffer),
            Stage::BackgroundSuppression => {
                suppress_background(&mut buffer, self.settings.background_threshold);
                buffer
            }
            Stage::AutoLevels => {
                auto_levels(&mut buffer);
                buffer
            }
        }
    }
}

// -- Stages -------------------------------------------------------------------

/// Push R, G, B away from mid-grey: `v' = (v - 128) * factor + 128`.
///
/// In place. Alpha untouched.
pub fn enhance_contrast(buffer: &mut RasterBuffer, factor: f32) {
    let factor = factor as f64;
    for px in buffer.pixels_mut().chunks_exact_mut(CHANNELS) {
        for channel in &mut px[..3] {
            *channel = store_channel((*channel as f64 - 128.0) * factor + 128.0);
        }
    }
}

/// Replace R, G, B with `round(0.299R + 0.587G + 0.114B)`. In place.
pub fn convert_to_grayscale(buffer: &mut RasterBuffer) {
    for px in buffer.pixels_mut().chunks_exact_mut(CHANNELS) {
        let luma = 0.299 * px[0] as f64 + 0.587 * px[1] as f64 + 0.114 * px[2] as f64;
        // Half rounds up, never down.
        let gray = (luma + 0.5).floor().clamp(0.0, 255.0) as u8;
        px[0] = gray;
        px[1] = gray;
        px[2] = gray;
    }
}

/// 3x3 sharpen on R, G, B, returning a new buffer.
///
/// Neighbours are always read from `source`, never from pixels already
/// written. The outermost rows and columns are copied as-is.
pub fn sharpen(source: &RasterBuffer) -> RasterBuffer {
    let mut output = source.clone();
    let (width, height) = (source.width(), source.height());
    if width < 3 || height < 3 {
        return output;
    }

    let src = source.pixels();
    let stride = width as usize * CHANNELS;
    let dst = output.pixels_mut();

    for y in 1..(height as usize - 1) {
        for x in 1..(width as usize - 1) {
            let mut acc = [0i32; 3];
            for (ky, kernel_row) in SHARPEN_KERNEL.iter().enumerate() {
                let row = (y + ky - 1) * stride;
                for (kx, &weight) in kernel_row.iter().enumerate() {
                    if weight == 0 {
                        continue;
                    }
                    let idx = row + (x + kx - 1) * CHANNELS;
                    acc[0] += src[idx] as i32 * weight;
                    acc[1] += src[idx + 1] as i32 * weight;
                    acc[2] += src[idx + 2] as i32 * weight;
                }
            }
            let idx = y * stride + x * CHANNELS;
            for c in 0..3 {
                dst[idx + c] = acc[c].clamp(0, 255) as u8;
            }
        }
    }

    output
}

/// Snap near-white pixels to pure white: when `(R+G+B)/3 > threshold`,
/// R, G and B become 255. In place.
pub fn suppress_background(buffer: &mut RasterBuffer, threshold: u8) {
    // avg > t  <=>  sum > 3t, exact in integers.
    let limit = threshold as u32 * 3;
    for px in buffer.pixels_mut().chunks_exact_mut(CHANNELS) {
        let sum = px[0] as u32 + px[1] as u32 + px[2] as u32;
        if sum > limit {
            px[0] = 255;
            px[1] = 255;
            px[2] = 255;
        }
    }
}

/// Stretch the luminance range to the full 0..=255 span. In place.
///
/// Min and max are taken over the per-pixel channel average. A flat image
/// (`max == min`) is left unchanged.
pub fn auto_levels(buffer: &mut RasterBuffer) {
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for px in buffer.pixels().chunks_exact(CHANNELS) {
        let gray = (px[0] as f64 + px[1] as f64 + px[2] as f64) / 3.0;
        min = min.min(gray);
        max = max.max(gray);
    }

    let range = max - min;
    if range <= 0.0 {
        debug!("Flat image, auto-levels skipped");
        return;
    }

    for px in buffer.pixels_mut().chunks_exact_mut(CHANNELS) {
        for channel in &mut px[..3] {
            *channel = store_channel((*channel as f64 - min) / range * 255.0);
        }
    }
}

/// Clamp to the byte range and round half to even, matching clamped 8-bit
/// canvas storage.
#[inline]
fn store_channel(value: f64) -> u8 {
    value.clamp(0.0, 255.0).round_ties_even() as u8
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RasterBuffer {
        RasterBuffer::from_fn(width, height, |x, y| {
            [
                (x * 37 % 256) as u8,
                (y * 53 % 256) as u8,
                ((x + y) * 19 % 256) as u8,
                200,
            ]
        })
    }

    #[test]
    fn contrast_stretches_around_mid_grey() {
        let mut buf = RasterBuffer::from_fn(5, 1, |x, _| {
            let v = [100, 200, 129, 127, 0][x as usize];
            [v, v, v, 77]
        });
        enhance_contrast(&mut buf, 1.5);
        let reds: Vec<u8> = (0..5).map(|x| buf.pixel(x, 0)[0]).collect();
        // 129.5 -> 130 and 126.5 -> 126 (ties to even); 0 clamps.
        assert_eq!(reds, vec![86, 236, 130, 126, 0]);
        assert_eq!(buf.pixel(0, 0)[3], 77);
    }

    #[test]
    fn grayscale_sets_equal_channels() {
        let mut buf = gradient(17, 9);
        convert_to_grayscale(&mut buf);
        for px in buf.pixels().chunks_exact(4) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
            assert_eq!(px[3], 200);
        }
    }

    #[test]
    fn grayscale_uses_luminance_weights() {
        let mut buf = RasterBuffer::filled(1, 1, [255, 0, 0, 255]);
        convert_to_grayscale(&mut buf);
        // 0.299 * 255 = 76.245
        assert_eq!(buf.pixel(0, 0), [76, 76, 76, 255]);
    }

    #[test]
    fn sharpen_reads_only_the_source() {
        let mut buf = RasterBuffer::filled(4, 3, [0, 0, 0, 255]);
        buf.set_pixel(1, 1, [40, 40, 40, 255]);
        buf.set_pixel(2, 1, [30, 30, 30, 255]);

        let out = sharpen(&buf);
        assert_eq!(out.pixel(1, 1)[0], 170); // 5*40 - 30
        // A single shared buffer would have read the sharpened 170 here and
        // clamped to 0.
        assert_eq!(out.pixel(2, 1)[0], 110); // 5*30 - 40
        // Source untouched.
        assert_eq!(buf.pixel(1, 1)[0], 40);
    }

    #[test]
    fn sharpen_leaves_borders_alone() {
        let buf = gradient(6, 5);
        let out = sharpen(&buf);
        for x in 0..6 {
            assert_eq!(out.pixel(x, 0), buf.pixel(x, 0));
            assert_eq!(out.pixel(x, 4), buf.pixel(x, 4));
        }
        for y in 0..5 {
            assert_eq!(out.pixel(0, y), buf.pixel(0, y));
            assert_eq!(out.pixel(5, y), buf.pixel(5, y));
        }
    }

    #[test]
    fn sharpen_tiny_images_are_identity() {
        let buf = gradient(2, 7);
        assert_eq!(sharpen(&buf), buf);
    }

    #[test]
    fn background_suppression_threshold() {
        let mut buf = RasterBuffer::from_fn(3, 1, |x, _| match x {
            0 => [250, 250, 250, 255],
            1 => [230, 230, 230, 255],
            // average exactly 240 is not above the threshold
            _ => [240, 241, 239, 255],
        });
        suppress_background(&mut buf, 240);
        assert_eq!(buf.pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(buf.pixel(1, 0), [230, 230, 230, 255]);
        assert_eq!(buf.pixel(2, 0), [240, 241, 239, 255]);
    }

    #[test]
    fn auto_levels_flat_image_unchanged() {
        let mut buf = RasterBuffer::filled(8, 8, [90, 90, 90, 255]);
        let before = buf.clone();
        auto_levels(&mut buf);
        assert_eq!(buf, before);
    }

    #[test]
    fn auto_levels_spans_full_range() {
        let mut buf = RasterBuffer::from_fn(4, 4, |x, y| {
            let v = 50 + ((x + y * 4) * 6) as u8;
            [v, v, v, 255]
        });
        auto_levels(&mut buf);

        let avgs: Vec<f64> = buf
            .pixels()
            .chunks_exact(4)
            .map(|px| (px[0] as f64 + px[1] as f64 + px[2] as f64) / 3.0)
            .collect();
        let min = avgs.iter().cloned().fold(f64::MAX, f64::min);
        let max = avgs.iter().cloned().fold(f64::MIN, f64::max);
        assert_eq!(min, 0.0);
        assert_eq!(max, 255.0);
    }

    #[test]
    fn enhance_preserves_dimensions_and_input() {
        let pipeline = EnhancementPipeline::default();
        for (w, h) in [(1, 1), (2, 9), (31, 17)] {
            let input = gradient(w, h);
            let snapshot = input.clone();
            let out = pipeline.enhance(&input);
            assert_eq!((out.width(), out.height()), (w, h));
            assert_eq!(input, snapshot);
        }
    }

    #[test]
    fn enhance_is_deterministic() {
        let pipeline = EnhancementPipeline::default();
        let input = gradient(23, 19);
        assert_eq!(pipeline.enhance(&input), pipeline.enhance(&input));
    }

    #[test]
    fn enhance_matches_stages_in_order() {
        let pipeline = EnhancementPipeline::default();
        let input = gradient(12, 10);

        let mut manual = input.clone();
        enhance_contrast(&mut manual, 1.5);
        convert_to_grayscale(&mut manual);
        let mut manual = sharpen(&manual);
        suppress_background(&mut manual, 240);
        auto_levels(&mut manual);

        assert_eq!(pipeline.enhance(&input), manual);
    }

    #[test]
    fn enhanced_output_is_grayscale() {
        let out = EnhancementPipeline::default().enhance(&gradient(20, 20));
        for px in out.pixels().chunks_exact(4) {
            assert!(px[0] == px[1] && px[1] == px[2]);
        }
    }
}
