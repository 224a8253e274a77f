// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image codec — decode encoded images into RasterBuffers and encode
// RasterBuffers as PNG or JPEG, using the `image` crate.

use image::{DynamicImage, ImageFormat};
use scanwerk_core::OutputFormat;
use scanwerk_core::error::{Result, ScanwerkError};
use tracing::{debug, instrument};

use crate::raster::RasterBuffer;

/// Decode raw encoded bytes (JPEG, PNG, etc.) into an RGBA buffer.
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn decode(data: &[u8]) -> Result<RasterBuffer> {
    let img = image::load_from_memory(data)
        .map_err(|err| ScanwerkError::ImageError(format!("failed to decode image: {}", err)))?;
    debug!(
        width = img.width(),
        height = img.height(),
        "Image decoded from bytes"
    );
    Ok(RasterBuffer::from_dynamic(&img))
}

/// Decode bytes whose format is already known.
pub fn decode_as(data: &[u8], format: OutputFormat) -> Result<RasterBuffer> {
    let img = image::load_from_memory_with_format(data, image_format(format)).map_err(|err| {
        ScanwerkError::ImageError(format!(
            "failed to decode {} image: {}",
            format.extension(),
            err
        ))
    })?;
    Ok(RasterBuffer::from_dynamic(&img))
}

/// Encode a buffer in the requested format. `jpeg_quality` (1-100) is only
/// consulted for JPEG; alpha is dropped for JPEG output.
pub fn encode(buffer: &RasterBuffer, format: OutputFormat, jpeg_quality: u8) -> Result<Vec<u8>> {
    if buffer.is_empty() {
        return Err(ScanwerkError::ImageError(format!(
            "cannot encode an empty {}x{} image",
            buffer.width(),
            buffer.height()
        )));
    }
    match format {
        OutputFormat::Png => encode_to_format(&buffer.to_dynamic(), ImageFormat::Png),
        OutputFormat::Jpeg => encode_jpeg(&buffer.to_dynamic(), jpeg_quality),
    }
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let rgb = image.to_rgb8();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .map_err(|err| ScanwerkError::ImageError(format!("JPEG encoding failed: {}", err)))?;
    Ok(buffer)
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| ScanwerkError::ImageError(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}

fn image_format(format: OutputFormat) -> ImageFormat {
    match format {
        OutputFormat::Png => ImageFormat::Png,
        OutputFormat::Jpeg => ImageFormat::Jpeg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_is_lossless() {
        let buf = RasterBuffer::from_fn(5, 4, |x, y| [x as u8 * 50, y as u8 * 60, 99, 255]);
        let bytes = encode(&buf, OutputFormat::Png, 90).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(decode(&bytes).unwrap(), buf);
    }

    #[test]
    fn jpeg_keeps_flat_colour_close() {
        let buf = RasterBuffer::filled(16, 16, [200, 40, 60, 255]);
        let bytes = encode(&buf, OutputFormat::Jpeg, 90).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let back = decode_as(&bytes, OutputFormat::Jpeg).unwrap();
        let avg = back.average_color();
        for (got, want) in avg.iter().zip([200.0, 40.0, 60.0]) {
            assert!((got - want).abs() < 8.0, "got {:?}", avg);
        }
    }

    #[test]
    fn empty_buffer_cannot_be_encoded() {
        let buf = RasterBuffer::new(0, 0, Vec::new()).unwrap();
        assert!(encode(&buf, OutputFormat::Png, 90).is_err());
    }

    #[test]
    fn garbage_does_not_decode() {
        let err = decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ScanwerkError::ImageError(_)));
    }
}
