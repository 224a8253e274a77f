// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: one raster image per page, built with `printpdf` 0.8.
//
// Pages collect `Op` lists while open and are handed to the document in one
// go when it is serialised.

use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use scanwerk_core::OutputFormat;
use scanwerk_core::error::{Result, ScanwerkError};
use tracing::{debug, info, instrument};

use crate::capability::DocumentWriter;
use crate::codec;
use crate::layout::PlacedImage;

/// Images are embedded at 72 DPI so one image pixel maps to one point before
/// scaling; the transform then stretches it to the placement box.
const EMBED_DPI: f32 = 72.0;

/// A page under construction.
struct OpenPage {
    width: Mm,
    height: Mm,
    ops: Vec<Op>,
}

/// Creates PDF documents with one raster image per page.
///
/// Placements arrive in millimetres with a top-left origin and are converted
/// to PDF user space (points, bottom-left origin) here.
pub struct PdfWriter {
    doc: PdfDocument,
    pages: Vec<PdfPage>,
    current: Option<OpenPage>,
}

impl PdfWriter {
    /// Create a writer; `title` goes into the document metadata.
    pub fn new(title: &str) -> Self {
        Self {
            doc: PdfDocument::new(title),
            pages: Vec::new(),
            current: None,
        }
    }

    /// Pages started so far, including the one still open.
    pub fn page_count(&self) -> usize {
        self.pages.len() + usize::from(self.current.is_some())
    }

    fn close_current(&mut self) {
        if let Some(page) = self.current.take() {
            self.pages
                .push(PdfPage::new(page.width, page.height, page.ops));
        }
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new("Scanwerk Document")
    }
}

impl DocumentWriter for PdfWriter {
    fn new_page(&mut self, width_units: f32, height_units: f32) -> Result<()> {
        if !(width_units > 0.0 && height_units > 0.0) {
            return Err(ScanwerkError::PdfError(format!(
                "page size must be positive, got {}x{} mm",
                width_units, height_units
            )));
        }
        self.close_current();
        self.current = Some(OpenPage {
            width: Mm(width_units),
            height: Mm(height_units),
            ops: Vec::new(),
        });
        Ok(())
    }

    #[instrument(skip(self, encoded), fields(bytes_len = encoded.len()))]
    fn draw_image(
        &mut self,
        encoded: &[u8],
        format: OutputFormat,
        placement: &PlacedImage,
    ) -> Result<()> {
        let page = self
            .current
            .as_mut()
            .ok_or_else(|| ScanwerkError::PdfError("draw_image called before new_page".into()))?;

        let raster = codec::decode_as(encoded, format)?;
        let img_width = raster.width() as usize;
        let img_height = raster.height() as usize;
        if img_width == 0 || img_height == 0 {
            return Err(ScanwerkError::PdfError("cannot embed an empty image".into()));
        }

        // printpdf wants RGB8; alpha is dropped.
        let rgb = raster.to_dynamic().to_rgb8();
        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width: img_width,
            height: img_height,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let xobject_id = self.doc.add_image(&raw);

        let page_h_pt = page.height.into_pt().0;
        let target_w_pt = Mm(placement.width).into_pt().0;
        let target_h_pt = Mm(placement.height).into_pt().0;
        let x_pt = Mm(placement.x).into_pt().0;
        // Flip to a bottom-left origin.
        let y_pt = page_h_pt - Mm(placement.y).into_pt().0 - target_h_pt;

        // At EMBED_DPI the native size in points equals the pixel size.
        let scale_x = target_w_pt / img_width as f32;
        let scale_y = target_h_pt / img_height as f32;

        page.ops.push(Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(x_pt)),
                translate_y: Some(Pt(y_pt)),
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                dpi: Some(EMBED_DPI),
                rotate: None,
            },
        });

        debug!(x_pt, y_pt, target_w_pt, target_h_pt, "Image placed on page");
        Ok(())
    }

    fn serialize(mut self) -> Result<Vec<u8>> {
        self.close_current();
        if self.pages.is_empty() {
            return Err(ScanwerkError::PdfError("document has no pages".into()));
        }

        let page_count = self.pages.len();
        self.doc.with_pages(self.pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = self.doc.save(&PdfSaveOptions::default(), &mut warnings);
        info!(
            pages = page_count,
            bytes = output.len(),
            warnings = warnings.len(),
            "PDF serialised"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use scanwerk_core::OutputFormat;

    use super::*;
    use crate::raster::RasterBuffer;

    fn png(color: [u8; 4]) -> Vec<u8> {
        codec::encode(&RasterBuffer::filled(8, 6, color), OutputFormat::Png, 90).unwrap()
    }

    #[test]
    fn writes_one_page_per_new_page() {
        let mut writer = PdfWriter::default();
        let placement = PlacedImage { x: 10.0, y: 20.0, width: 100.0, height: 75.0 };
        for color in [[255, 0, 0, 255], [0, 255, 0, 255]] {
            writer.new_page(210.0, 297.0).unwrap();
            writer.draw_image(&png(color), OutputFormat::Png, &placement).unwrap();
        }
        assert_eq!(writer.page_count(), 2);

        let bytes = writer.serialize().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn draw_before_page_is_rejected() {
        let mut writer = PdfWriter::default();
        let placement = PlacedImage { x: 0.0, y: 0.0, width: 1.0, height: 1.0 };
        let err = writer
            .draw_image(&png([0, 0, 0, 255]), OutputFormat::Png, &placement)
            .unwrap_err();
        assert!(matches!(err, ScanwerkError::PdfError(_)));
    }

    #[test]
    fn empty_document_is_rejected() {
        assert!(PdfWriter::default().serialize().is_err());
    }

    #[test]
    fn undecodable_image_is_rejected() {
        let mut writer = PdfWriter::default();
        writer.new_page(210.0, 297.0).unwrap();
        let placement = PlacedImage { x: 0.0, y: 0.0, width: 1.0, height: 1.0 };
        assert!(writer.draw_image(b"nope", OutputFormat::Jpeg, &placement).is_err());
    }
}
