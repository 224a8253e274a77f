// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: `lopdf` validates and counts pages, PDFium renders them.

use std::path::Path;

use lopdf::Document;
use pdfium_render::prelude::*;
use scanwerk_core::error::{Result, ScanwerkError};
use tracing::{debug, info, instrument};

use crate::capability::DocumentReader;
use crate::raster::RasterBuffer;

/// Largest rendered page side in pixels.
pub const MAX_RENDER_DIMENSION: u32 = 16_384;

/// Bind to the PDFium shared library.
///
/// Searches the working directory, `/opt/pdfium/lib`, then the system library
/// path. A fresh instance is created per call; PDFium itself is not
/// thread-safe and `pdfium-render` serialises access to it.
fn create_pdfium() -> std::result::Result<Pdfium, PdfiumError> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "/opt/pdfium/lib",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())?;
    Ok(Pdfium::new(bindings))
}

/// Whether the PDFium library can be loaded on this machine.
#[cfg(test)]
pub(crate) fn engine_available() -> bool {
    let available = create_pdfium().is_ok();
    if !available {
        eprintln!("PDFium library not found; skipping rendering assertions");
    }
    available
}

/// One A4 page whose only content is a filled black rectangle.
#[cfg(test)]
pub(crate) fn vector_only_pdf() -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content = Content {
        operations: vec![
            Operation::new("rg", vec![0.into(), 0.into(), 0.into()]),
            Operation::new("re", vec![50.into(), 50.into(), 495.into(), 740.into()]),
            Operation::new("f", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Reads PDF files page by page.
///
/// The reader keeps the document bytes and opens them in PDFium for each
/// page operation, so it holds no library handle between calls and can be
/// shared across threads.
#[derive(Debug)]
pub struct PdfReader {
    bytes: Vec<u8>,
    page_count: usize,
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let bytes = std::fs::read(path_ref).map_err(|err| {
            ScanwerkError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        let mut reader = Self::from_bytes(&bytes)?;
        reader.source_path = Some(path_ref.display().to_string());
        Ok(reader)
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            ScanwerkError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;
        if document.is_encrypted() {
            return Err(ScanwerkError::PdfError(
                "encrypted documents are not supported".into(),
            ));
        }

        let page_count = document.get_pages().len();
        debug!(pages = page_count, "PDF loaded");
        Ok(Self {
            bytes: data.to_vec(),
            page_count,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// Size of page `page_number` (1-based) in points.
    pub fn page_size(&self, page_number: u32) -> Result<(f32, f32)> {
        self.with_page(page_number, |page| Ok((page.width().value, page.height().value)))
    }

    /// Number of image objects placed directly on page `page_number` (1-based).
    pub fn image_count(&self, page_number: u32) -> Result<usize> {
        self.with_page(page_number, |page| {
            Ok(page
                .objects()
                .iter()
                .filter(|object| object.as_image_object().is_some())
                .count())
        })
    }

    /// Load the document in PDFium and run `f` on one page.
    ///
    /// Library, load and page lookup failures become a `RenderFailure` for
    /// that page, so one unreadable page never aborts a whole extraction.
    fn with_page<T>(
        &self,
        page_number: u32,
        f: impl FnOnce(&PdfPage<'_>) -> Result<T>,
    ) -> Result<T> {
        let index = self.page_index(page_number)?;
        let failure = |reason: String| ScanwerkError::RenderFailure {
            page: page_number,
            reason,
        };

        let pdfium =
            create_pdfium().map_err(|e| failure(format!("failed to initialise PDFium: {}", e)))?;
        let document = pdfium
            .load_pdf_from_byte_slice(&self.bytes, None)
            .map_err(|e| failure(format!("PDFium could not load the document: {}", e)))?;
        let page = document
            .pages()
            .get(index)
            .map_err(|e| failure(format!("failed to get page: {}", e)))?;
        f(&page)
    }

    /// Zero-based PDFium index for a 1-based page number.
    fn page_index(&self, page_number: u32) -> Result<u16> {
        (page_number as usize)
            .checked_sub(1)
            .filter(|&i| i < self.page_count)
            .and_then(|i| u16::try_from(i).ok())
            .ok_or(ScanwerkError::PageOutOfRange {
                page: page_number,
                count: self.page_count,
            })
    }
}

impl DocumentReader for PdfReader {
    fn page_count(&self) -> usize {
        self.page_count
    }

    #[instrument(skip(self))]
    fn render_page(&self, page_number: u32, scale: f32) -> Result<RasterBuffer> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ScanwerkError::InvalidParameter(format!(
                "render scale must be positive, got {}",
                scale
            )));
        }

        let raster = self.with_page(page_number, |page| {
            let width = page.width().value * scale;
            let height = page.height().value * scale;
            let limit = MAX_RENDER_DIMENSION as f32;
            if width > limit || height > limit {
                return Err(ScanwerkError::RenderFailure {
                    page: page_number,
                    reason: format!(
                        "rendered page would be {:.0}x{:.0} px, over the {} px limit",
                        width, height, MAX_RENDER_DIMENSION
                    ),
                });
            }

            let config = PdfRenderConfig::new()
                .scale_page_by_factor(scale)
                .render_form_data(true)
                .render_annotations(true);
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| ScanwerkError::RenderFailure {
                    page: page_number,
                    reason: format!("PDFium failed to render: {}", e),
                })?;
            Ok(RasterBuffer::from_dynamic(&bitmap.as_image()))
        })?;

        debug!(width = raster.width(), height = raster.height(), "Page rendered");
        Ok(raster)
    }
}
