// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page extraction: render every page of a document to an image.

use image::imageops::{self, FilterType};
use rayon::prelude::*;
use scanwerk_core::OutputFormat;
use scanwerk_core::error::{Result, ScanwerkError};
use tracing::{debug, info, instrument, warn};

use crate::archive::ZipArchiveWriter;
use crate::capability::{ArchiveWriter, DocumentReader};
use crate::codec;
use crate::pdf::PdfReader;
use crate::progress::{BatchProgressTracker, CancellationToken};
use crate::raster::RasterBuffer;

/// Longest side of a preview thumbnail, in pixels.
pub const THUMBNAIL_MAX_SIDE: u32 = 200;

/// Rendering and encoding parameters.
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// Pixels per PDF point; 1.0 renders at 72 px per inch.
    pub scale: f32,
    pub format: OutputFormat,
    /// JPEG quality (1-100); ignored for PNG.
    pub jpeg_quality: u8,
    /// Render pages on the rayon pool.
    pub parallel: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            format: OutputFormat::Png,
            jpeg_quality: 90,
            parallel: false,
        }
    }
}

/// One rendered page.
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    /// 1-based.
    pub page_number: u32,
    pub buffer: RasterBuffer,
    pub encoded: Vec<u8>,
    pub format: OutputFormat,
}

impl ExtractedPage {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Name for a single-page download, e.g. `page-7.png`.
    pub fn file_name(&self) -> String {
        format!("page-{}.{}", self.page_number, self.format.extension())
    }

    /// Zero-padded name used inside archives, e.g. `page-007.png`.
    pub fn archive_entry_name(&self) -> String {
        format!("page-{:03}.{}", self.page_number, self.format.extension())
    }

    /// Preview scaled so its longer side is `max_side` pixels.
    pub fn thumbnail(&self, max_side: u32) -> RasterBuffer {
        let (w, h) = (self.buffer.width(), self.buffer.height());
        if w == 0 || h == 0 || max_side == 0 {
            return self.buffer.clone();
        }
        let scale = (max_side as f64 / w as f64).min(max_side as f64 / h as f64);
        let tw = ((w as f64 * scale) as u32).max(1);
        let th = ((h as f64 * scale) as u32).max(1);
        let resized = imageops::resize(&self.buffer.to_rgba_image(), tw, th, FilterType::Triangle);
        RasterBuffer::from_rgba_image(resized)
    }
}

/// A page that could not be rendered or encoded.
#[derive(Debug)]
pub struct PageFailure {
    pub page_number: u32,
    pub error: ScanwerkError,
}

/// The result of one extraction run, ordered by page number.
#[derive(Debug, Default)]
pub struct Extraction {
    pages: Vec<ExtractedPage>,
    failures: Vec<PageFailure>,
}

impl Extraction {
    pub fn pages(&self) -> &[ExtractedPage] {
        &self.pages
    }

    pub fn failures(&self) -> &[PageFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Look a page up by its 1-based page number.
    pub fn page(&self, page_number: u32) -> Option<&ExtractedPage> {
        self.pages.iter().find(|p| p.page_number == page_number)
    }

    /// Encoded bytes of the page at `index` (0-based position among the
    /// extracted pages).
    pub fn page_bytes(&self, index: usize) -> Option<&[u8]> {
        self.pages.get(index).map(|p| p.encoded.as_slice())
    }

    /// Pack every extracted page into `archive` as `page-001.<ext>`, ...
    #[instrument(skip_all, fields(pages = self.pages.len()))]
    pub fn to_archive<A: ArchiveWriter>(&self, mut archive: A) -> Result<Vec<u8>> {
        if self.pages.is_empty() {
            return Err(ScanwerkError::ArchiveFailure("no pages to package".into()));
        }
        for page in &self.pages {
            archive.add_entry(&page.archive_entry_name(), &page.encoded)?;
        }
        let bytes = archive.finalize()?;
        info!(bytes = bytes.len(), "Archive built");
        Ok(bytes)
    }

    pub fn to_zip(&self) -> Result<Vec<u8>> {
        self.to_archive(ZipArchiveWriter::new())
    }
}

/// Renders every page of a document to encoded images.
#[derive(Debug, Clone)]
pub struct DocumentExtractor {
    options: ExtractOptions,
}

impl DocumentExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Parse `document` as PDF and extract all pages.
    pub fn extract_bytes(&self, document: &[u8]) -> Result<Extraction> {
        let reader = PdfReader::from_bytes(document)?;
        self.extract(&reader)
    }

    pub fn extract<R: DocumentReader>(&self, reader: &R) -> Result<Extraction> {
        self.extract_with(reader, &BatchProgressTracker::new(), &CancellationToken::new())
    }

    /// Render, encode and collect pages 1..=N.
    ///
    /// Pages that fail are skipped and listed in [`Extraction::failures`].
    /// A cancelled run returns `Cancelled` and no pages.
    #[instrument(skip_all, fields(scale = self.options.scale, format = ?self.options.format))]
    pub fn extract_with<R: DocumentReader>(
        &self,
        reader: &R,
        progress: &BatchProgressTracker,
        cancel: &CancellationToken,
    ) -> Result<Extraction> {
        let scale = self.options.scale;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ScanwerkError::InvalidParameter(format!(
                "scale must be a positive number, got {}",
                scale
            )));
        }

        let count = reader.page_count();
        let last = u32::try_from(count).map_err(|_| {
            ScanwerkError::InvalidParameter(format!(
                "document has {} pages, more than can be numbered",
                count
            ))
        })?;
        progress.reset(count);
        info!(pages = count, parallel = self.options.parallel, "Extraction started");

        let numbers = 1..=last;
        let outcomes: Vec<Option<std::result::Result<ExtractedPage, PageFailure>>> =
            if self.options.parallel {
                numbers
                    .into_par_iter()
                    .map(|n| self.run_page(reader, n, progress, cancel))
                    .collect()
            } else {
                let mut outcomes = Vec::with_capacity(count);
                for n in numbers {
                    let outcome = self.run_page(reader, n, progress, cancel);
                    if outcome.is_none() {
                        break;
                    }
                    outcomes.push(outcome);
                }
                outcomes
            };

        if cancel.is_cancelled() {
            let completed = progress.state().completed;
            info!(completed, "Extraction cancelled");
            return Err(ScanwerkError::Cancelled { completed });
        }

        let mut extraction = Extraction::default();
        for outcome in outcomes.into_iter().flatten() {
            match outcome {
                Ok(page) => extraction.pages.push(page),
                Err(failure) => extraction.failures.push(failure),
            }
        }

        info!(
            extracted = extraction.pages.len(),
            failed = extraction.failures.len(),
            "Extraction finished"
        );
        Ok(extraction)
    }

    /// `None` when the run was cancelled before this page started.
    fn run_page<R: DocumentReader>(
        &self,
        reader: &R,
        page_number: u32,
        progress: &BatchProgressTracker,
        cancel: &CancellationToken,
    ) -> Option<std::result::Result<ExtractedPage, PageFailure>> {
        if cancel.is_cancelled() {
            return None;
        }
        let outcome = self.extract_page(reader, page_number).map_err(|error| {
            warn!(page = page_number, %error, "Skipping page");
            PageFailure { page_number, error }
        });
        progress.advance();
        Some(outcome)
    }

    fn extract_page<R: DocumentReader>(
        &self,
        reader: &R,
        page_number: u32,
    ) -> Result<ExtractedPage> {
        let buffer = reader
            .render_page(page_number, self.options.scale)
            .map_err(|err| match err {
                err @ ScanwerkError::RenderFailure { .. } => err,
                other => ScanwerkError::RenderFailure {
                    page: page_number,
                    reason: other.to_string(),
                },
            })?;

        let encoded = codec::encode(&buffer, self.options.format, self.options.jpeg_quality)
            .map_err(|err| ScanwerkError::EncodeFailure {
                index: page_number as usize - 1,
                reason: err.to_string(),
            })?;

        debug!(
            page = page_number,
            width = buffer.width(),
            height = buffer.height(),
            bytes = encoded.len(),
            "Page extracted"
        );
        Ok(ExtractedPage {
            page_number,
            buffer,
            encoded,
            format: self.options.format,
        })
    }
}
