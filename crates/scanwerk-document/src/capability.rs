// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability traits for the document formats the assembler and extractor
// drive. The PDF and ZIP implementations live in `pdf` and `archive`; tests
// substitute in-memory doubles.

use scanwerk_core::OutputFormat;
use scanwerk_core::error::Result;

use crate::layout::PlacedImage;
use crate::raster::RasterBuffer;

/// Serialises a multi-page document, one page at a time.
pub trait DocumentWriter {
    /// Begin a new page of the given size (page units, millimetres).
    fn new_page(&mut self, width_units: f32, height_units: f32) -> Result<()>;

    /// Draw an encoded image on the current page at `placement`.
    fn draw_image(
        &mut self,
        encoded: &[u8],
        format: OutputFormat,
        placement: &PlacedImage,
    ) -> Result<()>;

    /// Finish the document and return its bytes.
    fn serialize(self) -> Result<Vec<u8>>
    where
        Self: Sized;
}

/// Read access to a paginated document.
///
/// `Sync` so pages can be rendered from several threads at once.
pub trait DocumentReader: Sync {
    fn page_count(&self) -> usize;

    /// Rasterise page `page_number` (1-based). `scale` multiplies the
    /// native resolution of one pixel per point.
    fn render_page(&self, page_number: u32, scale: f32) -> Result<RasterBuffer>;
}

/// Bundles named byte blobs into a single archive.
pub trait ArchiveWriter {
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<()>;

    fn finalize(self) -> Result<Vec<u8>>
    where
        Self: Sized;
}
