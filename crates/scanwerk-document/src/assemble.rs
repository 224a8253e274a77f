// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembly: one source image per page, in order.

use rayon::prelude::*;
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::{OutputFormat, PageSpec};
use tracing::{debug, info, instrument, warn};

use crate::capability::DocumentWriter;
use crate::codec;
use crate::layout::{self, PlacedImage};
use crate::progress::{BatchProgressTracker, CancellationToken};
use crate::session::SourceImage;

/// How images are embedded.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyOptions {
    pub image_format: OutputFormat,
    /// JPEG quality (1-100); ignored for PNG.
    pub jpeg_quality: u8,
    /// Encode and lay out images on the rayon pool. Pages are still written
    /// in input order.
    pub parallel: bool,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            image_format: OutputFormat::Jpeg,
            jpeg_quality: 85,
            parallel: false,
        }
    }
}

/// A finished document.
#[derive(Debug)]
pub struct Assembly {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// Items that were skipped, as `EncodeFailure { index, .. }`.
    pub failures: Vec<ScanwerkError>,
}

/// An image ready to be written: encoded bytes plus where they go.
struct PreparedPage {
    encoded: Vec<u8>,
    placement: PlacedImage,
}

/// Turns an ordered sequence of source images into a single document.
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    page: PageSpec,
    options: AssemblyOptions,
}

impl DocumentAssembler {
    pub fn new(page: PageSpec, options: AssemblyOptions) -> Self {
        Self { page, options }
    }

    pub fn page_spec(&self) -> &PageSpec {
        &self.page
    }

    /// Assemble without progress reporting or cancellation.
    pub fn assemble<W: DocumentWriter>(
        &self,
        sources: &[&SourceImage],
        enhancement_enabled: bool,
        writer: W,
    ) -> Result<Assembly> {
        self.assemble_with(
            sources,
            enhancement_enabled,
            writer,
            &BatchProgressTracker::new(),
            &CancellationToken::new(),
        )
    }

    /// Assemble `sources` into `writer`, one page per image.
    ///
    /// Items whose encoding fails are skipped and listed in
    /// [`Assembly::failures`]. Zero-area images, writer errors and
    /// cancellation abort the run without producing output.
    #[instrument(
        skip_all,
        fields(items = sources.len(), enhancement_enabled = enhancement_enabled)
    )]
    pub fn assemble_with<W: DocumentWriter>(
        &self,
        sources: &[&SourceImage],
        enhancement_enabled: bool,
        mut writer: W,
        progress: &BatchProgressTracker,
        cancel: &CancellationToken,
    ) -> Result<Assembly> {
        if sources.is_empty() {
            return Err(ScanwerkError::EmptyInput);
        }
        progress.reset(sources.len());
        info!(
            format = ?self.options.image_format,
            parallel = self.options.parallel,
            "Assembly started"
        );

        // In parallel mode every item is prepared up front; `collect` keeps
        // input order.
        let mut prepared: Vec<Option<Result<PreparedPage>>> = if self.options.parallel {
            sources
                .par_iter()
                .enumerate()
                .map(|(index, source)| {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    Some(self.prepare(index, source, enhancement_enabled))
                })
                .collect()
        } else {
            Vec::new()
        };

        let mut failures = Vec::new();
        let mut page_count = 0;

        for (index, source) in sources.iter().enumerate() {
            if cancel.is_cancelled() {
                let completed = progress.state().completed;
                info!(completed, "Assembly cancelled");
                return Err(ScanwerkError::Cancelled { completed });
            }

            let outcome = match prepared.get_mut(index).and_then(Option::take) {
                Some(outcome) => outcome,
                None => self.prepare(index, source, enhancement_enabled),
            };

            match outcome {
                Ok(page) => {
                    self.write_page(&mut writer, index, &page)?;
                    page_count += 1;
                }
                Err(err) if err.is_item_level() => {
                    warn!(index, name = %source.name, error = %err, "Skipping image");
                    failures.push(err);
                }
                Err(err) => return Err(err),
            }
            progress.advance();
        }

        if page_count == 0 {
            warn!(skipped = failures.len(), "Every image was skipped");
            return Err(ScanwerkError::EmptyInput);
        }

        let bytes = writer
            .serialize()
            .map_err(|err| ScanwerkError::WriterFailure {
                index: sources.len(),
                reason: err.to_string(),
            })?;

        info!(
            pages = page_count,
            skipped = failures.len(),
            bytes = bytes.len(),
            "Assembly finished"
        );
        Ok(Assembly {
            bytes,
            page_count,
            failures,
        })
    }

    /// Select, encode and place one image.
    fn prepare(
        &self,
        index: usize,
        source: &SourceImage,
        enhancement_enabled: bool,
    ) -> Result<PreparedPage> {
        let buffer = source.page_buffer(enhancement_enabled);
        if buffer.is_empty() {
            return Err(ScanwerkError::InvalidGeometry(format!(
                "image {} ({}) is {}x{}",
                index,
                source.name,
                buffer.width(),
                buffer.height()
            )));
        }

        let encoded = codec::encode(buffer, self.options.image_format, self.options.jpeg_quality)
            .map_err(|err| ScanwerkError::EncodeFailure {
                index,
                reason: err.to_string(),
            })?;

        let placement =
            layout::fit_to_page(buffer.width() as f32, buffer.height() as f32, &self.page)?;
        debug!(index, bytes = encoded.len(), ?placement, "Image prepared");

        Ok(PreparedPage { encoded, placement })
    }

    fn write_page<W: DocumentWriter>(
        &self,
        writer: &mut W,
        index: usize,
        page: &PreparedPage,
    ) -> Result<()> {
        let to_writer_failure = |err: ScanwerkError| ScanwerkError::WriterFailure {
            index,
            reason: err.to_string(),
        };
        writer
            .new_page(self.page.width_units, self.page.height_units)
            .map_err(to_writer_failure)?;
        writer
            .draw_image(&page.encoded, self.options.image_format, &page.placement)
            .map_err(to_writer_failure)
    }
}
