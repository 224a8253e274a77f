// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-document — the document engine behind Scanwerk.
//
// Two workflows share one set of building blocks:
//   images -> (optional scan enhancement) -> fitted pages -> PDF
//   PDF -> rendered pages -> PNG/JPEG files or a ZIP archive

pub mod archive;
pub mod assemble;
pub mod capability;
pub mod codec;
pub mod extract;
pub mod layout;
pub mod pdf;
pub mod progress;
pub mod raster;
pub mod scan;
pub mod session;

// Re-export the primary structs so callers can use `scanwerk_document::PdfReader` etc.
pub use archive::ZipArchiveWriter;
pub use assemble::{Assembly, AssemblyOptions, DocumentAssembler};
pub use capability::{ArchiveWriter, DocumentReader, DocumentWriter};
pub use extract::{DocumentExtractor, ExtractOptions, ExtractedPage, Extraction, PageFailure};
pub use layout::{PlacedImage, fit, fit_to_page};
pub use pdf::{PdfReader, PdfWriter};
pub use progress::{BatchProgressTracker, CancellationToken};
pub use raster::RasterBuffer;
pub use scan::{EnhancementPipeline, Stage};
pub use session::{BatchAdd, Session, SourceImage};
