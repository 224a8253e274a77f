// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF backends: `printpdf` for writing, `lopdf` and PDFium for reading.

pub mod reader;
pub mod writer;

pub use reader::{MAX_RENDER_DIMENSION, PdfReader};
pub use writer::PdfWriter;
