// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanwerk.

use thiserror::Error;

/// Top-level error type for all Scanwerk operations.
///
/// Item-level variants (`DecodeFailure`, `EncodeFailure`, `RenderFailure`)
/// are recovered by the batch loops: the item is skipped and reported. Every
/// other variant aborts the call it was raised from.
#[derive(Debug, Error)]
pub enum ScanwerkError {
    // -- Run-level --
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("nothing to assemble: no usable source images")]
    EmptyInput,

    #[error("document writer rejected item {index}: {reason}")]
    WriterFailure { index: usize, reason: String },

    #[error("archive packaging failed: {0}")]
    ArchiveFailure(String),

    #[error("run cancelled after {completed} item(s)")]
    Cancelled { completed: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    // -- Item-level --
    #[error("could not decode source item {index}: {reason}")]
    DecodeFailure { index: usize, reason: String },

    #[error("could not encode item {index}: {reason}")]
    EncodeFailure { index: usize, reason: String },

    #[error("could not render page {page}: {reason}")]
    RenderFailure { page: u32, reason: String },

    // -- Buffers / documents --
    #[error("invalid raster buffer: {0}")]
    InvalidBuffer(String),

    #[error("page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: u32, count: usize },

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScanwerkError {
    /// Whether this error concerns a single item that a batch run skips
    /// rather than aborting on.
    pub fn is_item_level(&self) -> bool {
        matches!(
            self,
            Self::DecodeFailure { .. } | Self::EncodeFailure { .. } | Self::RenderFailure { .. }
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanwerkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_level_classification() {
        assert!(ScanwerkError::RenderFailure { page: 3, reason: "bad".into() }.is_item_level());
        assert!(ScanwerkError::DecodeFailure { index: 0, reason: "bad".into() }.is_item_level());
        assert!(!ScanwerkError::EmptyInput.is_item_level());
        assert!(!ScanwerkError::WriterFailure { index: 2, reason: "full".into() }.is_item_level());
    }

    #[test]
    fn writer_failure_names_the_item() {
        let err = ScanwerkError::WriterFailure { index: 4, reason: "disk full".into() };
        assert_eq!(err.to_string(), "document writer rejected item 4: disk full");
    }
}
