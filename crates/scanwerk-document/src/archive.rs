// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ZIP packaging for bulk page export.

use std::io::{Cursor, Write};

use scanwerk_core::error::{Result, ScanwerkError};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::capability::ArchiveWriter;

/// In-memory ZIP archive.
///
/// Entries are deflated; PNG/JPEG payloads are already compressed, so the
/// gain is small but the archive stays standard.
pub struct ZipArchiveWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    entries: usize,
}

impl ZipArchiveWriter {
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            entries: 0,
        }
    }

    pub fn entry_count(&self) -> usize {
        self.entries
    }
}

impl Default for ZipArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.zip
            .start_file(name, options)
            .map_err(|err| ScanwerkError::ArchiveFailure(format!("cannot add {}: {}", name, err)))?;
        self.zip.write_all(bytes).map_err(|err| {
            ScanwerkError::ArchiveFailure(format!("cannot write {}: {}", name, err))
        })?;
        self.entries += 1;
        debug!(name, bytes = bytes.len(), "Archive entry added");
        Ok(())
    }

    fn finalize(self) -> Result<Vec<u8>> {
        let cursor = self.zip.finish().map_err(|err| {
            ScanwerkError::ArchiveFailure(format!("cannot finish archive: {}", err))
        })?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn entries_read_back() {
        let mut archive = ZipArchiveWriter::new();
        archive.add_entry("page-001.png", b"first").unwrap();
        archive.add_entry("page-002.png", b"second").unwrap();
        assert_eq!(archive.entry_count(), 2);
        let bytes = archive.finalize().unwrap();

        let mut reader = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.len(), 2);
        let mut contents = String::new();
        reader
            .by_name("page-002.png")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "second");
    }

    #[test]
    fn duplicate_names_fail() {
        let mut archive = ZipArchiveWriter::new();
        archive.add_entry("page-001.png", b"a").unwrap();
        let err = archive.add_entry("page-001.png", b"b").unwrap_err();
        assert!(matches!(err, ScanwerkError::ArchiveFailure(_)));
    }
}
