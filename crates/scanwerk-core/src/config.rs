// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{OutputFormat, PageSpec, PaperSize};

/// Tunables for the scan enhancement pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementSettings {
    /// Contrast multiplier applied around mid-grey (128).
    pub contrast_factor: f32,
    /// Pixels whose channel average exceeds this are snapped to white.
    pub background_threshold: u8,
}

impl Default for EnhancementSettings {
    fn default() -> Self {
        Self {
            contrast_factor: 1.5,
            background_threshold: 240,
        }
    }
}

/// Persistent application settings.
///
/// Missing keys in a config file fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Paper size for assembled documents.
    pub paper_size: PaperSize,
    /// Uniform page margin in millimetres.
    pub margin_mm: f32,
    /// Scan-mode pipeline parameters.
    pub enhancement: EnhancementSettings,
    /// Encoding used for images embedded in assembled documents.
    pub assembly_format: OutputFormat,
    /// JPEG quality (1-100) for embedded images.
    pub assembly_jpeg_quality: u8,
    /// Render scale for extraction (1.0 = one pixel per PDF point).
    pub extract_scale: f32,
    /// Encoding of extracted pages.
    pub extract_format: OutputFormat,
    /// JPEG quality (1-100) for extracted pages.
    pub extract_jpeg_quality: u8,
    /// Process independent pages/images on the rayon thread pool.
    pub parallel: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            margin_mm: 10.0,
            enhancement: EnhancementSettings::default(),
            assembly_format: OutputFormat::Jpeg,
            assembly_jpeg_quality: 85,
            extract_scale: 2.0,
            extract_format: OutputFormat::Png,
            extract_jpeg_quality: 90,
            parallel: false,
        }
    }
}

impl AppConfig {
    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Write settings to a JSON file (pretty-printed).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), raw)?;
        Ok(())
    }

    /// Page geometry derived from the paper size and margin.
    pub fn page_spec(&self) -> PageSpec {
        PageSpec::from_paper(self.paper_size, self.margin_mm)
    }
}
