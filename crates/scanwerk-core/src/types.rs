// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types shared by the document engine and the CLI.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a source image in a working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(pub Uuid);

impl SourceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Tabloid => (279, 432),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Parse a paper size keyword (`a4`, `letter`, ...) or a custom
    /// `<width>x<height>` size in millimetres.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "a4" => Some(Self::A4),
            "a3" => Some(Self::A3),
            "a5" => Some(Self::A5),
            "letter" => Some(Self::Letter),
            "legal" => Some(Self::Legal),
            "tabloid" | "ledger" => Some(Self::Tabloid),
            other => {
                let (w, h) = other.split_once('x')?;
                let width_mm = w.trim().parse().ok()?;
                let height_mm = h.trim().parse().ok()?;
                if width_mm == 0 || height_mm == 0 {
                    return None;
                }
                Some(Self::Custom {
                    width_mm,
                    height_mm,
                })
            }
        }
    }
}

/// Fixed page geometry for one output document, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    pub width_units: f32,
    pub height_units: f32,
    pub margin_units: f32,
}

impl PageSpec {
    pub fn new(width_units: f32, height_units: f32, margin_units: f32) -> Self {
        Self {
            width_units,
            height_units,
            margin_units,
        }
    }

    /// Page geometry for a paper size with a uniform margin.
    pub fn from_paper(paper: PaperSize, margin_mm: f32) -> Self {
        let (w, h) = paper.dimensions_mm();
        Self::new(w as f32, h as f32, margin_mm)
    }
}

impl Default for PageSpec {
    /// A4 with a 10 mm margin on every side.
    fn default() -> Self {
        Self::from_paper(PaperSize::A4, 10.0)
    }
}

/// Raster encodings available for exported pages and embedded images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless PNG.
    Png,
    /// Lossy JPEG; quality is supplied separately by the caller.
    Jpeg,
}

impl OutputFormat {
    /// File extension used for exported files.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }
}

/// Discrete progress of a page-by-page run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressState {
    pub completed: usize,
    pub total: usize,
}

impl ProgressState {
    pub fn is_finished(&self) -> bool {
        self.completed >= self.total
    }

    /// Completion ratio in `[0, 1]`; an empty run counts as finished.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paper_names_parse() {
        assert_eq!(PaperSize::from_name("A4"), Some(PaperSize::A4));
        assert_eq!(PaperSize::from_name("ledger"), Some(PaperSize::Tabloid));
        assert_eq!(
            PaperSize::from_name("100x150"),
            Some(PaperSize::Custom {
                width_mm: 100,
                height_mm: 150
            })
        );
        assert_eq!(PaperSize::from_name("0x150"), None);
        assert_eq!(PaperSize::from_name("b5"), None);
    }

    #[test]
    fn default_page_is_a4_with_ten_mm_margin() {
        let spec = PageSpec::default();
        assert_eq!(spec.width_units, 210.0);
        assert_eq!(spec.height_units, 297.0);
        assert_eq!(spec.margin_units, 10.0);
    }

    #[test]
    fn output_format_names() {
        assert_eq!(OutputFormat::from_name("JPG"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::Jpeg.extension(), "jpeg");
        assert_eq!(OutputFormat::Png.mime_type(), "image/png");
        assert_eq!(OutputFormat::from_name("gif"), None);
    }

    #[test]
    fn progress_fraction() {
        let state = ProgressState {
            completed: 5,
            total: 10,
        };
        assert!((state.fraction() - 0.5).abs() < f64::EPSILON);
        assert!(!state.is_finished());
        assert!(ProgressState::default().is_finished());
    }
}
