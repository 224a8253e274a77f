// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page layout — aspect-preserving, centred placement of raster content
// inside a fixed page minus its margins.

use scanwerk_core::PageSpec;
use scanwerk_core::error::{Result, ScanwerkError};

/// Where an image lands on its page, in page units with a top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedImage {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PlacedImage {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Fit `content_width` x `content_height` into a `page_width` x `page_height`
/// page with a uniform `margin`.
///
/// Content relatively wider than the available box is constrained by the
/// available width, otherwise by the available height. The result is centred
/// on both axes and never cropped or rotated.
pub fn fit(
    content_width: f32,
    content_height: f32,
    page_width: f32,
    page_height: f32,
    margin: f32,
) -> Result<PlacedImage> {
    if !(content_width > 0.0 && content_height > 0.0)
        || !content_width.is_finite()
        || !content_height.is_finite()
    {
        return Err(ScanwerkError::InvalidGeometry(format!(
            "content must have positive size, got {}x{}",
            content_width, content_height
        )));
    }

    let available_width = page_width - 2.0 * margin;
    let available_height = page_height - 2.0 * margin;
    if !(available_width > 0.0 && available_height > 0.0) {
        return Err(ScanwerkError::InvalidGeometry(format!(
            "margin {} leaves no room on a {}x{} page",
            margin, page_width, page_height
        )));
    }

    let content_aspect = content_width / content_height;
    let available_aspect = available_width / available_height;

    let (width, height) = if content_aspect > available_aspect {
        (available_width, available_width / content_aspect)
    } else {
        (available_height * content_aspect, available_height)
    };

    Ok(PlacedImage {
        x: (page_width - width) / 2.0,
        y: (page_height - height) / 2.0,
        width,
        height,
    })
}

/// [`fit`] against a [`PageSpec`].
pub fn fit_to_page(
    content_width: f32,
    content_height: f32,
    page: &PageSpec,
) -> Result<PlacedImage> {
    fit(
        content_width,
        content_height,
        page.width_units,
        page.height_units,
        page.margin_units,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn inside_margin_box(p: &PlacedImage, w: f32, h: f32, m: f32) -> bool {
        p.x >= m - EPS && p.y >= m - EPS && p.right() <= w - m + EPS && p.bottom() <= h - m + EPS
    }

    #[test]
    fn landscape_content_on_portrait_page_is_width_bound() {
        let p = fit(200.0, 100.0, 210.0, 297.0, 10.0).unwrap();
        assert!((p.width - 190.0).abs() < EPS);
        assert!((p.height - 95.0).abs() < EPS);
        assert!((p.x - 10.0).abs() < EPS);
        assert!((p.y - 101.0).abs() < EPS);
        // Centred: equal space either side.
        assert!((p.x - (210.0 - p.right())).abs() < EPS);
        assert!((p.y - (297.0 - p.bottom())).abs() < EPS);
        assert!(inside_margin_box(&p, 210.0, 297.0, 10.0));
    }

    #[test]
    fn tall_content_is_height_bound() {
        let p = fit(100.0, 400.0, 210.0, 297.0, 10.0).unwrap();
        assert!((p.height - 277.0).abs() < EPS);
        assert!((p.width - 69.25).abs() < EPS);
        assert!((p.y - 10.0).abs() < EPS);
        assert!(inside_margin_box(&p, 210.0, 297.0, 10.0));
    }

    #[test]
    fn aspect_ratio_preserved() {
        for (cw, ch) in [(640.0, 480.0), (1.0, 1.0), (3000.0, 17.0), (9.0, 1600.0)] {
            let p = fit_to_page(cw, ch, &PageSpec::default()).unwrap();
            assert!(((p.width / p.height) - (cw / ch)).abs() / (cw / ch) < 1e-4);
            assert!(inside_margin_box(&p, 210.0, 297.0, 10.0));
        }
    }

    #[test]
    fn degenerate_content_rejected() {
        for (cw, ch) in [(0.0, 10.0), (10.0, 0.0), (-5.0, 10.0), (f32::NAN, 3.0)] {
            let err = fit(cw, ch, 210.0, 297.0, 10.0).unwrap_err();
            assert!(matches!(err, ScanwerkError::InvalidGeometry(_)));
        }
    }

    #[test]
    fn oversized_margin_rejected() {
        let err = fit(10.0, 10.0, 100.0, 100.0, 50.0).unwrap_err();
        assert!(matches!(err, ScanwerkError::InvalidGeometry(_)));
    }
}
