//! Screen/document space conversion
//!
//! Screen space is the pointer's coordinate system. Document space is the
//! page's own unscaled coordinate system; see [`PageCoordinate`].

use crate::annotation::PageCoordinate;
use serde::{Deserialize, Serialize};

/// Pointer position in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned rectangle in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    /// Square of side `size` centered on `center`
    pub fn centered(center: ScreenPoint, size: f32) -> Self {
        let half = size / 2.0;
        Self::new(center.x - half, center.y - half, size, size)
    }

    /// Smallest rectangle spanning two corners in any order
    pub fn from_corners(a: ScreenPoint, b: ScreenPoint) -> Self {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        Self::new(left, top, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn top_right(&self) -> ScreenPoint {
        ScreenPoint::new(self.right(), self.top)
    }

    /// Inclusive containment test
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.left
            && point.x <= self.right()
            && point.y >= self.top
            && point.y <= self.bottom()
    }
}

/// Map a pointer position to document space
///
/// Returns `None` when the point is not finite, the page has no area, or the
/// scale is not positive.
pub fn screen_to_document(
    point: ScreenPoint,
    page_rect: &ScreenRect,
    scale: f32,
) -> Option<PageCoordinate> {
    if !point.is_finite() || page_rect.width <= 0.0 || page_rect.height <= 0.0 || scale <= 0.0 {
        return None;
    }
    Some(PageCoordinate::new(
        (point.x - page_rect.left) / scale,
        (point.y - page_rect.top) / scale,
    ))
}

/// Map a document position to screen pixels relative to the page origin
pub fn document_to_screen(coordinate: PageCoordinate, scale: f32) -> ScreenPoint {
    ScreenPoint::new(coordinate.x * scale, coordinate.y * scale)
}
