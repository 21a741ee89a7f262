//! Overlay rendering
//!
//! Maps annotations on one page to visual primitives in page-relative screen
//! pixels (origin at the page's top-left corner, after zoom). Rendering is a
//! pure function of its inputs; nothing here touches the store.

use crate::annotation::{Annotation, AnnotationId, AnnotationKind, Color};
use crate::config::AnnotatorConfig;
use crate::geometry::{document_to_screen, ScreenPoint, ScreenRect};
use serde::Serialize;

/// Marker fill for comments that were never given a color
pub const DEFAULT_COMMENT_COLOR: Color = Color::AMBER;

/// Drawable content of an overlay
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayPrimitive {
    /// Translucent filled rectangle
    Fill { color: Color, opacity: f32 },
    /// Solid bar
    Bar { color: Color },
    /// Fixed-size comment marker
    CommentMarker { color: Color, has_content: bool, editor_open: bool },
    /// Signature raster stretched over the overlay bounds
    Image { data_url: String },
}

/// One annotation's visual representation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub annotation_id: AnnotationId,
    pub bounds: ScreenRect,
    /// Delete affordance centered on the top-right corner of `bounds`
    pub delete_handle: ScreenRect,
    pub primitive: OverlayPrimitive,
}

/// What a pointer landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    DeleteHandle,
    CommentMarker,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayHit {
    pub annotation_id: AnnotationId,
    pub target: HitTarget,
}

/// Render the overlays for one page's annotations at `scale`
///
/// `open_comment` marks the comment whose editor is open. Signatures without
/// an image produce no overlay.
pub fn render_overlays(
    annotations: &[&Annotation],
    scale: f32,
    config: &AnnotatorConfig,
    open_comment: Option<AnnotationId>,
) -> Vec<Overlay> {
    annotations
        .iter()
        .filter_map(|annotation| render_one(annotation, scale, config, open_comment))
        .collect()
}

fn render_one(
    annotation: &Annotation,
    scale: f32,
    config: &AnnotatorConfig,
    open_comment: Option<AnnotationId>,
) -> Option<Overlay> {
    let origin = document_to_screen(annotation.position(), scale);

    let (bounds, primitive) = match annotation.kind() {
        AnnotationKind::Highlight { width, height, color } => (
            ScreenRect::new(
                origin.x,
                origin.y,
                width.unwrap_or(config.default_region_width) * scale,
                height.unwrap_or(config.default_region_height) * scale,
            ),
            OverlayPrimitive::Fill { color: *color, opacity: config.highlight_opacity },
        ),
        AnnotationKind::Underline { width, color } => (
            ScreenRect::new(
                origin.x,
                origin.y + config.underline_offset_px,
                width.unwrap_or(config.default_region_width) * scale,
                config.underline_thickness_px,
            ),
            OverlayPrimitive::Bar { color: *color },
        ),
        AnnotationKind::Comment { content, color } => (
            ScreenRect::new(origin.x, origin.y, config.comment_marker_px, config.comment_marker_px),
            OverlayPrimitive::CommentMarker {
                color: color.unwrap_or(DEFAULT_COMMENT_COLOR),
                has_content: !content.trim().is_empty(),
                editor_open: open_comment == Some(annotation.id()),
            },
        ),
        AnnotationKind::Signature { image } => {
            let image = image.as_ref()?;
            let (width, height) = fit_signature(image.width, image.height, config);
            (
                ScreenRect::new(origin.x, origin.y, width * scale, height * scale),
                OverlayPrimitive::Image { data_url: image.data_url.clone() },
            )
        }
    };

    Some(Overlay {
        annotation_id: annotation.id(),
        bounds,
        delete_handle: ScreenRect::centered(bounds.top_right(), config.delete_handle_px),
        primitive,
    })
}

/// Natural signature size shrunk (never enlarged) into the configured box
fn fit_signature(width: u32, height: u32, config: &AnnotatorConfig) -> (f32, f32) {
    if width == 0 || height == 0 {
        return (0.0, 0.0);
    }
    let (width, height) = (width as f32, height as f32);
    let factor = (config.signature_max_width / width)
        .min(config.signature_max_height / height)
        .min(1.0);
    (width * factor, height * factor)
}

/// Find what lies under `point`
///
/// Delete handles are checked before bodies, and within each pass the
/// topmost (last rendered) overlay wins.
pub fn hit_test(overlays: &[Overlay], point: ScreenPoint) -> Option<OverlayHit> {
    let handle = overlays.iter().rev().find(|overlay| overlay.delete_handle.contains(point));
    if let Some(overlay) = handle {
        return Some(OverlayHit {
            annotation_id: overlay.annotation_id,
            target: HitTarget::DeleteHandle,
        });
    }

    overlays.iter().rev().find(|overlay| overlay.bounds.contains(point)).map(|overlay| {
        let target = match overlay.primitive {
            OverlayPrimitive::CommentMarker { .. } => HitTarget::CommentMarker,
            _ => HitTarget::Body,
        };
        OverlayHit { annotation_id: overlay.annotation_id, target }
    })
}
