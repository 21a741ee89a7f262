//! Pointer-to-annotation placement

use crate::annotation::{
    AnnotationId, AnnotationKind, AnnotationPatch, AnnotationTool, NewAnnotation,
};
use crate::config::AnnotatorConfig;
use crate::error::{AnnotatorError, Result};
use crate::geometry::{screen_to_document, ScreenPoint, ScreenRect};
use crate::signature::SignatureSource;
use crate::store::AnnotationStore;
use crate::tool::ToolState;
use serde::{Deserialize, Serialize};

/// A press on the page, optionally with the point where a drag ended
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerInput {
    pub screen: ScreenPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drag_end: Option<ScreenPoint>,
}

impl PointerInput {
    pub fn click(x: f32, y: f32) -> Self {
        Self { screen: ScreenPoint::new(x, y), drag_end: None }
    }

    pub fn drag(from: ScreenPoint, to: ScreenPoint) -> Self {
        Self { screen: from, drag_end: Some(to) }
    }
}

/// Where the page is on screen and which page it is
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageView {
    pub page_number: u32,
    pub rect: ScreenRect,
    pub scale: f32,
}

/// Everything placement mutates
pub struct PlacementTarget<'a> {
    pub store: &'a mut AnnotationStore,
    pub tools: &'a mut ToolState,
    pub signature_pad: &'a dyn SignatureSource,
}

/// Turn a pointer press into a stored annotation
///
/// Returns `Ok(None)` when no tool is armed or the press missed the page.
/// Signature placement with an empty pad fails with
/// [`AnnotatorError::EmptySignature`] and creates nothing; a successful
/// signature placement disarms the tool.
pub fn place_annotation(
    input: PointerInput,
    view: &PageView,
    target: PlacementTarget<'_>,
    config: &AnnotatorConfig,
) -> Result<Option<AnnotationId>> {
    let Some(tool) = target.tools.active() else {
        return Ok(None);
    };

    if !view.rect.contains(input.screen) {
        log::debug!("ignoring press outside the page at ({}, {})", input.screen.x, input.screen.y);
        return Ok(None);
    }

    if tool == AnnotationTool::Signature && target.signature_pad.is_empty() {
        return Err(AnnotatorError::EmptySignature);
    }

    let (anchor, extent) = resolve_region(tool, input, config.drag_threshold_px);
    let Some(position) = screen_to_document(anchor, &view.rect, view.scale) else {
        return Ok(None);
    };
    let extent = extent.map(|(w, h)| (w / view.scale, h / view.scale));

    // A failed encode must leave the store and tool untouched
    let signature = if tool == AnnotationTool::Signature {
        let image = target
            .signature_pad
            .export_image()
            .map_err(|err| AnnotatorError::SignatureEncoding(err.to_string()))?;
        Some(image)
    } else {
        None
    };

    let kind = AnnotationKind::new_for_tool(tool, target.tools.color(), extent);
    let id = target
        .store
        .create(NewAnnotation { page_number: view.page_number, position, kind })
        .id();

    if let Some(image) = signature {
        target.store.update(id, AnnotationPatch::SignatureImage(image));
        target.tools.reset();
    }

    log::info!(
        "placed {tool} on page {} at ({:.1}, {:.1})",
        view.page_number,
        position.x,
        position.y
    );
    Ok(Some(id))
}

/// Anchor point and optional screen-space extent for a press
fn resolve_region(
    tool: AnnotationTool,
    input: PointerInput,
    threshold: f32,
) -> (ScreenPoint, Option<(f32, f32)>) {
    let Some(end) = input.drag_end.filter(|_| tool.is_region()) else {
        return (input.screen, None);
    };

    let dx = end.x - input.screen.x;
    let dy = end.y - input.screen.y;
    if dx.abs().max(dy.abs()) <= threshold {
        return (input.screen, None);
    }

    let region = ScreenRect::from_corners(input.screen, end);
    (ScreenPoint::new(region.left, region.top), Some((region.width, region.height)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Color, PageCoordinate, SignatureImage};
    use crate::config::SignaturePadConfig;
    use crate::signature::SignaturePad;

    struct Fixture {
        store: AnnotationStore,
        tools: ToolState,
        pad: SignaturePad,
        config: AnnotatorConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: AnnotationStore::new(),
                tools: ToolState::new(Color::YELLOW),
                pad: SignaturePad::new(&SignaturePadConfig::default()),
                config: AnnotatorConfig::default(),
            }
        }

        fn place(&mut self, input: PointerInput, scale: f32) -> Result<Option<AnnotationId>> {
            let view = PageView {
                page_number: 1,
                rect: ScreenRect::new(20.0, 20.0, 612.0 * scale, 792.0 * scale),
                scale,
            };
            place_annotation(
                input,
                &view,
                PlacementTarget {
                    store: &mut self.store,
                    tools: &mut self.tools,
                    signature_pad: &self.pad,
                },
                &self.config,
            )
        }
    }

    #[test]
    fn highlight_click_stores_document_position() {
        let mut fixture = Fixture::new();
        fixture.tools.select(AnnotationTool::Highlight);

        let id = fixture.place(PointerInput::click(120.0, 80.0), 1.0).unwrap().unwrap();

        let annotation = fixture.store.get(id).unwrap();
        assert_eq!(annotation.position(), PageCoordinate::new(100.0, 60.0));
        assert_eq!(annotation.page_number(), 1);
        assert_eq!(
            annotation.kind(),
            &AnnotationKind::Highlight { width: None, height: None, color: Color::YELLOW }
        );
    }

    #[test]
    fn position_is_divided_by_scale() {
        let mut fixture = Fixture::new();
        fixture.tools.select(AnnotationTool::Comment);

        let id = fixture.place(PointerInput::click(220.0, 120.0), 2.0).unwrap().unwrap();
        assert_eq!(fixture.store.get(id).unwrap().position(), PageCoordinate::new(100.0, 50.0));
    }

    #[test]
    fn no_active_tool_is_noop() {
        let mut fixture = Fixture::new();
        assert_eq!(fixture.place(PointerInput::click(100.0, 100.0), 1.0).unwrap(), None);
        assert!(fixture.store.is_empty());
    }

    #[test]
    fn press_outside_page_is_ignored() {
        let mut fixture = Fixture::new();
        fixture.tools.select(AnnotationTool::Underline);
        assert_eq!(fixture.place(PointerInput::click(5.0, 5.0), 1.0).unwrap(), None);
        assert!(fixture.store.is_empty());
    }

    #[test]
    fn drag_creates_normalized_region() {
        let mut fixture = Fixture::new();
        fixture.tools.set_color(Color::GREEN);
        fixture.tools.select(AnnotationTool::Highlight);

        let input =
            PointerInput::drag(ScreenPoint::new(220.0, 60.0), ScreenPoint::new(120.0, 40.0));
        let id = fixture.place(input, 2.0).unwrap().unwrap();

        let annotation = fixture.store.get(id).unwrap();
        assert_eq!(annotation.position(), PageCoordinate::new(50.0, 10.0));
        assert_eq!(
            annotation.kind(),
            &AnnotationKind::Highlight {
                width: Some(50.0),
                height: Some(10.0),
                color: Color::GREEN
            }
        );
    }

    #[test]
    fn short_drag_counts_as_click() {
        let mut fixture = Fixture::new();
        fixture.tools.select(AnnotationTool::Underline);

        let input =
            PointerInput::drag(ScreenPoint::new(100.0, 100.0), ScreenPoint::new(101.5, 100.0));
        let id = fixture.place(input, 1.0).unwrap().unwrap();

        assert_eq!(
            fixture.store.get(id).unwrap().kind(),
            &AnnotationKind::Underline { width: None, color: Color::YELLOW }
        );
    }

    #[test]
    fn signature_with_empty_pad_is_rejected() {
        let mut fixture = Fixture::new();
        fixture.tools.select(AnnotationTool::Signature);

        let err = fixture.place(PointerInput::click(100.0, 100.0), 1.0).unwrap_err();

        assert_eq!(err, AnnotatorError::EmptySignature);
        assert!(fixture.store.is_empty());
        assert_eq!(fixture.tools.active(), Some(AnnotationTool::Signature));
    }

    #[test]
    fn signature_is_attached_to_created_record_and_tool_resets() {
        let mut fixture = Fixture::new();
        fixture.pad.begin_stroke(ScreenPoint::new(10.0, 10.0));
        fixture.pad.extend_stroke(ScreenPoint::new(90.0, 50.0));
        fixture.pad.end_stroke();
        fixture.tools.select(AnnotationTool::Signature);

        let id = fixture.place(PointerInput::click(100.0, 100.0), 1.0).unwrap().unwrap();

        match fixture.store.get(id).unwrap().kind() {
            AnnotationKind::Signature { image: Some(image) } => {
                assert!(image.data_url.starts_with("data:image/png;base64,"));
            }
            other => panic!("expected attached signature, got {other:?}"),
        }
        assert_eq!(fixture.tools.active(), None);
    }

    struct BrokenEncoder;

    impl SignatureSource for BrokenEncoder {
        fn is_empty(&self) -> bool {
            false
        }

        fn export_image(&self) -> std::result::Result<SignatureImage, image::ImageError> {
            Err(image::ImageError::IoError(std::io::Error::other("encoder unavailable")))
        }
    }

    #[test]
    fn failed_signature_encoding_creates_nothing() {
        let mut store = AnnotationStore::new();
        let mut tools = ToolState::new(Color::BLACK);
        tools.select(AnnotationTool::Signature);
        let view =
            PageView { page_number: 1, rect: ScreenRect::new(0.0, 0.0, 612.0, 792.0), scale: 1.0 };

        let err = place_annotation(
            PointerInput::click(50.0, 50.0),
            &view,
            PlacementTarget { store: &mut store, tools: &mut tools, signature_pad: &BrokenEncoder },
            &AnnotatorConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(err, AnnotatorError::SignatureEncoding(_)));
        assert!(store.is_empty());
        assert_eq!(tools.active(), Some(AnnotationTool::Signature));
    }
}
