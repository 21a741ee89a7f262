//! Annotation data model
//!
//! One closed variant per annotation kind. Positions and extents are stored in
//! document space (independent of the zoom scale the page was clicked at).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for an annotation
///
/// Generated with UUID v4 at creation time and never reused within a session.
pub type AnnotationId = uuid::Uuid;

/// Coordinate in document space
///
/// Origin at the top-left of the rendered page, x to the right, y downward,
/// in units of unscaled page pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageCoordinate {
    pub x: f32,
    pub y: f32,
}

impl PageCoordinate {
    /// Create a new page coordinate
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another coordinate
    pub fn distance_to(&self, other: &PageCoordinate) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// RGBA color, serialized as `#RRGGBB` (or `#RRGGBBAA` when not opaque)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Create a new color
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Convert to normalized RGBA values (0.0 to 1.0)
    pub fn to_normalized(&self) -> (f32, f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        )
    }

    /// Same color with its alpha replaced
    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

/// Highlight palette offered by the tool bar
impl Color {
    pub const YELLOW: Color = Color::rgb(0xFF, 0xEB, 0x3B);
    pub const GREEN: Color = Color::rgb(0x4C, 0xAF, 0x50);
    pub const BLUE: Color = Color::rgb(0x21, 0x96, 0xF3);
    pub const RED: Color = Color::rgb(0xF4, 0x43, 0x36);
    pub const PURPLE: Color = Color::rgb(0x9C, 0x27, 0xB0);
    pub const AMBER: Color = Color::rgb(0xFF, 0xC1, 0x07);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const PALETTE: [(Color, &'static str); 5] = [
        (Color::YELLOW, "Yellow"),
        (Color::GREEN, "Green"),
        (Color::BLUE, "Blue"),
        (Color::RED, "Red"),
        (Color::PURPLE, "Purple"),
    ];
}

/// Error returned when parsing a hex color
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {0:?}, expected #RRGGBB or #RRGGBBAA")]
pub struct ParseColorError(pub String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_owned());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.is_ascii() {
            return Err(err());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());

        match hex.len() {
            6 => Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Color::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => Err(err()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02X}", self.a)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Raster signature attached to a signature annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureImage {
    /// `data:image/png;base64,...`
    pub data_url: String,
    /// Pixel width of the encoded image
    pub width: u32,
    /// Pixel height of the encoded image
    pub height: u32,
}

/// Annotation creation tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationTool {
    Highlight,
    Underline,
    Comment,
    Signature,
}

impl AnnotationTool {
    pub const ALL: [AnnotationTool; 4] = [
        AnnotationTool::Highlight,
        AnnotationTool::Underline,
        AnnotationTool::Comment,
        AnnotationTool::Signature,
    ];

    /// Whether annotations made with this tool cover a region and take the stroke color
    pub fn is_region(self) -> bool {
        matches!(self, AnnotationTool::Highlight | AnnotationTool::Underline)
    }

    pub fn name(self) -> &'static str {
        match self {
            AnnotationTool::Highlight => "highlight",
            AnnotationTool::Underline => "underline",
            AnnotationTool::Comment => "comment",
            AnnotationTool::Signature => "signature",
        }
    }
}

impl fmt::Display for AnnotationTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind-specific annotation payload
///
/// Region extents are optional: a click without a drag leaves them unset and
/// rendering falls back to the configured default region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnnotationKind {
    Highlight {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<f32>,
        color: Color,
    },
    Underline {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f32>,
        color: Color,
    },
    Comment {
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<Color>,
    },
    Signature {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image: Option<SignatureImage>,
    },
}

impl AnnotationKind {
    /// The tool that produces this kind
    pub fn tool(&self) -> AnnotationTool {
        match self {
            AnnotationKind::Highlight { .. } => AnnotationTool::Highlight,
            AnnotationKind::Underline { .. } => AnnotationTool::Underline,
            AnnotationKind::Comment { .. } => AnnotationTool::Comment,
            AnnotationKind::Signature { .. } => AnnotationTool::Signature,
        }
    }

    /// Fresh payload for a tool with type defaults applied
    ///
    /// Comments start with empty content, signatures without an image.
    pub fn new_for_tool(tool: AnnotationTool, color: Color, extent: Option<(f32, f32)>) -> Self {
        match tool {
            AnnotationTool::Highlight => AnnotationKind::Highlight {
                width: extent.map(|(w, _)| w),
                height: extent.map(|(_, h)| h),
                color,
            },
            AnnotationTool::Underline => {
                AnnotationKind::Underline { width: extent.map(|(w, _)| w), color }
            }
            AnnotationTool::Comment => {
                AnnotationKind::Comment { content: String::new(), color: None }
            }
            AnnotationTool::Signature => AnnotationKind::Signature { image: None },
        }
    }
}

/// Caller-supplied fields for [`crate::store::AnnotationStore::create`]
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnnotation {
    pub page_number: u32,
    pub position: PageCoordinate,
    pub kind: AnnotationKind,
}

/// Partial update merged into an existing annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum AnnotationPatch {
    /// Comment text
    Content(String),
    /// Signature raster
    SignatureImage(SignatureImage),
    /// Stroke color of a highlight, underline, or comment
    Color(Color),
}

/// A single user-added mark anchored to one page and position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    id: AnnotationId,
    page_number: u32,
    position: PageCoordinate,
    #[serde(flatten)]
    kind: AnnotationKind,
}

impl Annotation {
    /// Create a new annotation with a generated ID
    pub(crate) fn new(fields: NewAnnotation) -> Self {
        Self::with_id(AnnotationId::new_v4(), fields)
    }

    /// Create an annotation with a specific ID (for deserialization)
    pub fn with_id(id: AnnotationId, fields: NewAnnotation) -> Self {
        Self {
            id,
            page_number: fields.page_number.max(1),
            position: fields.position,
            kind: fields.kind,
        }
    }

    /// Get the annotation ID
    pub fn id(&self) -> AnnotationId {
        self.id
    }

    /// Get the 1-based page number
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Get the document-space position
    pub fn position(&self) -> PageCoordinate {
        self.position
    }

    pub fn kind(&self) -> &AnnotationKind {
        &self.kind
    }

    pub fn tool(&self) -> AnnotationTool {
        self.kind.tool()
    }

    /// Merge a patch into the payload
    ///
    /// Returns `false` when the patch does not apply to this kind; the
    /// annotation is left unchanged in that case.
    pub(crate) fn apply_patch(&mut self, patch: AnnotationPatch) -> bool {
        match (&mut self.kind, patch) {
            (AnnotationKind::Comment { content, .. }, AnnotationPatch::Content(text)) => {
                *content = text;
                true
            }
            (AnnotationKind::Signature { image }, AnnotationPatch::SignatureImage(data)) => {
                *image = Some(data);
                true
            }
            (AnnotationKind::Highlight { color, .. }, AnnotationPatch::Color(new_color))
            | (AnnotationKind::Underline { color, .. }, AnnotationPatch::Color(new_color)) => {
                *color = new_color;
                true
            }
            (AnnotationKind::Comment { color, .. }, AnnotationPatch::Color(new_color)) => {
                *color = Some(new_color);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment_at(x: f32, y: f32) -> Annotation {
        Annotation::new(NewAnnotation {
            page_number: 1,
            position: PageCoordinate::new(x, y),
            kind: AnnotationKind::new_for_tool(AnnotationTool::Comment, Color::YELLOW, None),
        })
    }

    #[test]
    fn test_page_coordinate_distance() {
        let p1 = PageCoordinate::new(0.0, 0.0);
        let p2 = PageCoordinate::new(3.0, 4.0);
        assert!((p1.distance_to(&p2) - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_color_hex_round_trip() {
        let color: Color = "#ffeb3b".parse().expect("valid hex");
        assert_eq!(color, Color::YELLOW);
        assert_eq!(color.to_string(), "#FFEB3B");

        let translucent: Color = "#2196F380".parse().expect("valid hex with alpha");
        assert_eq!(translucent.a, 0x80);
        assert_eq!(translucent.to_string(), "#2196F380");
    }

    #[test]
    fn test_color_rejects_malformed_input() {
        assert!("FFEB3B".parse::<Color>().is_err());
        assert!("#FFF".parse::<Color>().is_err());
        assert!("#GGGGGG".parse::<Color>().is_err());
        assert!("#ÿÿÿ".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_normalization() {
        let color = Color::rgb(255, 128, 0);
        let (r, g, b, a) = color.to_normalized();
        assert!((r - 1.0).abs() < 0.001);
        assert!((g - 0.502).abs() < 0.01);
        assert!((b - 0.0).abs() < 0.001);
        assert!((a - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_comment_defaults_to_empty_content() {
        let annotation = comment_at(10.0, 10.0);
        assert_eq!(
            annotation.kind(),
            &AnnotationKind::Comment { content: String::new(), color: None }
        );
        assert_eq!(annotation.tool(), AnnotationTool::Comment);
    }

    #[test]
    fn test_region_extent_only_for_region_tools() {
        let highlight =
            AnnotationKind::new_for_tool(AnnotationTool::Highlight, Color::RED, Some((50.0, 8.0)));
        assert_eq!(
            highlight,
            AnnotationKind::Highlight { width: Some(50.0), height: Some(8.0), color: Color::RED }
        );

        let signature =
            AnnotationKind::new_for_tool(AnnotationTool::Signature, Color::RED, Some((50.0, 8.0)));
        assert_eq!(signature, AnnotationKind::Signature { image: None });
    }

    #[test]
    fn test_patch_mismatch_leaves_annotation_unchanged() {
        let mut annotation = Annotation::new(NewAnnotation {
            page_number: 2,
            position: PageCoordinate::new(1.0, 2.0),
            kind: AnnotationKind::new_for_tool(AnnotationTool::Highlight, Color::BLUE, None),
        });
        let before = annotation.clone();

        assert!(!annotation.apply_patch(AnnotationPatch::Content("nope".to_owned())));
        assert_eq!(annotation, before);
    }

    #[test]
    fn test_page_number_is_at_least_one() {
        let annotation = Annotation::new(NewAnnotation {
            page_number: 0,
            position: PageCoordinate::new(0.0, 0.0),
            kind: AnnotationKind::Signature { image: None },
        });
        assert_eq!(annotation.page_number(), 1);
    }

    #[test]
    fn test_serialized_shape_is_tagged_by_type() {
        let mut annotation = comment_at(4.0, 5.0);
        assert!(annotation.apply_patch(AnnotationPatch::Content("Please sign here".to_owned())));

        let value = serde_json::to_value(&annotation).expect("annotation should serialize");
        assert_eq!(value["type"], "comment");
        assert_eq!(value["content"], "Please sign here");
        assert_eq!(value["page_number"], 1);

        let back: Annotation = serde_json::from_value(value).expect("annotation should parse");
        assert_eq!(back, annotation);
    }
}
