//! Freehand signature capture
//!
//! Strokes are recorded as polylines in pad pixels and rasterized on export
//! into a transparent PNG wrapped in a `data:` URL.

use crate::annotation::{Color, SignatureImage};
use crate::config::SignaturePadConfig;
use crate::geometry::{ScreenPoint, ScreenRect};
use base64::Engine;
use image::{ImageBuffer, ImageFormat, Rgba};
use std::io::Cursor;

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// One continuous pen-down gesture
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stroke {
    pub points: Vec<ScreenPoint>,
}

/// Drawing surface for capturing a signature
#[derive(Debug, Clone)]
pub struct SignaturePad {
    width: u32,
    height: u32,
    pen_color: Color,
    pen_width: f32,
    strokes: Vec<Stroke>,
    drawing: bool,
}

impl SignaturePad {
    pub fn new(config: &SignaturePadConfig) -> Self {
        Self {
            width: config.width.max(1),
            height: config.height.max(1),
            pen_color: config.pen_color,
            pen_width: config.pen_width.max(0.5),
            strokes: Vec::new(),
            drawing: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Put the pen down at `point`
    pub fn begin_stroke(&mut self, point: ScreenPoint) {
        self.strokes.push(Stroke { points: vec![point] });
        self.drawing = true;
    }

    /// Drag the pen to `point`; ignored while the pen is up
    pub fn extend_stroke(&mut self, point: ScreenPoint) {
        if !self.drawing {
            return;
        }
        if let Some(stroke) = self.strokes.last_mut() {
            stroke.points.push(point);
        }
    }

    /// Lift the pen
    pub fn end_stroke(&mut self) {
        self.drawing = false;
    }

    /// Erase everything drawn so far
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.drawing = false;
    }

    /// True when nothing has been drawn
    pub fn is_empty(&self) -> bool {
        self.strokes.iter().all(|stroke| stroke.points.is_empty())
    }

    /// Rasterize the strokes onto a transparent surface of the pad's size
    pub fn rasterize(&self) -> RgbaImage {
        let mut image = RgbaImage::new(self.width, self.height);
        let radius = self.pen_width / 2.0;
        let pen = Rgba([self.pen_color.r, self.pen_color.g, self.pen_color.b, self.pen_color.a]);
        // Stamps centred further out than this cannot touch the surface
        let bounds = ScreenRect::new(
            -radius - 1.0,
            -radius - 1.0,
            self.width as f32 + 2.0 * (radius + 1.0),
            self.height as f32 + 2.0 * (radius + 1.0),
        );

        for stroke in &self.strokes {
            let mut points = stroke.points.iter();
            let Some(first) = points.next() else {
                continue;
            };
            stamp(&mut image, *first, radius, pen);

            let mut previous = *first;
            for &point in points {
                if let Some((from, to)) = clip_segment(previous, point, &bounds) {
                    draw_segment(&mut image, from, to, radius, pen);
                }
                previous = point;
            }
        }

        image
    }

    /// Encode the drawing as a PNG data URL
    ///
    /// An empty pad exports a blank (fully transparent) image.
    pub fn export_image(&self) -> Result<SignatureImage, image::ImageError> {
        let image = self.rasterize();
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        let encoded = base64::engine::general_purpose::STANDARD.encode(&png);
        Ok(SignatureImage {
            data_url: format!("{DATA_URL_PREFIX}{encoded}"),
            width: self.width,
            height: self.height,
        })
    }
}

/// Where placement takes a signature image from
pub trait SignatureSource {
    /// True when there is nothing to place
    fn is_empty(&self) -> bool;
    fn export_image(&self) -> Result<SignatureImage, image::ImageError>;
}

impl SignatureSource for SignaturePad {
    fn is_empty(&self) -> bool {
        SignaturePad::is_empty(self)
    }

    fn export_image(&self) -> Result<SignatureImage, image::ImageError> {
        SignaturePad::export_image(self)
    }
}

/// Decode a PNG data URL produced by [`SignaturePad::export_image`]
pub fn decode_data_url(data_url: &str) -> Option<RgbaImage> {
    let payload = data_url.strip_prefix(DATA_URL_PREFIX)?;
    let bytes = base64::engine::general_purpose::STANDARD.decode(payload.trim()).ok()?;
    let image = image::load_from_memory_with_format(&bytes, ImageFormat::Png).ok()?;
    Some(image.to_rgba8())
}

/// Stamp disks every half pixel from `from` to `to`
fn draw_segment(
    image: &mut RgbaImage,
    from: ScreenPoint,
    to: ScreenPoint,
    radius: f32,
    color: Rgba<u8>,
) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let steps = ((dx * dx + dy * dy).sqrt() / 0.5).ceil().max(1.0) as u32;
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        stamp(image, ScreenPoint::new(from.x + dx * t, from.y + dy * t), radius, color);
    }
}

/// The part of segment `a`-`b` inside `bounds` (Liang-Barsky)
///
/// `None` when the segment misses the rectangle or has a non-finite end.
fn clip_segment(
    a: ScreenPoint,
    b: ScreenPoint,
    bounds: &ScreenRect,
) -> Option<(ScreenPoint, ScreenPoint)> {
    if !(a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite()) {
        return None;
    }
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mut t0 = 0.0_f32;
    let mut t1 = 1.0_f32;
    let edges = [
        (-dx, a.x - bounds.left),
        (dx, bounds.right() - a.x),
        (-dy, a.y - bounds.top),
        (dy, bounds.bottom() - a.y),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f32| ScreenPoint::new(a.x + dx * t, a.y + dy * t);
    Some((at(t0), at(t1)))
}

/// Fill a disk of `radius` around `center`, clipped to the surface
fn stamp(image: &mut RgbaImage, center: ScreenPoint, radius: f32, color: Rgba<u8>) {
    let min_x = (center.x - radius).floor().max(0.0) as u32;
    let min_y = (center.y - radius).floor().max(0.0) as u32;
    let max_x = (center.x + radius).ceil().min(image.width() as f32 - 1.0);
    let max_y = (center.y + radius).ceil().min(image.height() as f32 - 1.0);
    if max_x < 0.0 || max_y < 0.0 {
        return;
    }

    let radius_sq = radius * radius;
    for y in min_y..=max_y as u32 {
        for x in min_x..=max_x as u32 {
            let px = x as f32 + 0.5 - center.x;
            let py = y as f32 + 0.5 - center.y;
            if px * px + py * py <= radius_sq {
                image.put_pixel(x, y, color);
            }
        }
    }
}
