//! Rasterize overlays onto a rendered page

use image::imageops::{self, FilterType};
use image::Rgba;
use pdf_engine::RgbaImage;
use pdf_signer_core::signature::decode_data_url;
use pdf_signer_core::{Color, Overlay, OverlayPrimitive, ScreenRect};

/// Glyph drawn inside markers of comments that have text
const MARKER_GLYPH: Color = Color::rgb(0x33, 0x33, 0x33);

/// Paint `overlays` in order; later overlays land on top
///
/// Overlay coordinates are page-relative pixels at the same scale the page
/// was rendered at. Delete handles are interactive only and are not drawn.
pub fn composite_overlays(page: &mut RgbaImage, overlays: &[Overlay]) {
    for overlay in overlays {
        match &overlay.primitive {
            OverlayPrimitive::Fill { color, opacity } => {
                fill_rect(page, &overlay.bounds, *color, *opacity);
            }
            OverlayPrimitive::Bar { color } => fill_rect(page, &overlay.bounds, *color, 1.0),
            OverlayPrimitive::CommentMarker { color, has_content, .. } => {
                fill_rect(page, &overlay.bounds, *color, 1.0);
                if *has_content {
                    let b = overlay.bounds;
                    let inset = b.width / 4.0;
                    let glyph = ScreenRect::new(
                        b.left + inset,
                        b.top + inset,
                        b.width - 2.0 * inset,
                        b.height - 2.0 * inset,
                    );
                    fill_rect(page, &glyph, MARKER_GLYPH, 1.0);
                }
            }
            OverlayPrimitive::Image { data_url } => match decode_data_url(data_url) {
                Some(signature) => draw_image(page, &overlay.bounds, &signature),
                None => log::warn!("skipping undecodable signature {}", overlay.annotation_id),
            },
        }
    }
}

/// Pixel range covered by `rect`, clipped to the page
fn pixel_span(page: &RgbaImage, rect: &ScreenRect) -> Option<(u32, u32, u32, u32)> {
    let x0 = rect.left.round().max(0.0);
    let y0 = rect.top.round().max(0.0);
    let x1 = rect.right().round().min(page.width() as f32);
    let y1 = rect.bottom().round().min(page.height() as f32);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
}

fn fill_rect(page: &mut RgbaImage, rect: &ScreenRect, color: Color, opacity: f32) {
    let Some((x0, y0, x1, y1)) = pixel_span(page, rect) else {
        return;
    };
    let alpha = (color.a as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    for y in y0..y1 {
        for x in x0..x1 {
            let pixel = page.get_pixel_mut(x, y);
            blend(pixel, [color.r, color.g, color.b], alpha);
        }
    }
}

fn draw_image(page: &mut RgbaImage, rect: &ScreenRect, source: &RgbaImage) {
    let width = rect.width.round() as u32;
    let height = rect.height.round() as u32;
    if width == 0 || height == 0 {
        return;
    }
    let scaled = imageops::resize(source, width, height, FilterType::Triangle);

    let left = rect.left.round() as i64;
    let top = rect.top.round() as i64;
    for (sx, sy, src) in scaled.enumerate_pixels() {
        let x = left + sx as i64;
        let y = top + sy as i64;
        if x < 0 || y < 0 || x >= page.width() as i64 || y >= page.height() as i64 {
            continue;
        }
        let alpha = src[3] as f32 / 255.0;
        if alpha > 0.0 {
            blend(page.get_pixel_mut(x as u32, y as u32), [src[0], src[1], src[2]], alpha);
        }
    }
}

fn blend(dst: &mut Rgba<u8>, src: [u8; 3], alpha: f32) {
    for channel in 0..3 {
        let mixed = src[channel] as f32 * alpha + dst[channel] as f32 * (1.0 - alpha);
        dst[channel] = mixed.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = 255;
}
