//! Low-level raster helpers shared by the frame, perspective and text code.
//!
//! Vector shapes (rounded rectangles) and affine resampling go through
//! `tiny_skia`, which `resvg` re-exports; everything else operates directly
//! on `image` buffers.

use image::{GrayImage, Luma, Rgba, RgbaImage};
use resvg::tiny_skia::{FillRule, IntSize, Paint, PathBuilder, Pixmap, Rect, Transform};
use resvg::usvg::{Options, Tree};

use crate::asset::SizePx;
use crate::error::{ComposeError, ComposeResult};

// ============================================================================
// SVG Rendering
// ============================================================================

/// Renders an SVG document to an RGBA image.
///
/// With `target` set, the document is scaled to fit within it while
/// preserving aspect ratio; otherwise it renders at its intrinsic size.
///
/// Returns `None` if the SVG cannot be parsed or rendered.
pub fn render_svg(svg_data: &str, target: Option<SizePx>) -> Option<RgbaImage> {
    let opts = Options::default();
    let tree = Tree::from_str(svg_data, &opts).ok()?;

    let svg_size = tree.size();
    let scale = match target {
        Some(size) => (size.width as f32 / svg_size.width())
            .min(size.height as f32 / svg_size.height()),
        None => 1.0,
    };
    let width = (svg_size.width() * scale).ceil() as u32;
    let height = (svg_size.height() * scale).ceil() as u32;

    let mut pixmap = Pixmap::new(width, height)?;
    let transform = Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    Some(pixmap_to_rgba_image(&pixmap))
}

// ============================================================================
// Pixmap Conversion
// ============================================================================

/// Converts a tiny_skia Pixmap to an image::RgbaImage.
pub fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut data = pixmap.data().to_vec();
    // tiny_skia stores premultiplied alpha
    for px in data.chunks_exact_mut(4) {
        let (r, g, b, a) = unpremultiply(px[0], px[1], px[2], px[3]);
        px.copy_from_slice(&[r, g, b, a]);
    }
    // Length is width * height * 4 by construction.
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .unwrap_or_else(|| RgbaImage::new(pixmap.width(), pixmap.height()))
}

/// Converts an RGBA image to a premultiplied tiny_skia Pixmap.
pub fn rgba_image_to_pixmap(image: &RgbaImage) -> ComposeResult<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())
        .ok_or_else(|| ComposeError::composition("cannot convert an empty image to a pixmap"))?;
    let mut data = image.as_raw().clone();
    premultiply_in_place(&mut data);
    Pixmap::from_vec(data, size)
        .ok_or_else(|| ComposeError::composition("pixmap buffer size mismatch"))
}

/// Allocates a transparent pixmap.
pub fn new_pixmap(width: u32, height: u32) -> ComposeResult<Pixmap> {
    Pixmap::new(width, height).ok_or_else(|| {
        ComposeError::composition(format!("cannot allocate a {width}x{height} pixel buffer"))
    })
}

fn premultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
}

/// Unpremultiplies a premultiplied alpha pixel.
fn unpremultiply(r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8, u8) {
    match a {
        0 => (0, 0, 0, 0),
        255 => (r, g, b, a),
        _ => {
            let a_f = a as f32 / 255.0;
            (
                (r as f32 / a_f).round().min(255.0) as u8,
                (g as f32 / a_f).round().min(255.0) as u8,
                (b as f32 / a_f).round().min(255.0) as u8,
                a,
            )
        }
    }
}

// ============================================================================
// Shapes
// ============================================================================

/// Rasterizes an anti-aliased rounded rectangle into a coverage mask of
/// `size`. The rectangle spans `[x, x + width) x [y, y + height)` and the
/// radius is clamped to half of the shorter side.
pub fn rounded_rect_mask(
    size: SizePx,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    radius: f32,
) -> ComposeResult<GrayImage> {
    let mut pixmap = new_pixmap(size.width, size.height)?;
    let radius = radius.max(0.0).min(width / 2.0).min(height / 2.0);

    let path = if radius <= 0.0 {
        Rect::from_xywh(x, y, width, height).map(PathBuilder::from_rect)
    } else {
        // Cubic approximation of a quarter circle.
        let k = 0.552_284_8 * radius;
        let (r, b) = (x + width, y + height);
        let mut pb = PathBuilder::new();
        pb.move_to(x + radius, y);
        pb.line_to(r - radius, y);
        pb.cubic_to(r - radius + k, y, r, y + radius - k, r, y + radius);
        pb.line_to(r, b - radius);
        pb.cubic_to(r, b - radius + k, r - radius + k, b, r - radius, b);
        pb.line_to(x + radius, b);
        pb.cubic_to(x + radius - k, b, x, b - radius + k, x, b - radius);
        pb.line_to(x, y + radius);
        pb.cubic_to(x, y + radius - k, x + radius - k, y, x + radius, y);
        pb.close();
        pb.finish()
    };
    let path = path.ok_or_else(|| ComposeError::composition("degenerate rounded rectangle"))?;

    let mut paint = Paint::default();
    paint.set_color_rgba8(255, 255, 255, 255);
    paint.anti_alias = true;
    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);

    let coverage: Vec<u8> = pixmap.data().chunks_exact(4).map(|px| px[3]).collect();
    GrayImage::from_raw(size.width, size.height, coverage)
        .ok_or_else(|| ComposeError::composition("mask buffer size mismatch"))
}

/// Multiplies the alpha channel of `image` by `mask` (same dimensions).
pub fn apply_alpha_mask(image: &mut RgbaImage, mask: &GrayImage) {
    for (px, m) in image.pixels_mut().zip(mask.pixels()) {
        px[3] = ((u16::from(px[3]) * u16::from(m[0]) + 127) / 255) as u8;
    }
}

/// Turns a coverage mask into a solid-color image whose alpha is the
/// coverage scaled by `color`'s alpha.
pub fn colorize_mask(mask: &GrayImage, color: Rgba<u8>) -> RgbaImage {
    let mut out = RgbaImage::new(mask.width(), mask.height());
    for (px, Luma([m])) in out.pixels_mut().zip(mask.pixels()) {
        let a = ((u16::from(*m) * u16::from(color[3]) + 127) / 255) as u8;
        *px = Rgba([color[0], color[1], color[2], a]);
    }
    out
}

// ============================================================================
// Compositing
// ============================================================================

/// Composites a source image onto a destination image at the specified position.
///
/// Uses standard alpha blending (source over destination). Parts of `src`
/// outside `dest` are clipped.
pub fn composite_over(dest: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
    let Some((xs, ys)) = clip_ranges(dest, src.width(), src.height(), x, y) else {
        return;
    };

    for sy in ys {
        for sx in xs.clone() {
            let src_pixel = *src.get_pixel(sx, sy);
            if src_pixel[3] == 0 {
                continue;
            }
            let dx = (x + i64::from(sx)) as u32;
            let dy = (y + i64::from(sy)) as u32;
            let dst_pixel = dest.get_pixel_mut(dx, dy);
            *dst_pixel = alpha_blend(src_pixel, *dst_pixel);
        }
    }
}

/// Blends `color` onto `dest` wherever `mask` has coverage, with the mask's
/// top-left corner at `(x, y)`.
pub fn blend_mask(dest: &mut RgbaImage, mask: &GrayImage, x: i64, y: i64, color: Rgba<u8>) {
    let Some((xs, ys)) = clip_ranges(dest, mask.width(), mask.height(), x, y) else {
        return;
    };

    for my in ys {
        for mx in xs.clone() {
            let coverage = mask.get_pixel(mx, my)[0];
            if coverage == 0 {
                continue;
            }
            let a = ((u16::from(coverage) * u16::from(color[3]) + 127) / 255) as u8;
            let dx = (x + i64::from(mx)) as u32;
            let dy = (y + i64::from(my)) as u32;
            let dst_pixel = dest.get_pixel_mut(dx, dy);
            *dst_pixel = alpha_blend(Rgba([color[0], color[1], color[2], a]), *dst_pixel);
        }
    }
}

type Span = std::ops::Range<u32>;

/// Source-space ranges of a `width x height` image placed at `(x, y)` that
/// land inside `dest`.
fn clip_ranges(dest: &RgbaImage, width: u32, height: u32, x: i64, y: i64) -> Option<(Span, Span)> {
    let x0 = (-x).clamp(0, i64::from(width));
    let y0 = (-y).clamp(0, i64::from(height));
    let x1 = (i64::from(dest.width()) - x).clamp(0, i64::from(width));
    let y1 = (i64::from(dest.height()) - y).clamp(0, i64::from(height));
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some((x0 as u32..x1 as u32, y0 as u32..y1 as u32))
}

/// Alpha blends two RGBA pixels (source over destination).
fn alpha_blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    if src[3] == 255 {
        return src;
    }

    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;

    // Source over compositing
    let out_a = sa + da * (1.0 - sa);

    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |s: u8, d: u8| -> u8 {
        let sf = s as f32 / 255.0;
        let df = d as f32 / 255.0;
        let out = (sf * sa + df * da * (1.0 - sa)) / out_a;
        (out * 255.0).round() as u8
    };

    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50"><rect width="100" height="50" fill="#ff0000"/></svg>"##;

    #[test]
    fn render_svg_fits_target() {
        let img = render_svg(SIMPLE_SVG, Some(SizePx::new(40, 40))).unwrap();
        assert_eq!((img.width(), img.height()), (40, 20));
        assert_eq!(img.get_pixel(20, 10).0, [255, 0, 0, 255]);

        let intrinsic = render_svg(SIMPLE_SVG, None).unwrap();
        assert_eq!((intrinsic.width(), intrinsic.height()), (100, 50));
        assert!(render_svg("<svg", None).is_none());
    }

    #[test]
    fn pixmap_roundtrip_preserves_straight_alpha() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([200, 100, 50, 128]));
        let pixmap = rgba_image_to_pixmap(&img).unwrap();
        let back = pixmap_to_rgba_image(&pixmap);
        for (a, b) in img.pixels().zip(back.pixels()) {
            for c in 0..4 {
                assert!((i16::from(a[c]) - i16::from(b[c])).abs() <= 2);
            }
        }
    }

    #[test]
    fn rounded_mask_clears_corners() {
        let mask = rounded_rect_mask(SizePx::new(100, 80), 0.0, 0.0, 100.0, 80.0, 30.0).unwrap();
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.get_pixel(99, 79)[0], 0);
        assert_eq!(mask.get_pixel(50, 40)[0], 255);
        assert_eq!(mask.get_pixel(50, 0)[0], 255);
    }

    #[test]
    fn zero_radius_mask_is_a_rectangle() {
        let mask = rounded_rect_mask(SizePx::new(10, 10), 2.0, 2.0, 6.0, 6.0, 0.0).unwrap();
        assert_eq!(mask.get_pixel(2, 2)[0], 255);
        assert_eq!(mask.get_pixel(1, 1)[0], 0);
        assert_eq!(mask.get_pixel(8, 8)[0], 0);
    }

    #[test]
    fn composite_simple() {
        let mut dest = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));

        composite_over(&mut dest, &src, 3, 3);

        assert_eq!(dest.get_pixel(5, 5).0, [0, 0, 255, 255]);
        assert_eq!(dest.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn composite_clips_negative_offsets() {
        let mut dest = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));

        composite_over(&mut dest, &src, -2, -3);
        assert_eq!(dest.get_pixel(1, 0).0, [255, 255, 255, 255]);
        assert_eq!(dest.get_pixel(2, 0).0, [0, 0, 0, 255]);
        assert_eq!(dest.get_pixel(0, 1).0, [0, 0, 0, 255]);

        composite_over(&mut dest, &src, 10, 10);
        composite_over(&mut dest, &src, -10, 0);
    }

    #[test]
    fn composite_with_transparency() {
        let mut dest = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 128]));

        composite_over(&mut dest, &src, 0, 0);

        let pixel = dest.get_pixel(0, 0);
        assert!(pixel[0] > 0, "Should have some red");
        assert!(pixel[2] > 0, "Should have some blue");
        assert_eq!(pixel[3], 255);
    }

    #[test]
    fn blend_mask_scales_by_coverage() {
        let mut dest = RgbaImage::from_pixel(3, 1, Rgba([255, 255, 255, 255]));
        let mut mask = GrayImage::new(3, 1);
        mask.put_pixel(1, 0, Luma([255]));
        mask.put_pixel(2, 0, Luma([128]));

        blend_mask(&mut dest, &mask, 0, 0, Rgba([0, 0, 0, 255]));
        assert_eq!(dest.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(dest.get_pixel(1, 0).0, [0, 0, 0, 255]);
        let half = dest.get_pixel(2, 0)[0];
        assert!((120..=135).contains(&half));
    }

    #[test]
    fn colorize_mask_combines_alphas() {
        let mask = GrayImage::from_pixel(1, 1, Luma([255]));
        let out = colorize_mask(&mask, Rgba([0, 0, 0, 80]));
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 80]);
    }
}
