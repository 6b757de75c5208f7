//! Angled placement: rotation onto an expanded canvas followed by a uniform
//! shrink. A 2-D stand-in for depth, with no shear or projection.

use resvg::tiny_skia::{FilterQuality, PixmapPaint, Transform};

use crate::asset::{ImageAsset, SizePx};
use crate::error::ComposeResult;
use crate::geometry;
use crate::raster;

/// Bounding box of a `size` rectangle rotated by `angle` degrees.
pub fn rotated_bounds(size: SizePx, angle: f32) -> SizePx {
    let theta = angle.to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let (w, h) = (size.width as f32, size.height as f32);
    // Trim float noise so exact right angles do not gain a pixel.
    let width = (w * cos + h * sin - 1e-3).ceil().max(1.0);
    let height = (w * sin + h * cos - 1e-3).ceil().max(1.0);
    SizePx::new(width as u32, height as u32)
}

/// Rotates `asset` by `angle` degrees, counter-clockwise for positive
/// angles. The output grows to hold the whole rotated image and the
/// uncovered area is transparent.
pub fn rotate_expanded(asset: &ImageAsset, angle: f32) -> ComposeResult<ImageAsset> {
    let source = raster::rgba_image_to_pixmap(asset.data())?;
    let bounds = rotated_bounds(asset.dimensions(), angle);
    let mut target = raster::new_pixmap(bounds.width, bounds.height)?;

    // Image space is y-down, so a visual counter-clockwise turn is a
    // negative rotation.
    let transform = Transform::from_translate(
        -(asset.width() as f32) / 2.0,
        -(asset.height() as f32) / 2.0,
    )
    .post_rotate(-angle)
    .post_translate(bounds.width as f32 / 2.0, bounds.height as f32 / 2.0);

    let paint = PixmapPaint {
        quality: FilterQuality::Bicubic,
        ..PixmapPaint::default()
    };
    target.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);

    Ok(ImageAsset::new(raster::pixmap_to_rgba_image(&target)))
}

/// Rotates by `angle` degrees, then scales uniformly by `scale`.
pub fn apply_perspective(asset: &ImageAsset, angle: f32, scale: f32) -> ComposeResult<ImageAsset> {
    let rotated = if angle == 0.0 {
        asset.clone()
    } else {
        rotate_expanded(asset, angle)?
    };
    if (scale - 1.0).abs() < f32::EPSILON {
        return Ok(rotated);
    }

    let size = rotated.dimensions();
    let scaled = SizePx::new(
        ((size.width as f32 * scale).round() as u32).max(1),
        ((size.height as f32 * scale).round() as u32).max(1),
    );
    tracing::debug!(angle, scale, from = %size, to = %scaled, "applied perspective");
    Ok(geometry::resize(&rotated, scaled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn split_image() -> ImageAsset {
        // Left half red, right half blue.
        let img = RgbaImage::from_fn(20, 10, |x, _| if x < 10 { RED } else { BLUE });
        ImageAsset::new(img)
    }

    #[test]
    fn bounds_of_right_angle_swap_axes() {
        assert_eq!(rotated_bounds(SizePx::new(20, 10), 90.0), SizePx::new(10, 20));
        assert_eq!(rotated_bounds(SizePx::new(20, 10), 0.0), SizePx::new(20, 10));
    }

    #[test]
    fn bounds_grow_for_oblique_angles() {
        let b = rotated_bounds(SizePx::new(100, 200), 12.0);
        assert!(b.width > 100 && b.height > 200);
        // |100 cos| + |200 sin| = 97.81 + 41.58
        assert_eq!(b.width, 140);
    }

    #[test]
    fn positive_angle_turns_counter_clockwise() {
        let rotated = rotate_expanded(&split_image(), 90.0).unwrap();
        assert_eq!(rotated.dimensions(), SizePx::new(10, 20));
        // The right (blue) half ends up on top.
        assert_eq!(rotated.data().get_pixel(5, 3).0, BLUE.0);
        assert_eq!(rotated.data().get_pixel(5, 16).0, RED.0);
    }

    #[test]
    fn oblique_rotation_leaves_transparent_corners() {
        let rotated = rotate_expanded(&split_image(), -12.0).unwrap();
        assert_eq!(rotated.data().get_pixel(0, 0)[3], 0);
        let (cx, cy) = (rotated.width() / 2, rotated.height() / 2);
        assert_eq!(rotated.data().get_pixel(cx, cy)[3], 255);
    }

    #[test]
    fn scale_shrinks_after_rotation() {
        let out = apply_perspective(&split_image(), 0.0, 0.5).unwrap();
        assert_eq!(out.dimensions(), SizePx::new(10, 5));

        let unchanged = apply_perspective(&split_image(), 0.0, 1.0).unwrap();
        assert_eq!(unchanged, split_image());
    }
}
