//! Synthetic device frame: padding, rounded corners and a soft drop shadow.

use image::{GrayImage, RgbaImage};
use imageproc::filter::box_filter;
use serde::{Deserialize, Serialize};

use crate::asset::{ImageAsset, SizePx};
use crate::color::{Rgb8, ShadowColor};
use crate::error::{ComposeError, ComposeResult};
use crate::raster;

/// Shape and colors of the synthetic frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct FrameSpec {
    /// Bezel width around the screenshot.
    pub padding: u32,
    pub corner_radius: u32,
    /// Extra room on each side for the shadow. The shadow sits at this
    /// offset while the frame sits at half of it.
    pub shadow_offset: u32,
    /// Approximate gaussian sigma of the shadow blur, in pixels.
    pub shadow_blur_radius: u32,
    pub frame_color: Rgb8,
    pub shadow_color: ShadowColor,
}

impl Default for FrameSpec {
    fn default() -> Self {
        Self {
            padding: 10,
            corner_radius: 60,
            shadow_offset: 40,
            shadow_blur_radius: 20,
            frame_color: Rgb8::new(20, 20, 20),
            shadow_color: ShadowColor::new(Rgb8::BLACK, 80),
        }
    }
}

/// Upper bound for each frame measurement, in pixels.
pub const MAX_FRAME_EXTENT: u32 = 4096;

impl FrameSpec {
    /// Size of the framed output for a screenshot of `inner` size.
    /// Saturates instead of wrapping; [`validate`](Self::validate) keeps
    /// real frames far from the limit.
    pub fn outer_size(&self, inner: SizePx) -> SizePx {
        let grow = self.padding.saturating_add(self.shadow_offset).saturating_mul(2);
        SizePx::new(
            inner.width.saturating_add(grow),
            inner.height.saturating_add(grow),
        )
    }

    /// Rejects measurements above [`MAX_FRAME_EXTENT`].
    pub fn validate(&self) -> ComposeResult<()> {
        let extents = [
            ("padding", self.padding),
            ("cornerRadius", self.corner_radius),
            ("shadowOffset", self.shadow_offset),
            ("shadowBlurRadius", self.shadow_blur_radius),
        ];
        match extents.into_iter().find(|(_, value)| *value > MAX_FRAME_EXTENT) {
            Some((name, value)) => Err(ComposeError::config(format!(
                "frame {name} must be at most {MAX_FRAME_EXTENT}, got {value}"
            ))),
            None => Ok(()),
        }
    }
}

/// Wraps `screenshot` in a frame described by `spec`.
///
/// Paint order: blurred shadow first, then the rounded frame carrying the
/// screenshot. The corner mask only cuts the frame so the shadow stays
/// visible outside its silhouette.
pub fn frame_screenshot(screenshot: &ImageAsset, spec: &FrameSpec) -> ComposeResult<ImageAsset> {
    spec.validate()?;
    let inner = screenshot.dimensions();
    let outer = spec.outer_size(inner);
    let frame_w = inner.width + 2 * spec.padding;
    let frame_h = inner.height + 2 * spec.padding;
    let radius = spec.corner_radius as f32;

    let mut result = RgbaImage::new(outer.width, outer.height);

    let offset = spec.shadow_offset as f32;
    let shadow_mask = raster::rounded_rect_mask(
        outer,
        offset,
        offset,
        frame_w as f32,
        frame_h as f32,
        radius,
    )?;
    let shadow_mask = blur_mask(&shadow_mask, spec.shadow_blur_radius);
    let shadow = raster::colorize_mask(&shadow_mask, spec.shadow_color.to_rgba());
    raster::composite_over(&mut result, &shadow, 0, 0);

    let mut frame = RgbaImage::from_pixel(frame_w, frame_h, spec.frame_color.to_rgba());
    raster::composite_over(
        &mut frame,
        screenshot.data(),
        i64::from(spec.padding),
        i64::from(spec.padding),
    );
    let corner_mask = raster::rounded_rect_mask(
        SizePx::new(frame_w, frame_h),
        0.0,
        0.0,
        frame_w as f32,
        frame_h as f32,
        radius,
    )?;
    raster::apply_alpha_mask(&mut frame, &corner_mask);

    let frame_at = i64::from(spec.shadow_offset / 2);
    raster::composite_over(&mut result, &frame, frame_at, frame_at);

    tracing::debug!(inner = %inner, outer = %outer, "framed screenshot");
    Ok(ImageAsset::new(result))
}

/// Approximates a gaussian blur of standard deviation `sigma` with three
/// box-filter passes.
fn blur_mask(mask: &GrayImage, sigma: u32) -> GrayImage {
    if sigma == 0 {
        return mask.clone();
    }
    let sigma = f64::from(sigma);
    let radius = (((4.0 * sigma * sigma + 1.0).sqrt() - 1.0) / 2.0).round().max(1.0) as u32;
    let mut blurred = box_filter(mask, radius, radius);
    for _ in 0..2 {
        blurred = box_filter(&blurred, radius, radius);
    }
    blurred
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba};

    fn screenshot(w: u32, h: u32) -> ImageAsset {
        ImageAsset::new(RgbaImage::from_pixel(w, h, Rgba([200, 40, 40, 255])))
    }

    #[test]
    fn output_grows_by_padding_and_shadow() {
        let spec = FrameSpec::default();
        let framed = frame_screenshot(&screenshot(200, 400), &spec).unwrap();
        assert_eq!(framed.dimensions(), SizePx::new(300, 500));
        assert!(framed.has_alpha());
    }

    #[test]
    fn screenshot_sits_inside_the_bezel() {
        let spec = FrameSpec::default();
        let framed = frame_screenshot(&screenshot(200, 400), &spec).unwrap();
        // Frame origin is shadow_offset / 2 = 20; screenshot starts 10 px further in.
        assert_eq!(framed.data().get_pixel(130, 250).0, [200, 40, 40, 255]);
        let bezel = framed.data().get_pixel(25, 250);
        assert_eq!(bezel.0, [20, 20, 20, 255]);
    }

    #[test]
    fn corners_are_transparent_and_shadow_shows_outside_frame() {
        let spec = FrameSpec::default();
        let framed = frame_screenshot(&screenshot(200, 400), &spec).unwrap();
        let data = framed.data();

        assert_eq!(data.get_pixel(0, 0)[3], 0);
        // Below the frame's bottom edge (20 + 420 = 440) the shadow remains.
        let below = data.get_pixel(150, 450);
        assert!(below[3] > 0 && below[3] <= 80);
        assert_eq!(&below.0[..3], &[0, 0, 0]);
    }

    #[test]
    fn zero_radius_keeps_square_corners() {
        let spec = FrameSpec {
            corner_radius: 0,
            shadow_offset: 0,
            shadow_blur_radius: 0,
            ..FrameSpec::default()
        };
        let framed = frame_screenshot(&screenshot(10, 10), &spec).unwrap();
        assert_eq!(framed.dimensions(), SizePx::new(30, 30));
        assert_eq!(framed.data().get_pixel(0, 0).0, [20, 20, 20, 255]);
    }

    #[test]
    fn oversized_frames_fail_instead_of_overflowing() {
        let spec = FrameSpec {
            padding: 4_000_000_000,
            shadow_offset: 4_000_000_000,
            ..FrameSpec::default()
        };
        assert_eq!(
            spec.outer_size(SizePx::new(10, 10)),
            SizePx::new(u32::MAX, u32::MAX)
        );
        let err = frame_screenshot(&screenshot(10, 10), &spec).unwrap_err();
        assert!(matches!(err, ComposeError::Config { .. }));
        assert!(FrameSpec::default().validate().is_ok());
    }

    #[test]
    fn blur_spreads_coverage() {
        let mut mask = GrayImage::new(41, 1);
        mask.put_pixel(20, 0, Luma([255]));
        let blurred = blur_mask(&mask, 3);
        assert!(blurred.get_pixel(20, 0)[0] < 255);
        assert!(blurred.get_pixel(23, 0)[0] > 0);
        assert_eq!(blur_mask(&mask, 0), mask);
    }

    #[test]
    fn spec_deserializes_with_defaults() {
        let spec: FrameSpec = serde_json::from_str(r#"{"cornerRadius": 12}"#).unwrap();
        assert_eq!(spec.corner_radius, 12);
        assert_eq!(spec.padding, 10);
    }
}
