//! Aspect-preserving size computation and resampling.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::asset::{ImageAsset, SizePx};

/// Ceiling for a scaled screenshot, as fractions of the canvas dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ScaleSpec {
    pub max_width_ratio: f64,
    pub max_height_ratio: f64,
}

impl ScaleSpec {
    pub const fn new(max_width_ratio: f64, max_height_ratio: f64) -> Self {
        Self {
            max_width_ratio,
            max_height_ratio,
        }
    }
}

/// Computes the target size of a `source` image placed on `canvas`.
///
/// Width is sized first (`canvas.width * max_width_ratio`); only when the
/// resulting height overflows `canvas.height * max_height_ratio` is the
/// height pinned to its budget and the width derived from it. Both
/// dimensions are floored and never drop below one pixel.
pub fn fit_size(source: SizePx, canvas: SizePx, spec: ScaleSpec) -> SizePx {
    if source.is_empty() {
        return SizePx::new(1, 1);
    }
    let aspect = f64::from(source.height) / f64::from(source.width);
    let height_budget = f64::from(canvas.height) * spec.max_height_ratio;

    let mut width = (f64::from(canvas.width) * spec.max_width_ratio).floor();
    let mut height = (width * aspect).floor();

    if height > height_budget {
        height = height_budget.floor();
        width = (height / aspect).floor();
    }

    SizePx::new((width as u32).max(1), (height as u32).max(1))
}

/// Resamples an asset to exactly `size` with a Lanczos filter.
pub fn resize(asset: &ImageAsset, size: SizePx) -> ImageAsset {
    if asset.dimensions() == size {
        return asset.clone();
    }
    let data = imageops::resize(asset.data(), size.width, size.height, FilterType::Lanczos3);
    ImageAsset::new(data)
}

/// Scales `asset` for `canvas` according to `spec`.
pub fn scale_to_fit(asset: &ImageAsset, canvas: SizePx, spec: ScaleSpec) -> ImageAsset {
    let target = fit_size(asset.dimensions(), canvas, spec);
    tracing::debug!(from = %asset.dimensions(), to = %target, "scaled screenshot");
    resize(asset, target)
}

/// Scales `image` so that it covers `target` completely, then crops the
/// overflow around the centre. The result is opaque and exactly `target`
/// in size; any uncovered margin is padded with black.
pub fn cover_fit(image: &RgbaImage, target: SizePx) -> RgbaImage {
    let mut out = RgbaImage::from_pixel(target.width, target.height, Rgba([0, 0, 0, 255]));
    if image.width() == 0 || image.height() == 0 || target.is_empty() {
        return out;
    }

    let scale = (f64::from(target.width) / f64::from(image.width()))
        .max(f64::from(target.height) / f64::from(image.height()));
    let width = ((f64::from(image.width()) * scale).round() as u32).max(1);
    let height = ((f64::from(image.height()) * scale).round() as u32).max(1);

    let mut scaled = imageops::resize(image, width, height, FilterType::Lanczos3);
    for px in scaled.pixels_mut() {
        px[3] = 255;
    }

    // Negative offsets crop, positive ones pad.
    let x = (i64::from(target.width) - i64::from(width)) / 2;
    let y = (i64::from(target.height) - i64::from(height)) / 2;
    imageops::replace(&mut out, &scaled, x, y);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CANVAS: SizePx = SizePx::new(1290, 2796);

    #[test]
    fn width_first_for_tall_screenshots() {
        let size = fit_size(SizePx::new(1179, 2556), CANVAS, ScaleSpec::new(0.8, 0.85));
        assert_eq!(size.width, 1032);
        assert_eq!(size.height, 2237);
    }

    #[test]
    fn falls_back_to_height_budget() {
        // 1032 wide would need 2237 rows; only 1957 are allowed.
        let size = fit_size(SizePx::new(1179, 2556), CANVAS, ScaleSpec::new(0.8, 0.7));
        assert_eq!(size.height, 1957);
        assert_eq!(size.width, 902);
    }

    #[test]
    fn degenerate_source_is_clamped() {
        assert_eq!(
            fit_size(SizePx::new(0, 10), CANVAS, ScaleSpec::new(0.5, 0.5)),
            SizePx::new(1, 1)
        );
    }

    #[test]
    fn cover_fit_crops_wide_images() {
        let mut image = RgbaImage::from_pixel(400, 100, Rgba([255, 0, 0, 255]));
        for y in 0..100 {
            for x in 180..220 {
                image.put_pixel(x, y, Rgba([0, 255, 0, 255]));
            }
        }
        let out = cover_fit(&image, SizePx::new(100, 100));
        assert_eq!(out.dimensions(), (100, 100));
        assert_eq!(out.get_pixel(50, 50)[1], 255);
        assert_eq!(out.get_pixel(1, 50)[0], 255);
    }

    #[test]
    fn cover_fit_is_opaque() {
        let image = RgbaImage::from_pixel(10, 10, Rgba([10, 20, 30, 0]));
        let out = cover_fit(&image, SizePx::new(33, 17));
        assert!(out.pixels().all(|p| p[3] == 255));
    }

    proptest! {
        #[test]
        fn fit_respects_budgets_and_aspect(
            w in 50u32..4000,
            h in 50u32..4000,
            wr in 0.1f64..1.0,
            hr in 0.1f64..1.0,
        ) {
            let size = fit_size(SizePx::new(w, h), CANVAS, ScaleSpec::new(wr, hr));
            prop_assert!(f64::from(size.width) <= f64::from(CANVAS.width) * wr + 1e-9 || size.width == 1);
            prop_assert!(f64::from(size.height) <= f64::from(CANVAS.height) * hr + 1e-9 || size.height == 1);

            // Aspect is preserved up to one pixel of rounding on the derived side.
            let expected_h = f64::from(size.width) * f64::from(h) / f64::from(w);
            let expected_w = f64::from(size.height) * f64::from(w) / f64::from(h);
            prop_assert!(
                (expected_h - f64::from(size.height)).abs() <= 1.0
                    || (expected_w - f64::from(size.width)).abs() <= 1.0
            );
        }

        #[test]
        fn cover_fit_always_matches_target(
            w in 1u32..64,
            h in 1u32..64,
            tw in 1u32..64,
            th in 1u32..64,
        ) {
            let image = RgbaImage::from_pixel(w, h, Rgba([1, 2, 3, 255]));
            let out = cover_fit(&image, SizePx::new(tw, th));
            prop_assert_eq!(out.dimensions(), (tw, th));
        }
    }
}
