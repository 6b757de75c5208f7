//! Background synthesis: solid fills, two-stop linear gradients, and
//! cover-fit images.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::asset::{ImageAsset, SizePx};
use crate::canvas::Canvas;
use crate::color::Rgb8;
use crate::error::ComposeResult;
use crate::geometry;

/// Axis along which a gradient runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum GradientDirection {
    /// Top (start) to bottom (end).
    #[default]
    Vertical,
    /// Left (start) to right (end).
    Horizontal,
}

/// A two-color linear gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct GradientSpec {
    pub start: Rgb8,
    pub end: Rgb8,
    #[serde(default)]
    pub direction: GradientDirection,
}

impl GradientSpec {
    pub fn new(start: Rgb8, end: Rgb8, direction: GradientDirection) -> Self {
        Self {
            start,
            end,
            direction,
        }
    }

    /// Color at step `index` out of `steps`. The first step is `start` and
    /// the last one is `end`.
    pub fn color_at(&self, index: u32, steps: u32) -> Rgb8 {
        let t = if steps > 1 {
            index as f32 / (steps - 1) as f32
        } else {
            0.0
        };
        self.start.lerp(self.end, t)
    }
}

impl Default for GradientSpec {
    fn default() -> Self {
        Self::new(
            Rgb8::new(74, 144, 226),
            Rgb8::new(155, 89, 182),
            GradientDirection::Vertical,
        )
    }
}

/// What to paint beneath everything else.
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundSpec {
    Solid(Rgb8),
    Gradient(GradientSpec),
    /// Scaled to cover the canvas and center-cropped.
    Image(ImageAsset),
}

impl Default for BackgroundSpec {
    fn default() -> Self {
        Self::Solid(Rgb8::WHITE)
    }
}

/// Produces an opaque canvas of exactly `size`.
pub fn generate(size: SizePx, spec: &BackgroundSpec) -> ComposeResult<Canvas> {
    match spec {
        BackgroundSpec::Solid(color) => Canvas::filled(size, *color),
        BackgroundSpec::Gradient(gradient) => Canvas::from_image(render_gradient(size, gradient)),
        BackgroundSpec::Image(asset) => {
            Canvas::from_image(geometry::cover_fit(asset.data(), size))
        }
    }
}

fn render_gradient(size: SizePx, spec: &GradientSpec) -> RgbaImage {
    let mut image = RgbaImage::new(size.width, size.height);
    match spec.direction {
        GradientDirection::Vertical => {
            for y in 0..size.height {
                let px = spec.color_at(y, size.height).to_rgba();
                for x in 0..size.width {
                    image.put_pixel(x, y, px);
                }
            }
        }
        GradientDirection::Horizontal => {
            let columns: Vec<_> = (0..size.width)
                .map(|x| spec.color_at(x, size.width).to_rgba())
                .collect();
            for (x, _, px) in image.enumerate_pixels_mut() {
                *px = columns[x as usize];
            }
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rgb(canvas: &Canvas, x: u32, y: u32) -> [u8; 3] {
        let p = canvas.pixel(x, y);
        [p[0], p[1], p[2]]
    }

    #[test]
    fn solid_fills_every_pixel() {
        let canvas = generate(SizePx::new(5, 4), &BackgroundSpec::Solid(Rgb8::new(9, 9, 9))).unwrap();
        assert!(canvas.image().pixels().all(|p| p.0 == [9, 9, 9, 255]));
    }

    #[test]
    fn horizontal_gradient_runs_left_to_right() {
        let spec = GradientSpec::new(Rgb8::BLACK, Rgb8::WHITE, GradientDirection::Horizontal);
        let canvas = generate(SizePx::new(11, 3), &BackgroundSpec::Gradient(spec)).unwrap();
        assert_eq!(rgb(&canvas, 0, 2), [0, 0, 0]);
        assert_eq!(rgb(&canvas, 10, 0), [255, 255, 255]);
        // Columns are uniform.
        assert_eq!(rgb(&canvas, 5, 0), rgb(&canvas, 5, 2));
    }

    #[test]
    fn single_row_gradient_uses_start_color() {
        let spec = GradientSpec::default();
        let canvas = generate(SizePx::new(2, 1), &BackgroundSpec::Gradient(spec)).unwrap();
        assert_eq!(rgb(&canvas, 1, 0), [74, 144, 226]);
    }

    #[test]
    fn image_background_matches_canvas() {
        let asset = ImageAsset::new(RgbaImage::from_pixel(7, 3, image::Rgba([1, 2, 3, 255])));
        let canvas = generate(SizePx::new(20, 40), &BackgroundSpec::Image(asset)).unwrap();
        assert_eq!(canvas.size(), SizePx::new(20, 40));
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(generate(SizePx::new(0, 0), &BackgroundSpec::default()).is_err());
    }

    proptest! {
        #[test]
        fn vertical_gradient_endpoints(
            start in any::<[u8; 3]>(),
            end in any::<[u8; 3]>(),
            height in 2u32..200,
        ) {
            let spec = GradientSpec::new(start.into(), end.into(), GradientDirection::Vertical);
            let canvas = generate(SizePx::new(2, height), &BackgroundSpec::Gradient(spec)).unwrap();
            let top = rgb(&canvas, 0, 0);
            let bottom = rgb(&canvas, 1, height - 1);
            for c in 0..3 {
                prop_assert!((i16::from(top[c]) - i16::from(start[c])).abs() <= 1);
                prop_assert!((i16::from(bottom[c]) - i16::from(end[c])).abs() <= 1);
            }
        }
    }
}
