//! The fixed-size output pixel buffer.

use image::{Rgba, RgbImage, RgbaImage};

use crate::asset::SizePx;
use crate::color::Rgb8;
use crate::error::{ComposeError, ComposeResult};

/// Canvas dimensions for common App Store screenshot slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "kebab-case")]
pub enum CanvasPreset {
    /// 6.7" display, 1290x2796.
    Iphone67,
    /// 6.5" display, 1242x2688.
    Iphone65,
    /// Generic portrait story format, 1080x1920.
    Portrait1080,
}

impl CanvasPreset {
    pub fn size(self) -> SizePx {
        match self {
            Self::Iphone67 => SizePx::new(1290, 2796),
            Self::Iphone65 => SizePx::new(1242, 2688),
            Self::Portrait1080 => SizePx::new(1080, 1920),
        }
    }
}

/// The composition target.
///
/// Stored as RGBA while layers are painted; every pixel stays opaque
/// because the background layer always fills the full area. Callers take
/// the final image as RGB via [`Canvas::to_rgb`].
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Creates a canvas filled with a solid color.
    ///
    /// Fails for zero-sized dimensions.
    pub fn filled(size: SizePx, color: Rgb8) -> ComposeResult<Self> {
        ensure_non_empty(size)?;
        Ok(Self {
            image: RgbaImage::from_pixel(size.width, size.height, color.to_rgba()),
        })
    }

    /// Wraps an already rendered buffer.
    pub fn from_image(image: RgbaImage) -> ComposeResult<Self> {
        ensure_non_empty(SizePx::new(image.width(), image.height()))?;
        Ok(Self { image })
    }

    pub fn size(&self) -> SizePx {
        SizePx::new(self.image.width(), self.image.height())
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.image.get_pixel(x, y)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Flattens to opaque RGB.
    pub fn to_rgb(&self) -> RgbImage {
        image::DynamicImage::ImageRgba8(self.image.clone()).to_rgb8()
    }
}

fn ensure_non_empty(size: SizePx) -> ComposeResult<()> {
    if size.is_empty() {
        return Err(ComposeError::composition(format!(
            "canvas must have non-zero dimensions, got {size}"
        )));
    }
    Ok(())
}
