//! Decoded image assets and the loader/encoder collaborators around them.
//!
//! Assets are read-only once loaded. Every transform in the pipeline
//! (scale, frame, rotate) produces a new [`ImageAsset`] instead of mutating
//! a shared one, so the same screenshot can feed several layout slots.

use std::fmt;
use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::canvas::Canvas;
use crate::error::{ComposeError, ComposeResult};
use crate::raster;

/// A rectangle defined in pixel coordinates.
///
/// Coordinates are signed because layout slots may start left of or above
/// the canvas origin (for example when a rotated slot is wider than its
/// share of the canvas).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RectPx {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl RectPx {
    /// Creates a new rectangle with the given position and dimensions.
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the right edge coordinate (x + width).
    pub fn right(&self) -> i64 {
        self.x + i64::from(self.width)
    }

    /// Returns the bottom edge coordinate (y + height).
    pub fn bottom(&self) -> i64 {
        self.y + i64::from(self.height)
    }

    /// Returns the center point of the rectangle.
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + f64::from(self.width) / 2.0,
            self.y as f64 + f64::from(self.height) / 2.0,
        )
    }
}

/// A point in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct PointPx {
    pub x: i64,
    pub y: i64,
}

impl PointPx {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl std::ops::Sub for PointPx {
    type Output = PointPx;

    fn sub(self, rhs: Self) -> Self::Output {
        PointPx::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for SizePx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ============================================================================
// ImageAsset
// ============================================================================

/// A decoded image in RGBA form.
///
/// `has_alpha` records whether the source carried an alpha channel; the
/// pixel data is always stored as RGBA so that compositing code has a
/// single representation to deal with.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    data: RgbaImage,
    has_alpha: bool,
}

impl ImageAsset {
    /// Wraps an RGBA buffer. The asset is treated as carrying alpha.
    pub fn new(data: RgbaImage) -> Self {
        Self {
            data,
            has_alpha: true,
        }
    }

    /// Converts any decoded image, remembering whether it had alpha.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let has_alpha = image.color().has_alpha();
        Self {
            data: image.to_rgba8(),
            has_alpha,
        }
    }

    /// Decodes a raster image from encoded bytes (PNG, JPEG, ...).
    pub fn from_memory(bytes: &[u8]) -> ComposeResult<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| ComposeError::asset_load("<memory>", e))?;
        Ok(Self::from_dynamic(image))
    }

    /// Returns the pixel data.
    pub fn data(&self) -> &RgbaImage {
        &self.data
    }

    /// Consumes the asset and returns its pixel data.
    pub fn into_data(self) -> RgbaImage {
        self.data
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    pub fn width(&self) -> u32 {
        self.data.width()
    }

    pub fn height(&self) -> u32 {
        self.data.height()
    }

    /// Returns the pixel dimensions of the image.
    pub fn dimensions(&self) -> SizePx {
        SizePx::new(self.data.width(), self.data.height())
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Resolves an image source to a decoded asset.
///
/// Implementations must be shareable across worker threads since batch
/// jobs load their inputs concurrently.
pub trait AssetLoader: Send + Sync {
    fn load(&self, source: &Path) -> ComposeResult<ImageAsset>;
}

/// Loads assets from the local filesystem.
///
/// Raster formats are decoded by `image`; files with an `.svg` extension
/// are rasterized at their intrinsic size.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsAssetLoader;

impl AssetLoader for FsAssetLoader {
    fn load(&self, source: &Path) -> ComposeResult<ImageAsset> {
        let name = source.display().to_string();
        let is_svg = source
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));

        if is_svg {
            let markup =
                std::fs::read_to_string(source).map_err(|e| ComposeError::asset_load(&name, e))?;
            let data = raster::render_svg(&markup, None)
                .ok_or_else(|| ComposeError::asset_load(&name, "unparseable svg document"))?;
            return Ok(ImageAsset::new(data));
        }

        let image = image::open(source).map_err(|e| ComposeError::asset_load(&name, e))?;
        tracing::debug!(source = %name, width = image.width(), height = image.height(), "loaded asset");
        Ok(ImageAsset::from_dynamic(image))
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encodes the canvas as an RGB PNG in memory.
pub fn encode_png(canvas: &Canvas) -> ComposeResult<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(canvas.to_rgb())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|source| ComposeError::Encode {
            path: "<memory>".into(),
            source,
        })?;
    Ok(bytes)
}

/// Writes the canvas to `path` as a lossless RGB PNG.
pub fn save_png(canvas: &Canvas, path: &Path) -> ComposeResult<()> {
    let bytes = encode_png(canvas)?;
    std::fs::write(path, bytes).map_err(|source| ComposeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), size = %canvas.size(), "wrote composition");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn png_bytes(image: DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn rect_px_edges() {
        let rect = RectPx::new(-10, 20, 100, 200);
        assert_eq!(rect.right(), 90);
        assert_eq!(rect.bottom(), 220);
        assert_eq!(rect.center(), (40.0, 120.0));
    }

    #[test]
    fn from_memory_tracks_alpha() {
        let rgb = DynamicImage::ImageRgb8(image::RgbImage::new(3, 2));
        let asset = ImageAsset::from_memory(&png_bytes(rgb)).unwrap();
        assert_eq!(asset.dimensions(), SizePx::new(3, 2));
        assert!(!asset.has_alpha());

        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 4])));
        let asset = ImageAsset::from_memory(&png_bytes(rgba)).unwrap();
        assert!(asset.has_alpha());
        assert_eq!(asset.data().get_pixel(0, 0).0, [1, 2, 3, 4]);
    }

    #[test]
    fn corrupt_bytes_are_asset_load_errors() {
        let err = ImageAsset::from_memory(b"definitely not a png").unwrap_err();
        assert!(err.is_asset_load());
    }

    #[test]
    fn missing_file_is_asset_load_error() {
        let err = FsAssetLoader
            .load(Path::new("/nonexistent/shotcraft/screenshot.png"))
            .unwrap_err();
        assert!(err.is_asset_load());
    }

    #[test]
    fn encode_png_drops_alpha() {
        let canvas = Canvas::filled(SizePx::new(4, 4), crate::color::Rgb8::new(9, 8, 7)).unwrap();
        let bytes = encode_png(&canvas).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
        assert_eq!(decoded.to_rgb8().get_pixel(3, 3).0, [9, 8, 7]);
    }
}
