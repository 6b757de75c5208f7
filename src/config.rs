//! Serializable composition settings.
//!
//! A [`CompositionConfig`] captures everything needed to produce one output
//! image except the pixel inputs themselves. It round-trips through JSON so
//! batch tools, GUIs and upload handlers can share one format.
//!
//! # Example
//!
//! ```
//! use shotcraft::{BackgroundStyle, CompositionConfig, LayoutKind, TextItem, TextPosition};
//!
//! let config = CompositionConfig::new()
//!     .with_background_style(BackgroundStyle::Gradient)
//!     .with_layout(LayoutKind::Triple)
//!     .with_text(TextItem::title("Save time", TextPosition::Top));
//!
//! let json = config.to_json().unwrap();
//! let restored = CompositionConfig::from_json(&json).unwrap();
//! assert_eq!(restored, config);
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::asset::{ImageAsset, SizePx};
use crate::background::{BackgroundSpec, GradientDirection, GradientSpec};
use crate::canvas::CanvasPreset;
use crate::color::Rgb8;
use crate::error::{ComposeError, ComposeResult};
use crate::frame::FrameSpec;
use crate::layout::{LayoutKind, LayoutOptions, SinglePolicy};
use crate::text::TextItem;

/// Which kind of background to paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum BackgroundStyle {
    #[default]
    Solid,
    Gradient,
    Image,
}

/// Largest accepted canvas side, in pixels.
pub const MAX_CANVAS_DIMENSION: u32 = 16_384;

fn default_background_color() -> Rgb8 {
    Rgb8::WHITE
}

fn default_gradient_colors() -> Vec<Rgb8> {
    let gradient = GradientSpec::default();
    vec![gradient.start, gradient.end]
}

fn default_canvas_width() -> u32 {
    CanvasPreset::Iphone67.size().width
}

fn default_canvas_height() -> u32 {
    CanvasPreset::Iphone67.size().height
}

fn default_true() -> bool {
    true
}

/// All settings for one composition.
///
/// # JSON Format
///
/// ```json
/// {
///   "backgroundStyle": "gradient",
///   "gradientColors": ["#4a90e2", [155, 89, 182]],
///   "canvasWidth": 1290,
///   "canvasHeight": 2796,
///   "addFrame": true,
///   "layout": "single",
///   "textItems": [{ "content": "Save time", "position": "top" }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct CompositionConfig {
    #[serde(default)]
    pub background_style: BackgroundStyle,

    #[serde(default = "default_background_color")]
    pub background_color: Rgb8,

    /// Start and end color of the gradient.
    #[serde(default = "default_gradient_colors")]
    pub gradient_colors: Vec<Rgb8>,

    #[serde(default)]
    pub gradient_direction: GradientDirection,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image_path: Option<PathBuf>,

    #[serde(default = "default_canvas_width")]
    pub canvas_width: u32,

    #[serde(default = "default_canvas_height")]
    pub canvas_height: u32,

    #[serde(default = "default_true")]
    pub add_frame: bool,

    #[serde(default)]
    pub layout: LayoutKind,

    #[serde(default)]
    pub text_items: Vec<TextItem>,

    #[serde(default = "default_true")]
    pub perspective_enabled: bool,

    /// Frame shape used when `add_frame` is set.
    #[serde(default)]
    pub frame: FrameSpec,

    #[serde(default)]
    pub single_policy: SinglePolicy,

    /// Extra downward shift of the single slot, as a fraction of the canvas
    /// height.
    #[serde(default)]
    pub extra_offset_ratio: f64,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            background_style: BackgroundStyle::default(),
            background_color: default_background_color(),
            gradient_colors: default_gradient_colors(),
            gradient_direction: GradientDirection::default(),
            background_image_path: None,
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            add_frame: true,
            layout: LayoutKind::default(),
            text_items: Vec::new(),
            perspective_enabled: true,
            frame: FrameSpec::default(),
            single_policy: SinglePolicy::default(),
            extra_offset_ratio: 0.0,
        }
    }
}

impl CompositionConfig {
    /// Creates a config with default settings: white background, one
    /// framed screenshot, 1290x2796 canvas.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_canvas_size(mut self, size: SizePx) -> Self {
        self.canvas_width = size.width;
        self.canvas_height = size.height;
        self
    }

    pub fn with_preset(self, preset: CanvasPreset) -> Self {
        self.with_canvas_size(preset.size())
    }

    pub fn with_background_style(mut self, style: BackgroundStyle) -> Self {
        self.background_style = style;
        self
    }

    pub fn with_background_color(mut self, color: Rgb8) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_gradient(mut self, start: Rgb8, end: Rgb8, direction: GradientDirection) -> Self {
        self.gradient_colors = vec![start, end];
        self.gradient_direction = direction;
        self
    }

    pub fn with_layout(mut self, layout: LayoutKind) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_frame(mut self, add_frame: bool) -> Self {
        self.add_frame = add_frame;
        self
    }

    pub fn with_text(mut self, item: TextItem) -> Self {
        self.text_items.push(item);
        self
    }

    pub fn canvas_size(&self) -> SizePx {
        SizePx::new(self.canvas_width, self.canvas_height)
    }

    /// Checks the settings for values no composition can satisfy.
    pub fn validate(&self) -> ComposeResult<()> {
        let canvas = self.canvas_size();
        if canvas.is_empty() {
            return Err(ComposeError::config(format!(
                "canvas must have non-zero dimensions, got {canvas}"
            )));
        }
        if canvas.width > MAX_CANVAS_DIMENSION || canvas.height > MAX_CANVAS_DIMENSION {
            return Err(ComposeError::config(format!(
                "canvas sides must be at most {MAX_CANVAS_DIMENSION}, got {canvas}"
            )));
        }
        self.frame.validate()?;
        if self.background_style == BackgroundStyle::Gradient && self.gradient_colors.len() != 2 {
            return Err(ComposeError::config(format!(
                "gradientColors needs exactly 2 colors, got {}",
                self.gradient_colors.len()
            )));
        }
        if let Some(item) = self
            .text_items
            .iter()
            .find(|item| !(item.font_size.is_finite() && item.font_size > 0.0))
        {
            return Err(ComposeError::config(format!(
                "text item {:?} has invalid font size {}",
                item.content, item.font_size
            )));
        }
        // Glyph masks are sized from the font size; a line taller than the
        // canvas can never be shown.
        let max_font_size = canvas.height as f32;
        if let Some(item) = self.text_items.iter().find(|item| item.font_size > max_font_size) {
            return Err(ComposeError::config(format!(
                "text item {:?} has font size {} above the canvas height {}",
                item.content, item.font_size, canvas.height
            )));
        }
        if !(-1.0..=1.0).contains(&self.extra_offset_ratio) {
            return Err(ComposeError::config(format!(
                "extraOffsetRatio must be within [-1, 1], got {}",
                self.extra_offset_ratio
            )));
        }
        Ok(())
    }

    /// Gradient described by `gradient_colors` and `gradient_direction`.
    pub fn gradient(&self) -> ComposeResult<GradientSpec> {
        match self.gradient_colors.as_slice() {
            [start, end] => Ok(GradientSpec::new(*start, *end, self.gradient_direction)),
            other => Err(ComposeError::config(format!(
                "gradientColors needs exactly 2 colors, got {}",
                other.len()
            ))),
        }
    }

    /// Background to paint, given the decoded background image if any.
    ///
    /// An image style without an image is a composition error; callers
    /// that prefer a fallback substitute one before calling.
    pub fn background_spec(&self, image: Option<ImageAsset>) -> ComposeResult<BackgroundSpec> {
        match self.background_style {
            BackgroundStyle::Solid => Ok(BackgroundSpec::Solid(self.background_color)),
            BackgroundStyle::Gradient => Ok(BackgroundSpec::Gradient(self.gradient()?)),
            BackgroundStyle::Image => image.map(BackgroundSpec::Image).ok_or_else(|| {
                ComposeError::composition("backgroundStyle is image but no background image was supplied")
            }),
        }
    }

    /// Layout settings derived from this config.
    ///
    /// The text intent comes from the first text item that is not pinned
    /// to an explicit anchor.
    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            kind: self.layout,
            text_intent: self
                .text_items
                .iter()
                .find(|item| item.anchor.is_none())
                .map(|item| item.position),
            frame: self.add_frame.then_some(self.frame),
            perspective: self.perspective_enabled,
            single_policy: self.single_policy,
            extra_offset_ratio: self.extra_offset_ratio,
        }
    }

    /// Serializes the config to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the config to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// Tests
// ============================================================================
