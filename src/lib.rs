//! shotcraft: app-store marketing images from raw screenshots
//!
//! This crate places one or more device screenshots on a styled canvas
//! (solid, gradient or image background), optionally wraps them in a
//! rounded frame with a soft drop shadow, fans them out with a slight
//! rotation, and draws wrapped caption text on top.
//!
//! # Example
//!
//! ```
//! use shotcraft::{
//!     BackgroundStyle, CompositionConfig, FallbackFontResolver, ImageAsset, LayoutKind,
//!     TextItem, TextPosition, compose,
//! };
//! use image::{Rgba, RgbaImage};
//!
//! let config = CompositionConfig::new()
//!     .with_background_style(BackgroundStyle::Gradient)
//!     .with_layout(LayoutKind::Single)
//!     .with_text(TextItem::title("Save time", TextPosition::Top));
//!
//! let shot = ImageAsset::new(RgbaImage::from_pixel(118, 256, Rgba([30, 30, 30, 255])));
//! let canvas = compose(&config, &[shot], &FallbackFontResolver, None).unwrap();
//! assert_eq!((canvas.width(), canvas.height()), (1290, 2796));
//! ```
//!
//! # Interactive Editing
//!
//! [`Composer`] keeps layer caches between renders, and
//! [`InteractiveSession`] turns pointer events into caption moves:
//!
//! ```
//! use shotcraft::{Composer, Configurable, CompositionConfig, InteractiveSession, TextItem, TextPosition};
//!
//! let mut composer = Composer::with_fallback_fonts();
//! composer
//!     .apply_config(&CompositionConfig::new().with_text(TextItem::title("Hi", TextPosition::Top)))
//!     .unwrap();
//!
//! let mut session = InteractiveSession::new(composer);
//! if session.pointer_down(258.0, 50.0).is_some() {
//!     let preview = session.pointer_move(258.0, 80.0).unwrap();
//!     assert!(preview.is_some());
//! }
//! session.pointer_up();
//! ```

mod asset;
mod background;
mod batch;
mod canvas;
mod color;
mod composer;
mod config;
mod error;
mod frame;
mod geometry;
mod layer;
mod layout;
mod logging;
mod perspective;
mod placement;
mod raster;
mod session;
mod text;

pub use asset::{
    AssetLoader, FsAssetLoader, ImageAsset, PointPx, RectPx, SizePx, encode_png, save_png,
};
pub use background::{BackgroundSpec, GradientDirection, GradientSpec, generate as generate_background};
pub use batch::{BatchContext, BatchJob, BatchOutcome, compose_batch};
pub use canvas::{Canvas, CanvasPreset};
pub use color::{Rgb8, ShadowColor};
pub use composer::{Composer, Configurable, compose, compose_from_paths, output_file_name};
pub use config::{BackgroundStyle, CompositionConfig, MAX_CANVAS_DIMENSION};
pub use error::{ComposeError, ComposeResult};
pub use frame::{FrameSpec, MAX_FRAME_EXTENT, frame_screenshot};
pub use geometry::{ScaleSpec, cover_fit, fit_size, scale_to_fit};
pub use layer::{
    BackdropConfig, CacheKey, CaptionsConfig, DependencyVersion, Layer, LayerConfig, LayerEffect,
    LayerPipeline, LayerVersions, PlacedSlots, RenderContext, SlotsConfig,
};
pub use layout::{
    LayoutKind, LayoutOptions, LayoutSlot, SinglePolicy, SlotPlan, layout_screenshots,
    paste_slots, plan_slots,
};
pub use logging::{LoggingConfig, init_default_logging, init_logging};
pub use perspective::{apply_perspective, rotate_expanded};
pub use placement::{DisplayMapping, DragState, HIT_HALF_HEIGHT, HIT_HALF_WIDTH, PlacementStore};
pub use session::InteractiveSession;
pub use text::{
    CachedFontResolver, FallbackFontResolver, FontFace, FontRequest, FontResolver,
    SystemFontResolver, TextBlock, TextFont, TextItem, TextLine, TextPosition, TextShadow,
    draw_items, layout_items, wrap_text,
};
pub use text::font::GlyphMask;
