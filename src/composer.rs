//! Composition engine: configuration in, canvas out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::asset::{AssetLoader, ImageAsset, RectPx};
use crate::canvas::Canvas;
use crate::color::Rgb8;
use crate::config::{BackgroundStyle, CompositionConfig};
use crate::error::{ComposeError, ComposeResult};
use crate::layer::{BackdropConfig, CaptionsConfig, LayerPipeline, SlotsConfig};
use crate::layout::LayoutOptions;
use crate::text::{FallbackFontResolver, FontResolver, TextItem};

// ============================================================================
// Configurable Trait
// ============================================================================

/// Trait for types that can be configured from a [`CompositionConfig`].
pub trait Configurable {
    /// Applies a config's settings to this instance.
    fn apply_config(&mut self, config: &CompositionConfig) -> ComposeResult<()>;

    /// Exports the current settings as a config.
    fn export_config(&self) -> CompositionConfig;
}

// ============================================================================
// One-shot Composition
// ============================================================================

/// Composes one image.
///
/// Layers are painted in fixed order: background, screenshot slots, text.
/// With no screenshots only background and text are drawn. An image
/// background without a `background` asset is a
/// [`ComposeError::Composition`].
pub fn compose(
    config: &CompositionConfig,
    screenshots: &[ImageAsset],
    fonts: &dyn FontResolver,
    background: Option<ImageAsset>,
) -> ComposeResult<Canvas> {
    config.validate()?;
    let mut pipeline = LayerPipeline::default();
    pipeline
        .backdrop
        .set_config(Some(BackdropConfig::new(config.background_spec(background)?)));
    pipeline.slots.set_config(Some(SlotsConfig::new(
        Arc::from(screenshots),
        config.layout_options(),
    )));
    pipeline
        .captions
        .set_config(Some(CaptionsConfig::new(config.text_items.clone())));

    let canvas = pipeline.render(config.canvas_size(), fonts)?;
    tracing::info!(
        size = %canvas.size(),
        layout = ?config.layout,
        screenshots = screenshots.len(),
        texts = config.text_items.len(),
        "composed image"
    );
    Ok(canvas)
}

/// Loads inputs through `loader` and composes.
///
/// Unreadable screenshots fail the call. A background image that is not
/// configured or cannot be loaded is replaced by solid white, with a
/// warning.
pub fn compose_from_paths(
    config: &CompositionConfig,
    screenshots: &[PathBuf],
    loader: &dyn AssetLoader,
    fonts: &dyn FontResolver,
) -> ComposeResult<Canvas> {
    let assets = screenshots
        .iter()
        .map(|path| loader.load(path))
        .collect::<ComposeResult<Vec<_>>>()?;

    if config.background_style != BackgroundStyle::Image {
        return compose(config, &assets, fonts, None);
    }

    let background = match &config.background_image_path {
        Some(path) => loader
            .load(path)
            .inspect_err(|e| tracing::warn!(error = %e, "background image unavailable, using white"))
            .ok(),
        None => {
            tracing::warn!("no background image configured, using white");
            None
        }
    };

    match background {
        Some(image) => compose(config, &assets, fonts, Some(image)),
        None => {
            let fallback = config
                .clone()
                .with_background_style(BackgroundStyle::Solid)
                .with_background_color(Rgb8::WHITE);
            compose(&fallback, &assets, fonts, None)
        }
    }
}

/// Output file name for a source screenshot: `marketing_<stem>.png`.
pub fn output_file_name(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_owned());
    PathBuf::from(format!("marketing_{stem}.png"))
}

// ============================================================================
// Composer
// ============================================================================

/// Stateful composition engine with layer caching.
///
/// `Composer` keeps the inputs of one composition and re-renders only the
/// layers affected by each change. Editing text, as an interactive editor
/// does on every drag event, repaints just the captions layer.
///
/// # Example
///
/// ```
/// use shotcraft::{Composer, Configurable, CompositionConfig, TextItem, TextPosition};
///
/// let mut composer = Composer::with_fallback_fonts();
/// composer
///     .apply_config(&CompositionConfig::new().with_text(TextItem::title("Hi", TextPosition::Top)))
///     .unwrap();
///
/// let canvas = composer.render().unwrap();
/// assert_eq!((canvas.width(), canvas.height()), (1290, 2796));
/// ```
pub struct Composer {
    config: CompositionConfig,
    screenshots: Arc<[ImageAsset]>,
    background: Option<ImageAsset>,
    fonts: Arc<dyn FontResolver>,
    /// Layout held fixed while text is edited; see [`Composer::lock_layout`].
    locked_layout: Option<LayoutOptions>,

    /// The layer pipeline. See [`LayerPipeline`] for the dependency graph.
    pub pipeline: LayerPipeline,
}

impl Composer {
    /// Creates a composer with default settings and no screenshots.
    pub fn new(fonts: Arc<dyn FontResolver>) -> Self {
        let mut composer = Self {
            config: CompositionConfig::default(),
            screenshots: Arc::from(Vec::new()),
            background: None,
            fonts,
            locked_layout: None,
            pipeline: LayerPipeline::default(),
        };
        composer.sync_backdrop();
        composer.sync_slots();
        composer.sync_captions();
        composer
    }

    /// Creates a composer that draws text with the built-in block font.
    pub fn with_fallback_fonts() -> Self {
        Self::new(Arc::new(FallbackFontResolver))
    }

    pub fn config(&self) -> &CompositionConfig {
        &self.config
    }

    pub fn fonts(&self) -> &dyn FontResolver {
        &*self.fonts
    }

    pub fn screenshots(&self) -> &[ImageAsset] {
        &self.screenshots
    }

    pub fn set_screenshots(&mut self, screenshots: Vec<ImageAsset>) {
        self.screenshots = Arc::from(screenshots);
        self.sync_slots();
    }

    /// Sets the image used when the background style is `image`.
    pub fn set_background_image(&mut self, image: Option<ImageAsset>) {
        self.background = image;
        self.sync_backdrop();
    }

    pub fn text_items(&self) -> &[TextItem] {
        &self.config.text_items
    }

    /// Replaces the text items.
    ///
    /// The screenshots follow the text intent of the new items unless the
    /// layout is locked, in which case only the captions layer is
    /// invalidated.
    pub fn set_text_items(&mut self, items: Vec<TextItem>) {
        self.config.text_items = items;
        self.sync_captions();
        self.sync_slots();
    }

    /// Freezes the current screenshot layout. Text edits, including
    /// pinning items to anchors, then leave the slots untouched until
    /// [`unlock_layout`](Self::unlock_layout) or the next
    /// [`apply_config`](Configurable::apply_config).
    pub fn lock_layout(&mut self) {
        self.locked_layout = Some(self.config.layout_options());
    }

    pub fn unlock_layout(&mut self) {
        self.locked_layout = None;
        self.sync_slots();
    }

    pub fn is_layout_locked(&self) -> bool {
        self.locked_layout.is_some()
    }

    /// Screenshot rectangles of the most recent render.
    pub fn placed_slots(&self) -> &[RectPx] {
        self.pipeline.placed_slots()
    }

    /// Renders the composition at the configured canvas size.
    pub fn render(&mut self) -> ComposeResult<Canvas> {
        if self.pipeline.backdrop.config().is_none() {
            return Err(ComposeError::composition(
                "backgroundStyle is image but no background image was supplied",
            ));
        }
        let size = self.config.canvas_size();
        self.pipeline.render(size, &*self.fonts)
    }

    /// Clears all layer caches.
    pub fn clear_cache(&mut self) {
        self.pipeline.invalidate_all();
    }

    fn sync_backdrop(&mut self) {
        let spec = self.config.background_spec(self.background.clone()).ok();
        self.pipeline.backdrop.set_config(spec.map(BackdropConfig::new));
    }

    fn sync_slots(&mut self) {
        let options = self
            .locked_layout
            .unwrap_or_else(|| self.config.layout_options());
        self.pipeline
            .slots
            .set_config(Some(SlotsConfig::new(Arc::clone(&self.screenshots), options)));
    }

    fn sync_captions(&mut self) {
        self.pipeline
            .captions
            .set_config(Some(CaptionsConfig::new(self.config.text_items.clone())));
    }
}

impl Configurable for Composer {
    /// Validates and applies `config`, invalidating only the layers whose
    /// settings changed.
    fn apply_config(&mut self, config: &CompositionConfig) -> ComposeResult<()> {
        config.validate()?;
        self.config = config.clone();
        self.locked_layout = None;
        self.sync_backdrop();
        self.sync_slots();
        self.sync_captions();
        Ok(())
    }

    fn export_config(&self) -> CompositionConfig {
        self.config.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================
