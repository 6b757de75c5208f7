//! Layer infrastructure for composition rendering.
//!
//! A composition is a fixed stack of three layers: backdrop, screenshot
//! slots and captions. Each layer encapsulates a configuration, an enabled
//! state, version tracking for cache invalidation, and a per-size canvas
//! cache, so that editing a caption only repaints captions on top of the
//! cached slots image.
//!
//! # Architecture
//!
//! Each layer config implements [`LayerEffect`], which defines:
//! - How the layer paints itself onto the working canvas
//! - What properties it emits for downstream layers
//! - Which upstream layers its cached output depends on
//!
//! Properties flow through the pipeline via [`RenderContext`], enabling
//! layers to communicate without tight coupling.

pub mod backdrop;
pub mod captions;
pub mod slots;

pub use backdrop::BackdropConfig;
pub use captions::CaptionsConfig;
pub use slots::{PlacedSlots, SlotsConfig};

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::asset::{RectPx, SizePx};
use crate::canvas::Canvas;
use crate::color::Rgb8;
use crate::error::ComposeResult;
use crate::text::FontResolver;

// ============================================================================
// Render Context
// ============================================================================

/// Context that flows through the rendering pipeline.
///
/// Layers can read properties set by upstream layers and emit new properties
/// for downstream layers to consume.
///
/// # Example
///
/// ```ignore
/// // The slots layer emits where it put each screenshot
/// ctx.set(PlacedSlots(rects));
///
/// // The pipeline reads them back once every layer has run
/// if let Some(slots) = ctx.get::<PlacedSlots>() {
///     // Keep the rectangles for hit testing...
/// }
/// ```
pub struct RenderContext<'a> {
    /// The canvas being painted.
    pub canvas: Canvas,

    /// Font lookup for text layers.
    pub fonts: &'a dyn FontResolver,

    /// Typed property bag for inter-layer communication.
    properties: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl<'a> RenderContext<'a> {
    /// Creates a new render context around a starting canvas.
    pub fn new(canvas: Canvas, fonts: &'a dyn FontResolver) -> Self {
        Self {
            canvas,
            fonts,
            properties: HashMap::new(),
        }
    }

    /// Sets a typed property that downstream layers can read.
    pub fn set<T: Any + Send + Sync>(&mut self, value: T) {
        self.properties.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Gets a typed property set by an upstream layer.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.properties
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref())
    }

    /// Checks if a property has been set.
    pub fn has<T: Any + Send + Sync>(&self) -> bool {
        self.properties.contains_key(&TypeId::of::<T>())
    }
}

// ============================================================================
// Layer Traits
// ============================================================================

/// Trait for layer configuration types.
///
/// Implementations must detect when a configuration meaningfully differs
/// from another, which drives cache invalidation.
pub trait LayerConfig: Clone {
    /// Returns true if this config differs from another in a way that
    /// would produce different rendering output.
    fn differs_from(&self, other: &Self) -> bool;
}

/// Trait for layer configurations that know how to apply themselves.
///
/// The separation of [`transform`](Self::transform) and [`emit`](Self::emit)
/// keeps property emission independent of painting: on a cache hit only
/// `emit` runs.
pub trait LayerEffect: LayerConfig {
    /// Returns the dependency version for cache invalidation.
    ///
    /// Root layers (no dependencies) return `DependencyVersion::NONE`.
    fn dependencies(versions: &LayerVersions) -> DependencyVersion;

    /// Paints onto `ctx.canvas`, reading upstream properties as needed.
    fn transform(&self, ctx: &mut RenderContext<'_>) -> ComposeResult<()>;

    /// Emit properties for downstream layers to consume.
    ///
    /// Called after [`transform`](Self::transform) and on every cache hit.
    /// The default implementation emits nothing.
    fn emit(&self, _ctx: &mut RenderContext<'_>) {}
}

// ============================================================================
// Layer Dependencies
// ============================================================================

/// Represents the combined version of upstream layer dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DependencyVersion(u64);

impl DependencyVersion {
    /// No dependencies (root layer).
    pub const NONE: Self = Self(0);

    /// Creates a dependency version from a single version number.
    pub fn from_version(version: u64) -> Self {
        Self(version)
    }

    /// Combines multiple upstream layer versions into one.
    ///
    /// Versions only ever grow, so the sum changes whenever any input does.
    pub fn combine(versions: &[u64]) -> Self {
        Self(versions.iter().fold(0u64, |acc, v| acc.wrapping_add(*v)))
    }
}

/// Snapshot of all layer versions in the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct LayerVersions {
    pub backdrop: u64,
    pub slots: u64,
    pub captions: u64,
}

// ============================================================================
// CacheKey
// ============================================================================

/// Key for cached canvases: the canvas dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    width: u32,
    height: u32,
}

impl CacheKey {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn from_size(size: SizePx) -> Self {
        Self::new(size.width, size.height)
    }
}

// ============================================================================
// Generic Layer
// ============================================================================

/// A generic layer with configuration, caching, and version tracking.
///
/// The layer tracks:
/// - Optional configuration of type `C`
/// - Whether the layer is enabled (can be toggled without losing config)
/// - A version number that increments on any state change
/// - A cache of rendered canvases keyed by size
/// - The dependency version when each cache entry was stored
pub struct Layer<C: LayerConfig> {
    config: Option<C>,
    enabled: bool,
    version: u64,
    cache: HashMap<CacheKey, (Canvas, u64)>,
}

impl<C: LayerConfig> Default for Layer<C> {
    fn default() -> Self {
        Self {
            config: None,
            enabled: true,
            version: 0,
            cache: HashMap::new(),
        }
    }
}

impl<C: LayerConfig> Layer<C> {
    /// Returns the current configuration, if any.
    pub fn config(&self) -> Option<&C> {
        self.config.as_ref()
    }

    /// Returns true if this layer is active (has config AND is enabled).
    pub fn is_active(&self) -> bool {
        self.enabled && self.config.is_some()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sets whether the layer is enabled.
    ///
    /// Returns true if the enabled state changed.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        if self.enabled == enabled {
            return false;
        }
        self.enabled = enabled;
        self.invalidate();
        true
    }

    /// Returns the current version number.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Sets the configuration. Returns true if it changed.
    ///
    /// Clears the cache and increments version if the config differs.
    pub fn set_config(&mut self, config: Option<C>) -> bool {
        let differs = match (&self.config, &config) {
            (None, None) => false,
            (Some(_), None) | (None, Some(_)) => true,
            (Some(old), Some(new)) => old.differs_from(new),
        };

        if differs {
            self.config = config;
            self.invalidate();
        }
        differs
    }

    /// Invalidates the cache and increments version.
    pub fn invalidate(&mut self) {
        self.version = self.version.wrapping_add(1);
        self.cache.clear();
    }

    /// Gets a cached canvas if valid for the given key and dependency version.
    pub fn get_cached(&self, key: CacheKey, deps: DependencyVersion) -> Option<&Canvas> {
        self.cache
            .get(&key)
            .and_then(|(canvas, stored)| (*stored == deps.0).then_some(canvas))
    }

    /// Stores a canvas in the cache with the current dependency version.
    pub fn store(&mut self, key: CacheKey, canvas: Canvas, deps: DependencyVersion) {
        self.cache.insert(key, (canvas, deps.0));
    }
}

impl<C: LayerEffect> Layer<C> {
    /// Apply this layer to the render context, using cache if valid.
    ///
    /// Inactive layers pass the context through unchanged. On a cache hit
    /// the cached canvas replaces the working one and properties are
    /// re-emitted; otherwise the layer paints, emits, and caches.
    pub fn apply(
        &mut self,
        ctx: &mut RenderContext<'_>,
        key: CacheKey,
        versions: &LayerVersions,
    ) -> ComposeResult<()> {
        let Some(config) = self.config.as_ref().filter(|_| self.enabled) else {
            return Ok(());
        };
        let deps = C::dependencies(versions);

        if let Some(cached) = self.get_cached(key, deps) {
            ctx.canvas = cached.clone();
            config.emit(ctx);
            return Ok(());
        }

        config.transform(ctx)?;
        config.emit(ctx);

        // Only the canvas is cached; properties are re-emitted on a hit.
        self.store(key, ctx.canvas.clone(), deps);
        Ok(())
    }
}

// ============================================================================
// Composite Layer
// ============================================================================

/// A cache-only layer for the final composited canvas.
#[derive(Default)]
pub struct CompositeLayer {
    version: u64,
    cache: HashMap<CacheKey, (Canvas, u64)>,
}

impl CompositeLayer {
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Invalidates the cache and increments version.
    pub fn invalidate(&mut self) {
        self.version = self.version.wrapping_add(1);
        self.cache.clear();
    }

    pub fn get_cached(&self, key: CacheKey, deps: DependencyVersion) -> Option<&Canvas> {
        self.cache
            .get(&key)
            .and_then(|(canvas, stored)| (*stored == deps.0).then_some(canvas))
    }

    pub fn store(&mut self, key: CacheKey, canvas: Canvas, deps: DependencyVersion) {
        self.cache.insert(key, (canvas, deps.0));
    }
}

// ============================================================================
// Layer Pipeline
// ============================================================================

/// The composition layers in their fixed z-order.
///
/// # Dependency Graph
///
/// ```text
/// ┌──────────┐
/// │ Backdrop │ ◄── No dependencies (root layer)
/// └────┬─────┘
///      │
///      ▼
/// ┌──────────┐
/// │  Slots   │ ◄── Depends on: Backdrop
/// └────┬─────┘
///      │
///      ▼
/// ┌──────────┐
/// │ Captions │ ◄── Depends on: Backdrop + Slots
/// └────┬─────┘
///      │
///      ▼
/// ┌─────────────┐
/// │  Composite  │ ◄── Depends on: all layers
/// └─────────────┘
/// ```
#[derive(Default)]
pub struct LayerPipeline {
    pub backdrop: Layer<BackdropConfig>,
    pub slots: Layer<SlotsConfig>,
    pub captions: Layer<CaptionsConfig>,
    pub composite: CompositeLayer,
    placed: PlacedSlots,
}

impl LayerPipeline {
    /// Returns a snapshot of all layer versions.
    pub fn layer_versions(&self) -> LayerVersions {
        LayerVersions {
            backdrop: self.backdrop.version(),
            slots: self.slots.version(),
            captions: self.captions.version(),
        }
    }

    /// Screenshot rectangles of the most recent render, in paint order.
    pub fn placed_slots(&self) -> &[RectPx] {
        &self.placed.0
    }

    /// Invalidates all caches.
    pub fn invalidate_all(&mut self) {
        self.backdrop.invalidate();
        self.slots.invalidate();
        self.captions.invalidate();
        self.composite.invalidate();
    }

    fn composite_dependencies(&self) -> DependencyVersion {
        DependencyVersion::combine(&[
            self.backdrop.version(),
            self.slots.version(),
            self.captions.version(),
        ])
    }

    /// Renders a canvas of `size` through all layers.
    ///
    /// Checks the composite cache first, then runs each layer in z-order
    /// over a white starting canvas and caches the result.
    pub fn render(&mut self, size: SizePx, fonts: &dyn FontResolver) -> ComposeResult<Canvas> {
        let key = CacheKey::from_size(size);
        let composite_deps = self.composite_dependencies();

        if let Some(cached) = self.composite.get_cached(key, composite_deps) {
            return Ok(cached.clone());
        }

        let mut ctx = RenderContext::new(Canvas::filled(size, Rgb8::WHITE)?, fonts);

        let versions = self.layer_versions();
        self.backdrop.apply(&mut ctx, key, &versions)?;
        self.slots.apply(&mut ctx, key, &versions)?;
        self.captions.apply(&mut ctx, key, &versions)?;

        self.placed = ctx.get::<PlacedSlots>().cloned().unwrap_or_default();
        self.composite.store(key, ctx.canvas.clone(), composite_deps);
        Ok(ctx.canvas)
    }
}
