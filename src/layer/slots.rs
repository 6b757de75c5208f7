//! Slots layer: scales, frames and places the screenshots.

use std::sync::Arc;

use super::{DependencyVersion, LayerConfig, LayerEffect, LayerVersions, RenderContext};
use crate::asset::{ImageAsset, RectPx, SizePx};
use crate::error::ComposeResult;
use crate::layout::{self, LayoutOptions, SlotPlan};

/// Canvas rectangles occupied by the screenshots, in paint order.
///
/// Emitted by the slots layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlacedSlots(pub Vec<RectPx>);

/// Configuration for the slots layer.
///
/// Screenshots are shared behind an `Arc` so unchanged inputs compare by
/// pointer before falling back to a pixel comparison.
#[derive(Debug, Clone)]
pub struct SlotsConfig {
    pub screenshots: Arc<[ImageAsset]>,
    pub options: LayoutOptions,
}

impl SlotsConfig {
    pub fn new(screenshots: Arc<[ImageAsset]>, options: LayoutOptions) -> Self {
        Self {
            screenshots,
            options,
        }
    }

    /// Slot geometry for a canvas of `canvas` size.
    pub fn plan(&self, canvas: SizePx) -> Vec<SlotPlan> {
        let sources: Vec<SizePx> = self.screenshots.iter().map(ImageAsset::dimensions).collect();
        layout::plan_slots(&sources, canvas, &self.options)
    }
}

impl LayerConfig for SlotsConfig {
    fn differs_from(&self, other: &Self) -> bool {
        self.options != other.options
            || !(Arc::ptr_eq(&self.screenshots, &other.screenshots)
                || self.screenshots == other.screenshots)
    }
}

impl LayerEffect for SlotsConfig {
    /// Slots are painted over the backdrop.
    fn dependencies(versions: &LayerVersions) -> DependencyVersion {
        DependencyVersion::from_version(versions.backdrop)
    }

    fn transform(&self, ctx: &mut RenderContext<'_>) -> ComposeResult<()> {
        let plans = self.plan(ctx.canvas.size());
        let slots = layout::render_slots(&self.screenshots, &plans, self.options.frame.as_ref())?;
        layout::paste_slots(&mut ctx.canvas, &slots);
        Ok(())
    }

    fn emit(&self, ctx: &mut RenderContext<'_>) {
        let rects = self.plan(ctx.canvas.size()).into_iter().map(|p| p.rect).collect();
        ctx.set(PlacedSlots(rects));
    }
}
