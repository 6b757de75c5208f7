//! Captions layer: draws text items on top of everything else.

use super::{DependencyVersion, LayerConfig, LayerEffect, LayerVersions, RenderContext};
use crate::error::ComposeResult;
use crate::text::{self, TextItem};

/// Configuration for the captions layer. Items paint in list order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaptionsConfig {
    pub items: Vec<TextItem>,
}

impl CaptionsConfig {
    pub fn new(items: Vec<TextItem>) -> Self {
        Self { items }
    }
}

impl LayerConfig for CaptionsConfig {
    fn differs_from(&self, other: &Self) -> bool {
        self.items != other.items
    }
}

impl LayerEffect for CaptionsConfig {
    /// Captions are painted over the backdrop and slots image, so either
    /// one changing invalidates them.
    fn dependencies(versions: &LayerVersions) -> DependencyVersion {
        DependencyVersion::combine(&[versions.backdrop, versions.slots])
    }

    fn transform(&self, ctx: &mut RenderContext<'_>) -> ComposeResult<()> {
        text::draw_items(&mut ctx.canvas, &self.items, ctx.fonts);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::SizePx;
    use crate::canvas::Canvas;
    use crate::color::Rgb8;
    use crate::text::{FallbackFontResolver, TextPosition};

    #[test]
    fn paints_items_in_order() {
        let fonts = FallbackFontResolver;
        let canvas = Canvas::filled(SizePx::new(600, 400), Rgb8::WHITE).unwrap();
        let mut ctx = RenderContext::new(canvas, &fonts);

        let first = TextItem::new("X", TextPosition::Top).with_color(Rgb8::new(255, 0, 0));
        let mut second = first.clone().with_color(Rgb8::new(0, 0, 255));
        second.anchor = Some(crate::asset::PointPx::new(300, 110));
        CaptionsConfig::new(vec![first, second])
            .transform(&mut ctx)
            .unwrap();

        // Both blocks land on the same spot; the later one wins.
        assert_eq!(ctx.canvas.pixel(300, 150).0, [0, 0, 255, 255]);
    }

    #[test]
    fn item_edits_are_detected() {
        let a = CaptionsConfig::new(vec![TextItem::new("a", TextPosition::Top)]);
        let mut b = a.clone();
        assert!(!a.differs_from(&b));
        b.items[0].content.push('!');
        assert!(a.differs_from(&b));
    }
}
