//! Backdrop layer: fills the canvas with the background.

use super::{DependencyVersion, LayerConfig, LayerEffect, LayerVersions, RenderContext};
use crate::background::{self, BackgroundSpec};
use crate::error::ComposeResult;

/// Configuration for the backdrop layer.
#[derive(Debug, Clone, PartialEq)]
pub struct BackdropConfig {
    pub background: BackgroundSpec,
}

impl BackdropConfig {
    pub fn new(background: BackgroundSpec) -> Self {
        Self { background }
    }
}

impl LayerConfig for BackdropConfig {
    fn differs_from(&self, other: &Self) -> bool {
        self != other
    }
}

impl LayerEffect for BackdropConfig {
    /// Backdrop is the root layer.
    fn dependencies(_versions: &LayerVersions) -> DependencyVersion {
        DependencyVersion::NONE
    }

    fn transform(&self, ctx: &mut RenderContext<'_>) -> ComposeResult<()> {
        ctx.canvas = background::generate(ctx.canvas.size(), &self.background)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::SizePx;
    use crate::background::GradientSpec;
    use crate::canvas::Canvas;
    use crate::color::Rgb8;
    use crate::text::FallbackFontResolver;

    #[test]
    fn replaces_the_whole_canvas() {
        let fonts = FallbackFontResolver;
        let start = Canvas::filled(SizePx::new(3, 5), Rgb8::WHITE).unwrap();
        let mut ctx = RenderContext::new(start, &fonts);

        BackdropConfig::new(BackgroundSpec::Gradient(GradientSpec::default()))
            .transform(&mut ctx)
            .unwrap();

        assert_eq!(ctx.canvas.size(), SizePx::new(3, 5));
        assert_eq!(ctx.canvas.pixel(0, 0).0, [74, 144, 226, 255]);
        assert_eq!(ctx.canvas.pixel(2, 4).0, [155, 89, 182, 255]);
    }

    #[test]
    fn equal_specs_do_not_differ() {
        let a = BackdropConfig::new(BackgroundSpec::Solid(Rgb8::BLACK));
        assert!(!a.differs_from(&a.clone()));
        assert!(a.differs_from(&BackdropConfig::new(BackgroundSpec::default())));
    }
}
