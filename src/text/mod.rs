//! Caption text: item model, fonts, wrapping and rendering.

pub mod font;
pub mod render;
pub mod wrap;

pub use font::{
    CachedFontResolver, FallbackFontResolver, FontFace, FontRequest, FontResolver,
    SystemFontResolver, TextFont,
};
pub use render::{TextBlock, TextLine, draw_items, layout_items};
pub use wrap::wrap_text;

use serde::{Deserialize, Serialize};

use crate::asset::PointPx;
use crate::color::{Rgb8, ShadowColor};

/// Coarse vertical placement for text; screenshots move out of its way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum TextPosition {
    #[default]
    Top,
    Center,
    Bottom,
}

/// Offset copy of the glyphs drawn beneath them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct TextShadow {
    pub dx: i64,
    pub dy: i64,
    pub color: ShadowColor,
}

impl Default for TextShadow {
    fn default() -> Self {
        Self {
            dx: 4,
            dy: 4,
            color: ShadowColor::new(Rgb8::BLACK, 100),
        }
    }
}

impl TextShadow {
    /// Shadow with the same offset on both axes.
    pub fn offset(offset: i64) -> Self {
        Self {
            dx: offset,
            dy: offset,
            ..Self::default()
        }
    }
}

fn default_family() -> String {
    "helvetica".to_owned()
}

fn default_font_size() -> f32 {
    90.0
}

fn default_color() -> Rgb8 {
    Rgb8::new(60, 120, 255)
}

fn default_leading() -> f32 {
    20.0
}

/// One block of caption text.
///
/// Without an `anchor` the block is stacked under the other blocks sharing
/// its `position`. With an anchor, lines are centered on `anchor.x` and
/// the first line's top sits at `anchor.y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct TextItem {
    pub content: String,
    #[serde(default)]
    pub position: TextPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<PointPx>,
    #[serde(default = "default_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_color")]
    pub color: Rgb8,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub shadow: Option<TextShadow>,
    /// Extra space between wrapped lines.
    #[serde(default = "default_leading")]
    pub leading: f32,
}

impl TextItem {
    pub fn new(content: impl Into<String>, position: TextPosition) -> Self {
        Self {
            content: content.into(),
            position,
            anchor: None,
            font_family: default_family(),
            font_size: default_font_size(),
            color: default_color(),
            bold: false,
            shadow: None,
            leading: default_leading(),
        }
    }

    /// Large bold heading with a drop shadow.
    pub fn title(content: impl Into<String>, position: TextPosition) -> Self {
        Self {
            bold: true,
            shadow: Some(TextShadow::default()),
            ..Self::new(content, position)
        }
    }

    /// Smaller grey line placed under a title.
    pub fn subtitle(content: impl Into<String>, position: TextPosition) -> Self {
        Self {
            font_size: 45.0,
            color: Rgb8::new(80, 80, 80),
            leading: 15.0,
            ..Self::new(content, position)
        }
    }

    pub fn with_color(mut self, color: Rgb8) -> Self {
        self.color = color;
        self
    }

    pub fn with_font(mut self, family: impl Into<String>, size: f32) -> Self {
        self.font_family = family.into();
        self.font_size = size;
        self
    }

    pub fn with_anchor(mut self, anchor: PointPx) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_shadow(mut self, shadow: Option<TextShadow>) -> Self {
        self.shadow = shadow;
        self
    }

    pub fn font_request(&self) -> FontRequest {
        FontRequest::new(self.font_family.clone(), self.font_size, self.bold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_and_subtitle_defaults() {
        let title = TextItem::title("Save time", TextPosition::Top);
        assert!(title.bold);
        assert_eq!(title.font_size, 90.0);
        assert_eq!(title.shadow, Some(TextShadow::default()));

        let subtitle = TextItem::subtitle("Plan less", TextPosition::Top);
        assert!(!subtitle.bold);
        assert_eq!(subtitle.color, Rgb8::new(80, 80, 80));
        assert!(subtitle.shadow.is_none());
    }

    #[test]
    fn deserializes_minimal_item() {
        let item: TextItem =
            serde_json::from_str(r##"{"content": "Hello", "position": "bottom", "color": "#ffffff"}"##)
                .unwrap();
        assert_eq!(item.position, TextPosition::Bottom);
        assert_eq!(item.color, Rgb8::WHITE);
        assert_eq!(item.font_family, "helvetica");
        assert!(item.anchor.is_none());
    }

    #[test]
    fn anchor_roundtrips() {
        let item = TextItem::new("x", TextPosition::Top).with_anchor(PointPx::new(645, 200));
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"anchor\":{\"x\":645,\"y\":200}"));
        let back: TextItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }
}
