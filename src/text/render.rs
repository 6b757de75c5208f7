//! Line layout and glyph drawing for caption blocks.

use crate::asset::SizePx;
use crate::canvas::Canvas;
use crate::raster;

use super::font::{FontResolver, TextFont};
use super::wrap::wrap_text;
use super::{TextItem, TextPosition, TextShadow};

/// Horizontal margin kept free on both sides of wrapped text.
pub const TEXT_MARGIN: u32 = 60;

/// Space between consecutive blocks stacked at the same position.
pub const BLOCK_GAP: f32 = 20.0;

/// A positioned line of text. `x` and `y` are the pen's left edge and the
/// line top.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub x: i64,
    pub y: i64,
    pub width: f32,
}

/// The laid-out lines of one [`TextItem`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// Index of the item in the input list.
    pub item: usize,
    pub lines: Vec<TextLine>,
    pub top: f32,
    /// Top plus one line height per line.
    pub bottom: f32,
}

/// First line top for blocks stacked at `position`.
pub fn stack_origin(position: TextPosition, canvas_height: u32) -> f32 {
    let height = canvas_height as f32;
    match position {
        TextPosition::Top => (TEXT_MARGIN + 50) as f32,
        TextPosition::Center => (height / 2.0).floor() - 100.0,
        TextPosition::Bottom => height - 400.0,
    }
}

/// Wraps `content` to `max_width` and centers each line on `center_x`.
pub fn layout_block(
    item: usize,
    font: &TextFont,
    content: &str,
    center_x: f32,
    top: f32,
    max_width: f32,
    leading: f32,
) -> TextBlock {
    let line_height = font.line_height(leading);
    let lines: Vec<TextLine> = wrap_text(content, max_width, |s| font.measure(s))
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let width = font.measure(&text);
            TextLine {
                x: (center_x - width / 2.0).floor() as i64,
                y: (top + i as f32 * line_height).floor() as i64,
                width,
                text,
            }
        })
        .collect();

    let bottom = top + lines.len() as f32 * line_height;
    TextBlock {
        item,
        lines,
        top,
        bottom,
    }
}

/// Lays out every item for a canvas of `canvas` size.
///
/// Anchored items are placed at their anchor. The rest are stacked in
/// input order per [`TextPosition`], each block starting [`BLOCK_GAP`]
/// below the previous one.
pub fn layout_items(
    items: &[TextItem],
    canvas: SizePx,
    fonts: &dyn FontResolver,
) -> Vec<(TextFont, TextBlock)> {
    let max_width = canvas.width.saturating_sub(2 * TEXT_MARGIN).max(1) as f32;
    let center_x = (canvas.width / 2) as f32;
    let mut cursors = [TextPosition::Top, TextPosition::Center, TextPosition::Bottom]
        .map(|p| (p, stack_origin(p, canvas.height)));

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let font = fonts.resolve(&item.font_request());
            let block = match item.anchor {
                Some(anchor) => layout_block(
                    index,
                    &font,
                    &item.content,
                    anchor.x as f32,
                    anchor.y as f32,
                    max_width,
                    item.leading,
                ),
                None => {
                    let cursor = cursors
                        .iter_mut()
                        .find(|(p, _)| *p == item.position)
                        .map(|(_, y)| y);
                    let top = cursor.as_deref().copied().unwrap_or_default();
                    let block = layout_block(
                        index,
                        &font,
                        &item.content,
                        center_x,
                        top,
                        max_width,
                        item.leading,
                    );
                    if let Some(y) = cursor {
                        *y = block.bottom + BLOCK_GAP;
                    }
                    block
                }
            };
            (font, block)
        })
        .collect()
}

/// Paints one block: shadow pass first, then the glyphs.
pub fn draw_block(
    canvas: &mut Canvas,
    font: &TextFont,
    block: &TextBlock,
    color: crate::color::Rgb8,
    shadow: Option<TextShadow>,
) {
    for line in &block.lines {
        let glyphs = font.rasterize(&line.text);
        let x = line.x + glyphs.offset_x;
        let y = line.y + glyphs.offset_y;
        if let Some(shadow) = shadow {
            raster::blend_mask(
                canvas.image_mut(),
                &glyphs.mask,
                x + shadow.dx,
                y + shadow.dy,
                shadow.color.to_rgba(),
            );
        }
        raster::blend_mask(canvas.image_mut(), &glyphs.mask, x, y, color.to_rgba());
    }
}

/// Lays out and paints `items` in order, later items on top.
pub fn draw_items(canvas: &mut Canvas, items: &[TextItem], fonts: &dyn FontResolver) -> Vec<TextBlock> {
    let laid_out = layout_items(items, canvas.size(), fonts);
    laid_out
        .into_iter()
        .map(|(font, block)| {
            let item = &items[block.item];
            draw_block(canvas, &font, &block, item.color, item.shadow);
            tracing::debug!(item = block.item, lines = block.lines.len(), top = block.top, "drew text block");
            block
        })
        .collect()
}
