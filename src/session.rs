//! Interactive text placement over a live composition.
//!
//! An [`InteractiveSession`] couples a [`Composer`] with a
//! [`PlacementStore`]. The host forwards pointer events in preview
//! coordinates; every move during a drag re-renders the composition and
//! returns a preview scaled by the [`DisplayMapping`]. Only the captions
//! layer is repainted for these updates.

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::asset::PointPx;
use crate::canvas::Canvas;
use crate::composer::Composer;
use crate::error::ComposeResult;
use crate::placement::{DisplayMapping, PlacementStore};
use crate::text::{TextItem, layout_items};

/// Anchor given to text added without one.
pub const DEFAULT_NEW_TEXT_Y: i64 = 200;

pub struct InteractiveSession {
    composer: Composer,
    store: PlacementStore,
    mapping: DisplayMapping,
}

impl InteractiveSession {
    /// Starts a session on `composer`'s current text items.
    ///
    /// Items without an anchor stay in their stacked position until they
    /// are first dragged; their hit boxes follow the stack. The screenshot
    /// layout is locked for the whole session.
    pub fn new(mut composer: Composer) -> Self {
        composer.lock_layout();
        let mut session = Self {
            composer,
            store: PlacementStore::default(),
            mapping: DisplayMapping::default(),
        };
        let anchors = session.effective_anchors();
        session.store = PlacementStore::new(anchors);
        session
    }

    pub fn with_mapping(mut self, mapping: DisplayMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn placements(&self) -> &PlacementStore {
        &self.store
    }

    pub fn mapping(&self) -> DisplayMapping {
        self.mapping
    }

    /// Ends the session and hands back the composer with its pinned items.
    /// The layout stays locked.
    pub fn into_composer(self) -> Composer {
        self.composer
    }

    /// Adds a text item and returns its index. Items without an anchor are
    /// pinned horizontally centered at [`DEFAULT_NEW_TEXT_Y`].
    pub fn add_text(&mut self, mut item: TextItem) -> usize {
        let anchor = *item.anchor.get_or_insert_with(|| {
            let width = self.composer.config().canvas_width;
            PointPx::new(i64::from(width / 2), DEFAULT_NEW_TEXT_Y)
        });
        let mut items = self.composer.text_items().to_vec();
        items.push(item);
        self.composer.set_text_items(items);
        let index = self.store.add(anchor);
        tracing::debug!(index, x = anchor.x, y = anchor.y, "text added");
        index
    }

    pub fn remove_text(&mut self, index: usize) -> Option<TextItem> {
        let mut items = self.composer.text_items().to_vec();
        if index >= items.len() {
            return None;
        }
        let removed = items.remove(index);
        self.composer.set_text_items(items);
        self.store.remove(index);
        self.refresh_unanchored();
        Some(removed)
    }

    /// Starts dragging the text under a preview position. Returns the
    /// grabbed item.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> Option<usize> {
        self.store.pointer_down(self.mapping.to_canvas(x, y))
    }

    /// Moves the dragged text, if any, and returns the updated preview.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> ComposeResult<Option<RgbaImage>> {
        let Some((index, anchor)) = self.store.pointer_move(self.mapping.to_canvas(x, y)) else {
            return Ok(None);
        };
        let mut items = self.composer.text_items().to_vec();
        if let Some(item) = items.get_mut(index) {
            item.anchor = Some(anchor);
        }
        self.composer.set_text_items(items);
        self.refresh_unanchored();
        self.preview().map(Some)
    }

    pub fn pointer_up(&mut self) {
        self.store.pointer_up();
    }

    /// Full-resolution render.
    pub fn render(&mut self) -> ComposeResult<Canvas> {
        self.composer.render()
    }

    /// Render scaled to the preview size.
    pub fn preview(&mut self) -> ComposeResult<RgbaImage> {
        let canvas = self.composer.render()?;
        let size = self.mapping.display_size(canvas.size());
        Ok(imageops::resize(
            canvas.image(),
            size.width,
            size.height,
            FilterType::Lanczos3,
        ))
    }

    /// Anchor of every item as drawn: its own anchor when pinned, else the
    /// canvas center column at the top of its stacked block.
    fn effective_anchors(&self) -> Vec<PointPx> {
        let config = self.composer.config();
        let size = config.canvas_size();
        let items = self.composer.text_items();
        layout_items(items, size, self.composer.fonts())
            .into_iter()
            .map(|(_, block)| {
                items[block.item].anchor.unwrap_or_else(|| {
                    PointPx::new(i64::from(size.width / 2), block.top.floor() as i64)
                })
            })
            .collect()
    }

    /// Stacked blocks move when an item above them is pinned or removed.
    fn refresh_unanchored(&mut self) {
        let anchors = self.effective_anchors();
        for (index, anchor) in anchors.into_iter().enumerate() {
            let pinned = self
                .composer
                .text_items()
                .get(index)
                .is_some_and(|item| item.anchor.is_some());
            if !pinned {
                self.store.set_anchor(index, anchor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{ImageAsset, SizePx};
    use crate::color::Rgb8;
    use crate::composer::Configurable;
    use crate::config::CompositionConfig;
    use crate::placement::DragState;
    use crate::text::TextPosition;
    use image::Rgba;

    fn session(items: Vec<TextItem>) -> InteractiveSession {
        let mut config = CompositionConfig::new().with_canvas_size(SizePx::new(1290, 2796));
        config.text_items = items;
        let mut composer = Composer::with_fallback_fonts();
        composer.apply_config(&config).unwrap();
        InteractiveSession::new(composer)
    }

    #[test]
    fn drag_moves_anchor_and_rerenders() {
        let item = TextItem::new("Drag", TextPosition::Top).with_anchor(PointPx::new(645, 200));
        let mut session = session(vec![item]);

        // Canvas (700, 230) at the default 0.4 preview scale.
        assert_eq!(session.pointer_down(280.0, 92.0), Some(0));
        let preview = session.pointer_move(320.0, 160.0).unwrap().unwrap();
        assert_eq!(preview.dimensions(), (516, 1118));
        session.pointer_up();

        assert_eq!(session.placements().state(), DragState::Idle);
        assert_eq!(
            session.composer().text_items()[0].anchor,
            Some(PointPx::new(745, 370))
        );
    }

    #[test]
    fn stacked_items_are_hit_where_drawn() {
        let mut session = session(vec![TextItem::title("Save time", TextPosition::Top)]);
        assert_eq!(session.placements().anchor(0), Some(PointPx::new(645, 110)));
        assert!(session.composer().text_items()[0].anchor.is_none());

        assert_eq!(session.pointer_down(258.0, 50.0), Some(0));
        session.pointer_move(258.0, 60.0).unwrap();
        assert!(session.composer().text_items()[0].anchor.is_some());
    }

    #[test]
    fn dragging_never_moves_the_screenshots() {
        let mut config = CompositionConfig::new();
        config.text_items = vec![TextItem::title("Save time", TextPosition::Top)];
        let mut composer = Composer::with_fallback_fonts();
        composer.apply_config(&config).unwrap();
        composer.set_screenshots(vec![ImageAsset::new(RgbaImage::from_pixel(
            118,
            256,
            Rgba([0, 0, 0, 255]),
        ))]);
        let mut session = InteractiveSession::new(composer);
        session.render().unwrap();
        let placed = session.composer().placed_slots().to_vec();
        let slots = session.composer().pipeline.slots.version();

        assert_eq!(session.pointer_down(258.0, 50.0), Some(0));
        session.pointer_move(258.4, 50.4).unwrap();
        session.pointer_up();

        assert!(session.composer().text_items()[0].anchor.is_some());
        assert_eq!(session.composer().pipeline.slots.version(), slots);
        assert_eq!(session.composer().placed_slots(), placed.as_slice());
    }

    #[test]
    fn move_without_drag_does_nothing() {
        let mut session = session(vec![TextItem::new("x", TextPosition::Top)]);
        let before = session.composer().pipeline.captions.version();
        assert!(session.pointer_move(10.0, 10.0).unwrap().is_none());
        assert_eq!(session.composer().pipeline.captions.version(), before);
    }

    #[test]
    fn added_text_gets_default_anchor() {
        let mut session = session(Vec::new());
        let index = session.add_text(TextItem::new("New", TextPosition::Top).with_color(Rgb8::BLACK));
        assert_eq!(index, 0);
        assert_eq!(session.placements().anchor(0), Some(PointPx::new(645, 200)));
        assert_eq!(
            session.composer().text_items()[0].anchor,
            Some(PointPx::new(645, 200))
        );

        assert!(session.remove_text(0).is_some());
        assert!(session.remove_text(0).is_none());
        assert!(session.placements().anchors().is_empty());
    }

    #[test]
    fn removing_a_stacked_item_lifts_the_next() {
        let mut session = session(vec![
            TextItem::title("One", TextPosition::Top),
            TextItem::subtitle("Two", TextPosition::Top),
        ]);
        assert!(session.placements().anchor(1).unwrap().y > 110);
        session.remove_text(0);
        assert_eq!(session.placements().anchor(0), Some(PointPx::new(645, 110)));
    }
}
