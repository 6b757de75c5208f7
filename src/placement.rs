//! Pointer-driven text placement.
//!
//! [`PlacementStore`] holds one anchor per text item and a two-state drag
//! machine. It knows nothing about windows or widgets: a UI feeds it
//! pointer positions in canvas coordinates (see [`DisplayMapping`]) and
//! reads the anchors back.

use crate::asset::{PointPx, SizePx};

/// Half-width of the box around an anchor that accepts a pointer-down.
pub const HIT_HALF_WIDTH: i64 = 300;
/// Half-height of the box around an anchor that accepts a pointer-down.
pub const HIT_HALF_HEIGHT: i64 = 100;

/// Converts between on-screen preview coordinates and canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMapping {
    /// Display pixels per canvas pixel.
    pub scale: f64,
}

impl Default for DisplayMapping {
    fn default() -> Self {
        Self { scale: 0.4 }
    }
}

impl DisplayMapping {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    /// Canvas pixel under a display position, truncated.
    pub fn to_canvas(&self, x: f64, y: f64) -> PointPx {
        // Nudge past float error so exact multiples land on their pixel.
        let convert = |v: f64| (v / self.scale + 1e-9).floor() as i64;
        PointPx::new(convert(x), convert(y))
    }

    pub fn to_display(&self, point: PointPx) -> (f64, f64) {
        (point.x as f64 * self.scale, point.y as f64 * self.scale)
    }

    /// Size of the preview for a canvas of `canvas` size.
    pub fn display_size(&self, canvas: SizePx) -> SizePx {
        SizePx::new(
            ((f64::from(canvas.width) * self.scale) as u32).max(1),
            ((f64::from(canvas.height) * self.scale) as u32).max(1),
        )
    }
}

/// Drag machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// `grab_offset` is the pointer position minus the item anchor at the
    /// moment the drag started.
    Dragging { index: usize, grab_offset: PointPx },
}

/// Anchors of draggable items plus the current drag state.
#[derive(Debug, Clone, Default)]
pub struct PlacementStore {
    anchors: Vec<PointPx>,
    state: DragState,
}

impl PlacementStore {
    pub fn new(anchors: Vec<PointPx>) -> Self {
        Self {
            anchors,
            state: DragState::Idle,
        }
    }

    pub fn anchors(&self) -> &[PointPx] {
        &self.anchors
    }

    pub fn anchor(&self, index: usize) -> Option<PointPx> {
        self.anchors.get(index).copied()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Appends an item and returns its index.
    pub fn add(&mut self, anchor: PointPx) -> usize {
        self.anchors.push(anchor);
        self.anchors.len() - 1
    }

    /// Moves an item without touching the drag state.
    pub fn set_anchor(&mut self, index: usize, anchor: PointPx) -> bool {
        match self.anchors.get_mut(index) {
            Some(slot) => {
                *slot = anchor;
                true
            }
            None => false,
        }
    }

    /// Removes an item. A drag on that item ends; a drag on a later item
    /// follows it to its new index.
    pub fn remove(&mut self, index: usize) -> Option<PointPx> {
        if index >= self.anchors.len() {
            return None;
        }
        if let DragState::Dragging { index: dragged, grab_offset } = self.state {
            self.state = match dragged.cmp(&index) {
                std::cmp::Ordering::Equal => DragState::Idle,
                std::cmp::Ordering::Greater => DragState::Dragging {
                    index: dragged - 1,
                    grab_offset,
                },
                std::cmp::Ordering::Less => self.state,
            };
        }
        Some(self.anchors.remove(index))
    }

    /// Index of the item whose hit box contains `point`. When boxes
    /// overlap the topmost (last painted) item wins, not the first one in
    /// list order.
    pub fn hit_test(&self, point: PointPx) -> Option<usize> {
        // Captions paint in list order, so scan from the back.
        self.anchors.iter().rposition(|anchor| {
            (point.x - anchor.x).abs() < HIT_HALF_WIDTH && (point.y - anchor.y).abs() < HIT_HALF_HEIGHT
        })
    }

    /// Starts a drag if `point` hits an item. Ignored while a drag is
    /// already in progress. Returns the grabbed index.
    pub fn pointer_down(&mut self, point: PointPx) -> Option<usize> {
        if self.is_dragging() {
            return None;
        }
        let index = self.hit_test(point)?;
        self.state = DragState::Dragging {
            index,
            grab_offset: point - self.anchors[index],
        };
        tracing::debug!(index, x = point.x, y = point.y, "drag started");
        Some(index)
    }

    /// Moves the dragged item so the grab offset is preserved. Returns the
    /// item index and its new anchor, or `None` when idle.
    pub fn pointer_move(&mut self, point: PointPx) -> Option<(usize, PointPx)> {
        let DragState::Dragging { index, grab_offset } = self.state else {
            return None;
        };
        let anchor = point - grab_offset;
        let slot = self.anchors.get_mut(index)?;
        *slot = anchor;
        Some((index, anchor))
    }

    /// Ends any drag.
    pub fn pointer_up(&mut self) {
        if let DragState::Dragging { index, .. } = self.state {
            tracing::debug!(index, "drag ended");
        }
        self.state = DragState::Idle;
    }
}
