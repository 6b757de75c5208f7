//! Screenshot placement: one centered device, or three staggered and
//! angled ones.
//!
//! Placement is split in two steps. [`plan_slots`] works purely on sizes
//! and yields the final rectangle of every slot; [`render_slots`] produces
//! the pixels. Both use the same size arithmetic, so the planned
//! rectangles match the rendered assets exactly.

use serde::{Deserialize, Serialize};

use crate::asset::{ImageAsset, RectPx, SizePx};
use crate::canvas::Canvas;
use crate::error::ComposeResult;
use crate::frame::{self, FrameSpec};
use crate::geometry::{self, ScaleSpec};
use crate::perspective;
use crate::raster;
use crate::text::TextPosition;

/// How many screenshots appear and how they are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    #[default]
    Single,
    Triple,
}

/// Size budget for the single layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum SinglePolicy {
    /// 75% of the width, 70% of the height.
    #[default]
    Standard,
    /// 80% of the width, 85% of the height.
    Compact,
}

impl SinglePolicy {
    pub fn scale_spec(self) -> ScaleSpec {
        match self {
            Self::Standard => ScaleSpec::new(0.75, 0.70),
            Self::Compact => ScaleSpec::new(0.80, 0.85),
        }
    }
}

const SINGLE_UPSHIFT: f64 = 0.8;
const SINGLE_TOP_TEXT_Y: f64 = 0.35;
const SINGLE_BOTTOM_TEXT_Y: f64 = 0.15;

const TRIPLE_SCALE: ScaleSpec = ScaleSpec::new(0.28, 0.65);
const TRIPLE_ANGLES: [f32; 3] = [-12.0, 0.0, 12.0];
const TRIPLE_DEPTH_SCALE: f32 = 0.95;
const TRIPLE_SPACING: i64 = 20;
const TRIPLE_STAGGER: i64 = 30;

/// Everything the layout engine needs besides the screenshots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    pub kind: LayoutKind,
    /// Where text goes, if there is any.
    pub text_intent: Option<TextPosition>,
    /// `None` places bare screenshots.
    pub frame: Option<FrameSpec>,
    /// Angles the outer slots of the triple layout.
    pub perspective: bool,
    pub single_policy: SinglePolicy,
    /// Additional downward shift of the single slot, as a fraction of the
    /// canvas height.
    pub extra_offset_ratio: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            kind: LayoutKind::Single,
            text_intent: None,
            frame: Some(FrameSpec::default()),
            perspective: true,
            single_policy: SinglePolicy::Standard,
            extra_offset_ratio: 0.0,
        }
    }
}

/// Geometry of one slot, computed without touching pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotPlan {
    /// Index into the screenshot list.
    pub source: usize,
    /// Size of the screenshot after scaling, before framing.
    pub scaled: SizePx,
    pub rotation_angle: f32,
    pub post_rotation_scale: f32,
    /// Final rectangle on the canvas.
    pub rect: RectPx,
}

/// A rendered slot ready to paste. `asset` already has framing, rotation
/// and depth scale applied; `position` is its top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSlot {
    pub asset: ImageAsset,
    pub position: (i64, i64),
    pub rotation_angle: f32,
    pub post_rotation_scale: f32,
}

impl LayoutSlot {
    pub fn bounds(&self) -> RectPx {
        RectPx::new(
            self.position.0,
            self.position.1,
            self.asset.width(),
            self.asset.height(),
        )
    }
}

/// Size of a slot's final image given its screenshot's scaled size.
fn slot_size(scaled: SizePx, frame: Option<&FrameSpec>, angle: f32, scale: f32) -> SizePx {
    let framed = frame.map_or(scaled, |f| f.outer_size(scaled));
    let rotated = if angle == 0.0 {
        framed
    } else {
        perspective::rotated_bounds(framed, angle)
    };
    if (scale - 1.0).abs() < f32::EPSILON {
        return rotated;
    }
    SizePx::new(
        ((rotated.width as f32 * scale).round() as u32).max(1),
        ((rotated.height as f32 * scale).round() as u32).max(1),
    )
}

/// Computes slot rectangles for `sources` (screenshot sizes) on `canvas`.
///
/// The single layout uses the first screenshot only. The triple layout
/// cycles through the list until three slots are filled. No screenshots
/// means no slots.
pub fn plan_slots(sources: &[SizePx], canvas: SizePx, options: &LayoutOptions) -> Vec<SlotPlan> {
    if sources.is_empty() {
        return Vec::new();
    }
    match options.kind {
        LayoutKind::Single => vec![plan_single(sources[0], canvas, options)],
        LayoutKind::Triple => plan_triple(sources, canvas, options),
    }
}

fn plan_single(source: SizePx, canvas: SizePx, options: &LayoutOptions) -> SlotPlan {
    let scaled = geometry::fit_size(source, canvas, options.single_policy.scale_spec());
    let size = slot_size(scaled, options.frame.as_ref(), 0.0, 1.0);
    let canvas_h = f64::from(canvas.height);

    let x = (i64::from(canvas.width) - i64::from(size.width)).div_euclid(2);
    let centered = (i64::from(canvas.height) - i64::from(size.height)).div_euclid(2);
    let mut y = match options.text_intent {
        Some(TextPosition::Top) => (canvas_h * SINGLE_TOP_TEXT_Y) as i64,
        Some(TextPosition::Bottom) => (canvas_h * SINGLE_BOTTOM_TEXT_Y) as i64,
        Some(TextPosition::Center) | None => (centered as f64 * SINGLE_UPSHIFT) as i64,
    };
    y += (canvas_h * options.extra_offset_ratio) as i64;

    SlotPlan {
        source: 0,
        scaled,
        rotation_angle: 0.0,
        post_rotation_scale: 1.0,
        rect: RectPx::new(x, y, size.width, size.height),
    }
}

fn plan_triple(sources: &[SizePx], canvas: SizePx, options: &LayoutOptions) -> Vec<SlotPlan> {
    let mut plans: Vec<SlotPlan> = (0..sources.len())
        .cycle()
        .take(TRIPLE_ANGLES.len())
        .zip(TRIPLE_ANGLES)
        .map(|(source, angle)| {
            let (angle, scale) = if options.perspective && angle != 0.0 {
                (angle, TRIPLE_DEPTH_SCALE)
            } else {
                (0.0, 1.0)
            };
            let scaled = geometry::fit_size(sources[source], canvas, TRIPLE_SCALE);
            let size = slot_size(scaled, options.frame.as_ref(), angle, scale);
            SlotPlan {
                source,
                scaled,
                rotation_angle: angle,
                post_rotation_scale: scale,
                rect: RectPx::new(0, 0, size.width, size.height),
            }
        })
        .collect();

    let total: i64 = plans.iter().map(|p| i64::from(p.rect.width)).sum::<i64>()
        + TRIPLE_SPACING * (plans.len() as i64 - 1);
    let start_x = (i64::from(canvas.width) - total).div_euclid(2);
    let ratio = match options.text_intent {
        Some(TextPosition::Top) => 0.4,
        Some(TextPosition::Bottom) => 0.2,
        Some(TextPosition::Center) | None => 0.3,
    };
    let start_y = (f64::from(canvas.height) * ratio) as i64;

    let mut x = start_x;
    for (i, plan) in plans.iter_mut().enumerate() {
        plan.rect.x = x;
        plan.rect.y = start_y + (i as i64 % 2) * TRIPLE_STAGGER;
        x += i64::from(plan.rect.width) + TRIPLE_SPACING;
    }
    plans
}

/// Renders the planned slots: scale, frame, then rotate and shrink.
pub fn render_slots(
    screenshots: &[ImageAsset],
    plans: &[SlotPlan],
    frame: Option<&FrameSpec>,
) -> ComposeResult<Vec<LayoutSlot>> {
    plans
        .iter()
        .map(|plan| {
            let scaled = geometry::resize(&screenshots[plan.source], plan.scaled);
            let framed = match frame {
                Some(spec) => frame::frame_screenshot(&scaled, spec)?,
                None => scaled,
            };
            let asset = perspective::apply_perspective(
                &framed,
                plan.rotation_angle,
                plan.post_rotation_scale,
            )?;
            debug_assert_eq!(asset.dimensions(), SizePx::new(plan.rect.width, plan.rect.height));
            Ok(LayoutSlot {
                asset,
                position: (plan.rect.x, plan.rect.y),
                rotation_angle: plan.rotation_angle,
                post_rotation_scale: plan.post_rotation_scale,
            })
        })
        .collect()
}

/// Plans and renders slots for `screenshots` on a canvas of `canvas` size.
pub fn layout_screenshots(
    screenshots: &[ImageAsset],
    canvas: SizePx,
    options: &LayoutOptions,
) -> ComposeResult<Vec<LayoutSlot>> {
    let sources: Vec<SizePx> = screenshots.iter().map(ImageAsset::dimensions).collect();
    let plans = plan_slots(&sources, canvas, options);
    tracing::debug!(kind = ?options.kind, slots = plans.len(), "planned layout");
    render_slots(screenshots, &plans, options.frame.as_ref())
}

/// Pastes slots back to front in slot order.
pub fn paste_slots(canvas: &mut Canvas, slots: &[LayoutSlot]) {
    for slot in slots {
        let (x, y) = slot.position;
        raster::composite_over(canvas.image_mut(), slot.asset.data(), x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb8;
    use image::{Rgba, RgbaImage};
    use proptest::prelude::*;

    const CANVAS: SizePx = SizePx::new(1290, 2796);
    const PHONE: SizePx = SizePx::new(1179, 2556);

    fn options(kind: LayoutKind) -> LayoutOptions {
        LayoutOptions {
            kind,
            ..LayoutOptions::default()
        }
    }

    #[test]
    fn single_is_centered_and_lifted() {
        let plans = plan_slots(&[PHONE], CANVAS, &options(LayoutKind::Single));
        let plan = plans[0];
        // Standard policy hits the 70% height budget: 1957 rows, 902 columns.
        assert_eq!(plan.scaled, SizePx::new(902, 1957));
        assert_eq!(plan.rect.width, 902 + 100);
        assert_eq!(plan.rect.height, 1957 + 100);
        assert_eq!(plan.rect.x, (1290 - 1002) / 2);
        let centered = (2796 - 2057) / 2;
        assert_eq!(plan.rect.y, (centered as f64 * 0.8) as i64);
        assert!(plan.rect.y < centered);
    }

    #[test]
    fn single_follows_text_intent_and_extra_offset() {
        let mut opts = options(LayoutKind::Single);
        opts.text_intent = Some(TextPosition::Top);
        assert_eq!(plan_slots(&[PHONE], CANVAS, &opts)[0].rect.y, 978);

        opts.text_intent = Some(TextPosition::Bottom);
        assert_eq!(plan_slots(&[PHONE], CANVAS, &opts)[0].rect.y, 419);

        opts.extra_offset_ratio = 0.14;
        assert_eq!(plan_slots(&[PHONE], CANVAS, &opts)[0].rect.y, 419 + 391);
    }

    #[test]
    fn compact_policy_is_larger() {
        let mut opts = options(LayoutKind::Single);
        opts.single_policy = SinglePolicy::Compact;
        opts.frame = None;
        let plan = plan_slots(&[PHONE], CANVAS, &opts)[0];
        assert_eq!(plan.rect.width, 1032);
        assert_eq!(plan.rect.height, 2237);
    }

    #[test]
    fn triple_angles_and_stagger() {
        let plans = plan_slots(&[PHONE], CANVAS, &options(LayoutKind::Triple));
        assert_eq!(plans.len(), 3);
        let angles: Vec<f32> = plans.iter().map(|p| p.rotation_angle).collect();
        assert_eq!(angles, vec![-12.0, 0.0, 12.0]);
        assert_eq!(plans[1].post_rotation_scale, 1.0);
        assert_eq!(plans[0].post_rotation_scale, 0.95);

        let start_y = (2796.0 * 0.3) as i64;
        assert_eq!(plans[0].rect.y, start_y);
        assert_eq!(plans[1].rect.y, start_y + 30);
        assert_eq!(plans[2].rect.y, start_y);
        assert_eq!(plans[1].rect.x, plans[0].rect.right() + 20);
        assert_eq!(plans[2].rect.x, plans[1].rect.right() + 20);
    }

    #[test]
    fn triple_group_is_centered() {
        let plans = plan_slots(&[PHONE], CANVAS, &options(LayoutKind::Triple));
        let left = plans[0].rect.x;
        let right = plans[2].rect.right();
        assert!((left - (1290 - right)).abs() <= 1);
    }

    #[test]
    fn triple_without_perspective_is_flat() {
        let mut opts = options(LayoutKind::Triple);
        opts.perspective = false;
        let plans = plan_slots(&[PHONE], CANVAS, &opts);
        assert!(plans.iter().all(|p| p.rotation_angle == 0.0));
        assert_eq!(plans[0].rect.width, plans[1].rect.width);
    }

    #[test]
    fn no_screenshots_no_slots() {
        assert!(plan_slots(&[], CANVAS, &options(LayoutKind::Triple)).is_empty());
        assert!(plan_slots(&[], CANVAS, &options(LayoutKind::Single)).is_empty());
    }

    #[test]
    fn rendered_slots_match_plans() {
        let canvas = SizePx::new(300, 600);
        let shot = ImageAsset::new(RgbaImage::from_pixel(60, 120, Rgba([0, 200, 0, 255])));
        let opts = LayoutOptions {
            kind: LayoutKind::Triple,
            frame: Some(FrameSpec {
                shadow_blur_radius: 2,
                ..FrameSpec::default()
            }),
            ..LayoutOptions::default()
        };
        let slots = layout_screenshots(&[shot.clone(), shot], canvas, &opts).unwrap();
        let plans = plan_slots(&[SizePx::new(60, 120); 2], canvas, &opts);
        assert_eq!(slots.len(), 3);
        for (slot, plan) in slots.iter().zip(&plans) {
            assert_eq!(slot.bounds(), plan.rect);
        }

        let mut target = Canvas::filled(canvas, Rgb8::WHITE).unwrap();
        paste_slots(&mut target, &slots);
        let (cx, cy) = slots[1].bounds().center();
        let px = target.pixel(cx as u32, cy as u32);
        assert!(px[0] < 10 && px[1] > 190 && px[3] == 255);
    }

    proptest! {
        #[test]
        fn triple_always_fills_three_slots(count in 1usize..6) {
            let sources: Vec<SizePx> = (0..count)
                .map(|i| SizePx::new(100 + i as u32 * 10, 200))
                .collect();
            let plans = plan_slots(&sources, CANVAS, &options(LayoutKind::Triple));
            prop_assert_eq!(plans.len(), 3);
            let used: Vec<usize> = plans.iter().map(|p| p.source).collect();
            let expected: Vec<usize> = (0..count).cycle().take(3).collect();
            prop_assert_eq!(used, expected);
        }
    }
}
