//! Font resolution and glyph measurement.
//!
//! A [`FontResolver`] turns a family name into a [`FontFace`]. Resolution
//! never fails: when nothing matches, the built-in block face is used and a
//! `tracing` warning records the degraded result.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use ab_glyph::{Font as _, FontArc, FontVec, PxScale, ScaleFont};
use image::{GrayImage, Luma};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use resvg::usvg::fontdb;

use crate::error::{ComposeError, ComposeResult};

/// A request for a font at a given pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct FontRequest {
    pub family: String,
    pub size: f32,
    pub bold: bool,
}

impl FontRequest {
    pub fn new(family: impl Into<String>, size: f32, bold: bool) -> Self {
        Self {
            family: family.into(),
            size,
            bold,
        }
    }
}

// ============================================================================
// Faces
// ============================================================================

/// A size-independent typeface.
#[derive(Clone)]
pub enum FontFace {
    /// A real outline font loaded from font data.
    Outline { family: String, font: FontArc },
    /// Deterministic block glyphs with fixed metrics. Every visible
    /// character is a filled rectangle.
    Block,
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outline { family, .. } => f.debug_struct("Outline").field("family", family).finish(),
            Self::Block => f.write_str("Block"),
        }
    }
}

impl FontFace {
    /// Loads an outline face from raw font file bytes.
    pub fn from_data(family: impl Into<String>, data: Vec<u8>, index: u32) -> ComposeResult<Self> {
        let family = family.into();
        let font = FontVec::try_from_vec_and_index(data, index)
            .map_err(|e| ComposeError::asset_load(family.clone(), e))?;
        Ok(Self::Outline {
            family,
            font: FontArc::new(font),
        })
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Block)
    }

    pub fn family(&self) -> Option<&str> {
        match self {
            Self::Outline { family, .. } => Some(family),
            Self::Block => None,
        }
    }

    pub fn at_size(self, size: f32) -> TextFont {
        TextFont::new(self, size)
    }
}

// Block face metrics, in tenths of the font size. Whole tenths keep the
// metrics exact for integral sizes.
const BLOCK_ADVANCE: f32 = 6.0;
const BLOCK_SPACE_ADVANCE: f32 = 3.0;
const BLOCK_ASCENT: f32 = 8.0;
const BLOCK_DESCENT: f32 = -2.0;
const BLOCK_INSET: f32 = 1.0;

// ============================================================================
// Sized Font
// ============================================================================

/// A face at a concrete pixel size; measures and rasterizes single lines.
#[derive(Debug, Clone)]
pub struct TextFont {
    face: FontFace,
    size: f32,
}

/// Coverage of a rasterized line. `offset_x`/`offset_y` locate the mask's
/// top-left corner relative to the pen position (left edge, line top).
#[derive(Debug, Clone)]
pub struct GlyphMask {
    pub mask: GrayImage,
    pub offset_x: i64,
    pub offset_y: i64,
}

impl TextFont {
    pub fn new(face: FontFace, size: f32) -> Self {
        Self {
            face,
            size: size.max(1.0),
        }
    }

    /// The deterministic block font at `size`.
    pub fn fallback(size: f32) -> Self {
        Self::new(FontFace::Block, size)
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn face(&self) -> &FontFace {
        &self.face
    }

    pub fn is_fallback(&self) -> bool {
        self.face.is_fallback()
    }

    /// Distance from the line top to the baseline.
    pub fn ascent(&self) -> f32 {
        match &self.face {
            FontFace::Outline { font, .. } => font.as_scaled(PxScale::from(self.size)).ascent(),
            FontFace::Block => self.tenths(BLOCK_ASCENT),
        }
    }

    /// Distance from the baseline to the lowest descender; negative.
    pub fn descent(&self) -> f32 {
        match &self.face {
            FontFace::Outline { font, .. } => font.as_scaled(PxScale::from(self.size)).descent(),
            FontFace::Block => self.tenths(BLOCK_DESCENT),
        }
    }

    /// Vertical distance between consecutive line tops.
    pub fn line_height(&self, leading: f32) -> f32 {
        self.ascent() - self.descent() + leading
    }

    /// Horizontal advance of `text` in pixels, kerning included.
    pub fn measure(&self, text: &str) -> f32 {
        match &self.face {
            FontFace::Outline { font, .. } => {
                let scaled = font.as_scaled(PxScale::from(self.size));
                let mut width = 0.0;
                let mut previous = None;
                for c in text.chars() {
                    let id = scaled.glyph_id(c);
                    if let Some(prev) = previous {
                        width += scaled.kern(prev, id);
                    }
                    width += scaled.h_advance(id);
                    previous = Some(id);
                }
                width
            }
            FontFace::Block => text.chars().map(|c| self.block_advance(c)).sum(),
        }
    }

    /// Rasterizes one line into a coverage mask.
    pub fn rasterize(&self, text: &str) -> GlyphMask {
        // Room for glyph bearings that reach outside the advance box.
        let pad = (self.size / 4.0).ceil() as u32;
        let width = self.measure(text).ceil().max(0.0) as u32 + 2 * pad;
        let height = (self.ascent() - self.descent()).ceil().max(1.0) as u32 + 2 * pad;
        let mut mask = GrayImage::new(width.max(1), height);

        match &self.face {
            FontFace::Outline { font, .. } => {
                draw_text_mut(
                    &mut mask,
                    Luma([255]),
                    pad as i32,
                    pad as i32,
                    PxScale::from(self.size),
                    font,
                    text,
                );
            }
            FontFace::Block => {
                let glyph_w = self.tenths(BLOCK_ADVANCE - BLOCK_INSET).round().max(1.0) as u32;
                let top = self.tenths(BLOCK_INSET).round() as i32;
                let glyph_h = self.tenths(BLOCK_ASCENT - BLOCK_INSET).round().max(1.0) as u32;
                let mut pen = 0.0;
                for c in text.chars() {
                    if !c.is_whitespace() {
                        let x = pad as i32 + (pen + self.tenths(BLOCK_INSET / 2.0)).round() as i32;
                        let rect = Rect::at(x, pad as i32 + top).of_size(glyph_w, glyph_h);
                        draw_filled_rect_mut(&mut mask, rect, Luma([255]));
                    }
                    pen += self.block_advance(c);
                }
            }
        }

        GlyphMask {
            mask,
            offset_x: -i64::from(pad),
            offset_y: -i64::from(pad),
        }
    }

    fn block_advance(&self, c: char) -> f32 {
        if c.is_whitespace() {
            self.tenths(BLOCK_SPACE_ADVANCE)
        } else {
            self.tenths(BLOCK_ADVANCE)
        }
    }

    fn tenths(&self, tenths: f32) -> f32 {
        self.size * tenths / 10.0
    }
}

// ============================================================================
// Resolvers
// ============================================================================

/// Resolves font families to faces. Implementations never fail.
pub trait FontResolver: Send + Sync {
    fn resolve_face(&self, family: &str, bold: bool) -> FontFace;

    fn resolve(&self, request: &FontRequest) -> TextFont {
        self.resolve_face(&request.family, request.bold)
            .at_size(request.size)
    }
}

impl<R: FontResolver + ?Sized> FontResolver for Arc<R> {
    fn resolve_face(&self, family: &str, bold: bool) -> FontFace {
        (**self).resolve_face(family, bold)
    }
}

/// Always yields the block face.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackFontResolver;

impl FontResolver for FallbackFontResolver {
    fn resolve_face(&self, _family: &str, _bold: bool) -> FontFace {
        FontFace::Block
    }
}

/// Looks fonts up in a `fontdb` database.
///
/// Short names used by profiles (`sf_pro`, `helvetica`, ...) expand to the
/// real family names that commonly provide them. When none are installed
/// the resolver tries generic sans-serif families, and finally the block
/// face.
pub struct SystemFontResolver {
    db: fontdb::Database,
}

impl fmt::Debug for SystemFontResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemFontResolver")
            .field("faces", &self.db.len())
            .finish()
    }
}

const SANS_SERIF_FAMILIES: &[&str] = &["DejaVu Sans", "Liberation Sans", "Arial", "Noto Sans"];

fn family_aliases(family: &str) -> &'static [&'static str] {
    match family.to_ascii_lowercase().as_str() {
        "sf_pro" | "sf pro" => &["SF Pro Display", "SF Pro Text", "SF Pro"],
        "helvetica" => &["Helvetica", "Helvetica Neue", "Liberation Sans"],
        "roboto" => &["Roboto"],
        "montserrat" => &["Montserrat"],
        "opensans" | "open_sans" => &["Open Sans"],
        _ => &[],
    }
}

impl SystemFontResolver {
    /// Creates a resolver over the fonts installed on this system.
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "loaded system fonts");
        Self { db }
    }

    /// Creates a resolver with no fonts loaded.
    pub fn empty() -> Self {
        Self {
            db: fontdb::Database::new(),
        }
    }

    /// Adds a font file (TTF/OTF/TTC) to the database.
    pub fn load_font_file(&mut self, path: &Path) -> ComposeResult<()> {
        self.db
            .load_font_file(path)
            .map_err(|e| ComposeError::asset_load(path.display().to_string(), e))
    }

    /// Adds in-memory font data to the database.
    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.db.load_font_data(data);
    }

    fn query(&self, family: &str, weight: fontdb::Weight) -> Option<fontdb::ID> {
        self.db.query(&fontdb::Query {
            families: &[fontdb::Family::Name(family)],
            weight,
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        })
    }

    fn load_face(&self, id: fontdb::ID, family: &str) -> Option<FontFace> {
        self.db
            .with_face_data(id, |data, index| {
                FontFace::from_data(family, data.to_vec(), index)
            })?
            .ok()
    }
}

impl Default for SystemFontResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FontResolver for SystemFontResolver {
    fn resolve_face(&self, family: &str, bold: bool) -> FontFace {
        let weight = if bold {
            fontdb::Weight::BOLD
        } else {
            fontdb::Weight::NORMAL
        };

        let preferred = std::iter::once(family).chain(family_aliases(family).iter().copied());
        for name in preferred {
            if let Some(face) = self.query(name, weight).and_then(|id| self.load_face(id, name)) {
                return face;
            }
        }

        for name in SANS_SERIF_FAMILIES {
            if let Some(face) = self.query(name, weight).and_then(|id| self.load_face(id, name)) {
                tracing::warn!(family, bold, substitute = name, "font not found, using sans-serif");
                return face;
            }
        }

        let any = self.db.faces().find_map(|info| {
            let name = info.families.first().map(|(n, _)| n.clone())?;
            self.load_face(info.id, &name)
        });
        if let Some(face) = any {
            tracing::warn!(family, bold, substitute = ?face.family(), "font not found, using first available face");
            return face;
        }

        tracing::warn!(family, bold, "no fonts available, using block fallback");
        FontFace::Block
    }
}

/// Memoizes faces by `(family, bold)`.
pub struct CachedFontResolver<R> {
    inner: R,
    cache: Mutex<HashMap<(String, bool), FontFace>>,
}

impl<R: FontResolver> CachedFontResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Number of memoized faces.
    pub fn len(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R: FontResolver> FontResolver for CachedFontResolver<R> {
    fn resolve_face(&self, family: &str, bold: bool) -> FontFace {
        let key = (family.to_owned(), bold);
        if let Some(face) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return face.clone();
        }

        // Resolve outside the lock; a racing thread at worst resolves twice.
        let face = self.inner.resolve_face(family, bold);
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, face.clone());
        face
    }
}
