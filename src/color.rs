//! Color values used throughout the profile and the renderer.

use image::Rgba;
use palette::{Mix, Srgb};
use serde::{Deserialize, Serialize};

// ============================================================================
// Rgb8
// ============================================================================

/// An opaque 8-bit sRGB color.
///
/// Serializes as `[r, g, b]`; deserializes from either `[r, g, b]` or a
/// `"#rrggbb"` / `"#rgb"` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr", into = "ColorRepr")]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses a hex color such as `#4a90e2`.
    pub fn from_hex(hex: &str) -> Result<Self, String> {
        let parsed: Srgb<u8> = hex
            .trim()
            .parse()
            .map_err(|e| format!("invalid hex color {hex:?}: {e}"))?;
        Ok(Self::new(parsed.red, parsed.green, parsed.blue))
    }

    /// Formats the color as `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear interpolation per sRGB channel: `self * (1 - t) + other * t`.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let start: Srgb<f32> = Srgb::new(self.r, self.g, self.b).into_format();
        let end: Srgb<f32> = Srgb::new(other.r, other.g, other.b).into_format();
        let mixed: Srgb<u8> = start.mix(end, t.clamp(0.0, 1.0)).into_format();
        Self::new(mixed.red, mixed.green, mixed.blue)
    }

    /// Opaque RGBA pixel.
    pub fn to_rgba(self) -> Rgba<u8> {
        self.with_alpha(255)
    }

    pub fn with_alpha(self, alpha: u8) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, alpha])
    }
}

impl Default for Rgb8 {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[u8; 3]> for Rgb8 {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<(u8, u8, u8)> for Rgb8 {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(untagged)]
enum ColorRepr {
    Channels([u8; 3]),
    Hex(String),
}

impl TryFrom<ColorRepr> for Rgb8 {
    type Error = String;

    fn try_from(repr: ColorRepr) -> Result<Self, Self::Error> {
        match repr {
            ColorRepr::Channels(channels) => Ok(channels.into()),
            ColorRepr::Hex(hex) => Self::from_hex(&hex),
        }
    }
}

impl From<Rgb8> for ColorRepr {
    fn from(color: Rgb8) -> Self {
        ColorRepr::Channels([color.r, color.g, color.b])
    }
}

#[cfg(feature = "jsonschema")]
impl schemars::JsonSchema for Rgb8 {
    fn schema_name() -> String {
        "Rgb8".to_owned()
    }

    fn json_schema(generator: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
        <ColorRepr as schemars::JsonSchema>::json_schema(generator)
    }
}

// ============================================================================
// Shadow Color
// ============================================================================

/// A translucent color used for drop shadows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ShadowColor {
    pub color: Rgb8,
    pub alpha: u8,
}

impl ShadowColor {
    pub const fn new(color: Rgb8, alpha: u8) -> Self {
        Self { color, alpha }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        self.color.with_alpha(self.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Rgb8::from_hex("#4a90e2").unwrap(), Rgb8::new(74, 144, 226));
        assert_eq!(Rgb8::from_hex("fff").unwrap(), Rgb8::WHITE);
        assert!(Rgb8::from_hex("#zzzzzz").is_err());
    }

    #[test]
    fn hex_roundtrip() {
        let color = Rgb8::new(155, 89, 182);
        assert_eq!(Rgb8::from_hex(&color.to_hex()).unwrap(), color);
    }

    #[test]
    fn lerp_endpoints_match_inputs() {
        let a = Rgb8::new(74, 144, 226);
        let b = Rgb8::new(155, 89, 182);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);

        let mid = a.lerp(b, 0.5);
        assert!((i32::from(mid.r) - 114).abs() <= 1);
        assert!((i32::from(mid.g) - 116).abs() <= 1);
        assert!((i32::from(mid.b) - 204).abs() <= 1);
    }

    #[test]
    fn deserializes_arrays_and_hex() {
        let from_array: Rgb8 = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(from_array, Rgb8::new(1, 2, 3));

        let from_hex: Rgb8 = serde_json::from_str("\"#010203\"").unwrap();
        assert_eq!(from_hex, Rgb8::new(1, 2, 3));

        assert!(serde_json::from_str::<Rgb8>("\"nope\"").is_err());
        assert_eq!(serde_json::to_string(&from_hex).unwrap(), "[1,2,3]");
    }
}
