//! Canonicalization of authored CSS font values.
//!
//! Nothing here fails: a missing or invalid value is replaced with the CSS
//! initial value, the same way a browser ignores a bad declaration.

use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;

use crate::types::{FontProperties, FontStretch, FontStyle, TextTransform};

/// Families that stand in for whatever the reading system picks and so can
/// never be embedded.
pub const GENERIC_FAMILIES: &[&str] = &[
    "serif",
    "sans-serif",
    "monospace",
    "cursive",
    "fantasy",
    "sansserif",
    "inherit",
];

const SMALL_CAPS_VARIANTS: &[&str] = &[
    "smallcaps",
    "small-caps",
    "all-small-caps",
    "petite-caps",
    "all-petite-caps",
    "unicase",
];

/// Weight, style and stretch exactly as the renderer or stylesheet reported
/// them. Any of them may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct RawFontProperties {
    #[serde(
        rename = "font-weight",
        default,
        deserialize_with = "crate::bridge::css_text"
    )]
    pub weight: Option<String>,
    #[serde(
        rename = "font-style",
        default,
        deserialize_with = "crate::bridge::css_text"
    )]
    pub style: Option<String>,
    #[serde(
        rename = "font-stretch",
        default,
        deserialize_with = "crate::bridge::css_text"
    )]
    pub stretch: Option<String>,
}

impl RawFontProperties {
    pub fn normalize(&self) -> FontProperties {
        FontProperties {
            weight: normalize_weight(self.weight.as_deref()),
            style: normalize_style(self.style.as_deref()),
            stretch: normalize_stretch(self.stretch.as_deref()),
        }
    }
}

impl From<FontProperties> for RawFontProperties {
    fn from(properties: FontProperties) -> Self {
        RawFontProperties {
            weight: Some(properties.weight.to_string()),
            style: Some(properties.style.as_str().to_owned()),
            stretch: Some(properties.stretch.as_str().to_owned()),
        }
    }
}

/// `normal` and `bold` map to 400 and 700; anything that is not one of the
/// nine numeric weights becomes 400.
pub fn normalize_weight(raw: Option<&str>) -> u16 {
    let raw = raw.map(str::trim).unwrap_or("");
    let weight = match raw.to_ascii_lowercase().as_str() {
        "" | "normal" => 400,
        "bold" => 700,
        other => other.parse::<u16>().unwrap_or(400),
    };
    if (100..=900).contains(&weight) && weight % 100 == 0 {
        weight
    } else {
        400
    }
}

pub fn normalize_style(raw: Option<&str>) -> FontStyle {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("italic") => FontStyle::Italic,
        Some("oblique") => FontStyle::Oblique,
        _ => FontStyle::Normal,
    }
}

pub fn normalize_stretch(raw: Option<&str>) -> FontStretch {
    let Some(raw) = raw.map(|s| s.trim().to_ascii_lowercase()) else {
        return FontStretch::Normal;
    };
    FontStretch::ALL
        .iter()
        .copied()
        .find(|stretch| stretch.as_str() == raw)
        .unwrap_or(FontStretch::Normal)
}

pub fn normalize_text_transform(raw: Option<&str>) -> TextTransform {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("uppercase") => TextTransform::Uppercase,
        Some("lowercase") => TextTransform::Lowercase,
        Some("capitalize") => TextTransform::Capitalize,
        _ => TextTransform::None,
    }
}

pub fn is_small_caps(font_variant: &str) -> bool {
    let variant = font_variant.trim().to_ascii_lowercase();
    SMALL_CAPS_VARIANTS.contains(&variant.as_str())
}

/// Case-folds a family name for comparison.
pub fn fold_family(family: &str) -> String {
    family.trim().nfc().collect::<String>().to_lowercase()
}

pub fn is_generic_family(family: &str) -> bool {
    GENERIC_FAMILIES.contains(&fold_family(family).as_str())
}
