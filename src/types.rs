use std::collections::BTreeSet;
use std::fmt;

/// The three `font-style` keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FontStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
            FontStyle::Oblique => "oblique",
        }
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The nine `font-stretch` keywords, narrowest first.
///
/// The discriminant is the width index used by the matcher, so `Normal` sits
/// in the middle at 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum FontStretch {
    UltraCondensed = 0,
    ExtraCondensed = 1,
    Condensed = 2,
    SemiCondensed = 3,
    #[default]
    Normal = 4,
    SemiExpanded = 5,
    Expanded = 6,
    ExtraExpanded = 7,
    UltraExpanded = 8,
}

impl FontStretch {
    pub const ALL: [FontStretch; 9] = [
        FontStretch::UltraCondensed,
        FontStretch::ExtraCondensed,
        FontStretch::Condensed,
        FontStretch::SemiCondensed,
        FontStretch::Normal,
        FontStretch::SemiExpanded,
        FontStretch::Expanded,
        FontStretch::ExtraExpanded,
        FontStretch::UltraExpanded,
    ];

    /// Width index, 0 (ultra-condensed) to 8 (ultra-expanded).
    pub fn index(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FontStretch::UltraCondensed => "ultra-condensed",
            FontStretch::ExtraCondensed => "extra-condensed",
            FontStretch::Condensed => "condensed",
            FontStretch::SemiCondensed => "semi-condensed",
            FontStretch::Normal => "normal",
            FontStretch::SemiExpanded => "semi-expanded",
            FontStretch::Expanded => "expanded",
            FontStretch::ExtraExpanded => "extra-expanded",
            FontStretch::UltraExpanded => "ultra-expanded",
        }
    }
}

impl fmt::Display for FontStretch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized weight, style and stretch of either a declared font or a
/// rendered text run.
///
/// Values of this type are always in range: `weight` is one of 100..=900 in
/// steps of 100. Build them from raw CSS values with
/// [`RawFontProperties::normalize`](crate::RawFontProperties::normalize).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontProperties {
    pub weight: u16,
    pub style: FontStyle,
    pub stretch: FontStretch,
}

impl Default for FontProperties {
    fn default() -> Self {
        FontProperties {
            weight: 400,
            style: FontStyle::Normal,
            stretch: FontStretch::Normal,
        }
    }
}

impl fmt::Display for FontProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.weight, self.style, self.stretch)
    }
}

/// A usable `@font-face` declaration: its families, its descriptors and the
/// package resource holding the font file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFaceRule {
    /// Case-folded family names.
    pub families: BTreeSet<String>,
    pub properties: FontProperties,
    /// Name of the font file inside the book package.
    pub source: String,
}

/// `text-transform` as it affects which glyphs get painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextTransform {
    #[default]
    None,
    Uppercase,
    Lowercase,
    Capitalize,
}

/// The font a text run asks for: case-folded families in fallback order plus
/// normalized properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontQuery {
    pub families: Vec<String>,
    pub properties: FontProperties,
}

/// One run of rendered text together with its computed font properties.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextUsageRecord {
    /// Characters as they appear in the document, before any transform.
    pub text: String,
    /// Requested families as authored, in fallback order.
    pub families: Vec<String>,
    pub properties: FontProperties,
    pub text_transform: TextTransform,
    pub font_variant: String,
    /// Name of the pseudo element (`first-letter`, `before`, ...) the run was
    /// synthesized for, if any.
    pub pseudo: Option<String>,
}

impl TextUsageRecord {
    pub fn is_pseudo_element(&self) -> bool {
        self.pseudo.is_some()
    }

    pub fn is_first_letter(&self) -> bool {
        self.pseudo
            .as_deref()
            .map(|p| p.trim_start_matches(':').eq_ignore_ascii_case("first-letter"))
            .unwrap_or(false)
    }

    pub fn query(&self) -> FontQuery {
        FontQuery {
            families: self
                .families
                .iter()
                .map(|f| crate::normalize::fold_family(f))
                .collect(),
            properties: self.properties,
        }
    }
}

/// Groups usage of a font that no `@font-face` rule provides.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmbeddingKey {
    pub properties: FontProperties,
    /// Case-folded primary family.
    pub family: String,
}

/// Characters painted with an undeclared font, plus the descriptors needed
/// to go looking for a matching system font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingBucket {
    pub properties: FontProperties,
    /// Primary family as first seen in the document.
    pub family: String,
    pub text: BTreeSet<char>,
}

impl EmbeddingBucket {
    pub(crate) fn new(properties: FontProperties, family: &str) -> EmbeddingBucket {
        EmbeddingBucket {
            properties,
            family: family.to_owned(),
            text: BTreeSet::new(),
        }
    }
}
