//! Font usage statistics for ebooks
//!
//! Given what a renderer reports about each document of a book (its
//! `@font-face` rules and the computed font of every run of text), this
//! library works out which characters each embedded font file actually has
//! to provide, and which undeclared fonts are used heavily enough to be
//! worth embedding.

mod aggregate;
mod bridge;
mod collector;
mod container;
mod css;
mod error;
mod matcher;
mod normalize;
mod rules;
mod types;
mod usage;

// Re-export error types
pub use error::{RuleError, StatsError};

// Re-export collection API
pub use aggregate::{DocumentStats, EmbeddingCandidates};
pub use bridge::{RawFontFaceRule, RenderedDocument, documents_from_reader};
pub use collector::{FontStats, StatsCollector, StatsCollectorBuilder};
pub use container::{Container, DirectoryContainer, resolve_href};

// Re-export the matching building blocks
pub use css::{parse_font_families, parse_src_urls};
pub use matcher::{matching_rules, weight_fallbacks};
pub use normalize::{
    GENERIC_FAMILIES, RawFontProperties, fold_family, is_generic_family, is_small_caps,
    normalize_stretch, normalize_style, normalize_text_transform, normalize_weight,
};
pub use usage::{first_letter, used_characters};

// Re-export public types
pub use types::{
    EmbeddingBucket, EmbeddingKey, FontFaceRule, FontProperties, FontQuery, FontStretch,
    FontStyle, TextTransform, TextUsageRecord,
};

/// Collects font usage for `documents` with default settings.
///
/// This is a convenience function equivalent to
/// `StatsCollector::default().collect(container, documents)`.
pub fn collect<C, I>(container: &C, documents: I) -> Result<FontStats, StatsError>
where
    C: Container + ?Sized,
    I: IntoIterator<Item = RenderedDocument>,
{
    StatsCollector::default().collect(container, documents)
}
