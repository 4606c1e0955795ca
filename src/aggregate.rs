use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::bridge::{
    RawFontFaceRule, RawPseudoUsage, RenderedDocument, decode_family_values, decode_list,
    decode_usage,
};
use crate::container::Container;
use crate::css::parse_font_families;
use crate::error::StatsError;
use crate::matcher::matching_rules;
use crate::normalize::{fold_family, is_generic_family};
use crate::types::{EmbeddingBucket, EmbeddingKey, FontFaceRule, TextUsageRecord};
use crate::usage::used_characters;

/// Usage of fonts that no `@font-face` rule in the document provides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddingCandidates {
    pub buckets: BTreeMap<EmbeddingKey, EmbeddingBucket>,
    /// Every non-generic family named in the document.
    pub families: BTreeSet<String>,
}

impl EmbeddingCandidates {
    fn add(&mut self, record: &TextUsageRecord, text: &BTreeSet<char>) {
        let Some(family) = record.families.first().map(|f| f.trim()) else {
            return;
        };
        if family.is_empty() || is_generic_family(family) {
            return;
        }
        let key = EmbeddingKey {
            properties: record.properties,
            family: fold_family(family),
        };
        self.buckets
            .entry(key)
            .or_insert_with(|| EmbeddingBucket::new(record.properties, family))
            .text
            .extend(text.iter().copied());
    }
}

/// The contribution of a single document, before it is merged into the run
/// totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStats {
    pub name: String,
    /// The document's usable `@font-face` rules, in declaration order.
    pub rules: Vec<FontFaceRule>,
    /// Characters painted with each declared font. Every rule's source has an
    /// entry, even when nothing used it.
    pub font_usage: BTreeMap<String, BTreeSet<char>>,
    /// Only present when collecting embedding candidates.
    pub candidates: Option<EmbeddingCandidates>,
}

impl DocumentStats {
    fn new(name: &str, rules: Vec<FontFaceRule>, collect_embedding_candidates: bool) -> DocumentStats {
        let font_usage = rules
            .iter()
            .map(|rule| (rule.source.clone(), BTreeSet::new()))
            .collect();
        DocumentStats {
            name: name.to_owned(),
            rules,
            font_usage,
            candidates: collect_embedding_candidates.then(EmbeddingCandidates::default),
        }
    }

    /// Matches every text run of `document` against its own `@font-face`
    /// rules.
    ///
    /// Returns `Ok(None)` when the document declares no usable fonts and
    /// embedding candidates are not wanted, since there is nothing to learn
    /// from it. Malformed rules are logged and skipped; malformed renderer
    /// output fails.
    pub fn compute<C: Container + ?Sized>(
        document: &RenderedDocument,
        container: &C,
        collect_embedding_candidates: bool,
    ) -> Result<Option<DocumentStats>, StatsError> {
        let name = document.name.as_str();
        let raw_rules: Vec<RawFontFaceRule> =
            decode_list(name, "font-face rules", &document.font_face_rules)?;
        let rules: Vec<FontFaceRule> = raw_rules
            .iter()
            .filter_map(|raw| match FontFaceRule::resolve(raw, container, name) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    warn!("Ignoring @font-face rule in {}: {}", name, e);
                    None
                }
            })
            .collect();
        debug!(
            "{}: {} of {} @font-face rules usable",
            name,
            rules.len(),
            raw_rules.len()
        );
        if rules.is_empty() && !collect_embedding_candidates {
            return Ok(None);
        }

        let mut stats = DocumentStats::new(name, rules, collect_embedding_candidates);

        let usage = decode_usage(name, &document.font_usage)?;
        let pseudo: Vec<RawPseudoUsage> = decode_list(
            name,
            "pseudo element font usage",
            &document.pseudo_element_font_usage,
        )?;
        let records = usage
            .into_iter()
            .chain(pseudo.iter().map(RawPseudoUsage::to_record));
        let mut matched = 0;
        for record in records {
            if stats.add_usage(&record) {
                matched += 1;
            }
        }
        debug!("{}: {} text runs matched a declared font", name, matched);

        if let Some(candidates) = stats.candidates.as_mut() {
            let mut raw_families = decode_family_values(name, &document.font_families)?;
            raw_families.extend(pseudo.iter().map(|p| p.raw_family().to_owned()));
            for raw in &raw_families {
                for family in parse_font_families(raw) {
                    if !is_generic_family(&family) {
                        candidates.families.insert(family);
                    }
                }
            }
        }

        Ok(Some(stats))
    }

    /// Folds one text run in. Returns whether it matched a declared font.
    fn add_usage(&mut self, record: &TextUsageRecord) -> bool {
        let text = used_characters(record);
        if text.is_empty() {
            return false;
        }

        let matches = matching_rules(&self.rules, &record.query());
        let matched = !matches.is_empty();
        for rule in matches {
            self.font_usage
                .entry(rule.source.clone())
                .or_default()
                .extend(text.iter().copied());
        }

        if let Some(candidates) = self.candidates.as_mut() {
            candidates.add(record, &text);
        }
        matched
    }
}
