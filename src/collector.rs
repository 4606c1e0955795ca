use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::debug;

use crate::aggregate::DocumentStats;
use crate::bridge::RenderedDocument;
use crate::container::Container;
use crate::error::StatsError;
use crate::types::{EmbeddingBucket, EmbeddingKey, FontFaceRule};

/// Builder for configuring a [`StatsCollector`].
///
/// # Examples
///
/// ```
/// use font_stats::StatsCollector;
///
/// let collector = StatsCollector::builder()
///     .collect_embedding_candidates(true)
///     .build();
/// assert!(collector.collects_embedding_candidates());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StatsCollectorBuilder {
    collect_embedding_candidates: bool,
}

impl StatsCollectorBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also gather usage of fonts that are not declared with `@font-face`,
    /// so they can be considered for embedding.
    pub fn collect_embedding_candidates(mut self, collect: bool) -> Self {
        self.collect_embedding_candidates = collect;
        self
    }

    /// Build the collector.
    pub fn build(self) -> StatsCollector {
        StatsCollector {
            collect_embedding_candidates: self.collect_embedding_candidates,
        }
    }
}

/// Walks the documents of a book in spine order and totals up font usage.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
///
/// use font_stats::{RenderedDocument, StatsCollector};
/// use serde_json::json;
///
/// let package: BTreeSet<String> = ["fonts/foo-bold.otf".to_owned()].into_iter().collect();
/// let document = RenderedDocument::new("index.html")
///     .with_font_face_rules(json!([
///         {"font-family": "\"Foo\"", "font-weight": "700", "src": "url(fonts/foo-bold.otf)"}
///     ]))
///     .with_font_usage(json!([
///         {"text": "Hi", "font-family": ["Foo"], "font-weight": "700"}
///     ]));
///
/// let stats = StatsCollector::default().collect(&package, [document])?;
/// let used: String = stats.characters("fonts/foo-bold.otf").unwrap().iter().collect();
/// assert_eq!(used, "Hi");
/// # Ok::<(), font_stats::StatsError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct StatsCollector {
    collect_embedding_candidates: bool,
}

impl StatsCollector {
    /// Create a builder for configuring the collector.
    pub fn builder() -> StatsCollectorBuilder {
        StatsCollectorBuilder::new()
    }

    pub fn collects_embedding_candidates(&self) -> bool {
        self.collect_embedding_candidates
    }

    /// Computes the contribution of one document without touching any
    /// totals. Documents are independent, so this can run in parallel as
    /// long as the results are absorbed one at a time.
    pub fn process<C: Container + ?Sized>(
        &self,
        container: &C,
        document: &RenderedDocument,
    ) -> Result<Option<DocumentStats>, StatsError> {
        DocumentStats::compute(document, container, self.collect_embedding_candidates)
    }

    /// Processes every document in order. The first malformed renderer
    /// output aborts the run.
    pub fn collect<C, I>(&self, container: &C, documents: I) -> Result<FontStats, StatsError>
    where
        C: Container + ?Sized,
        I: IntoIterator<Item = RenderedDocument>,
    {
        let mut stats = FontStats::default();
        for document in documents {
            match self.process(container, &document)? {
                Some(document_stats) => stats.absorb(document_stats),
                None => debug!("No usable @font-face rules in {}, skipping", document.name),
            }
        }
        Ok(stats)
    }
}

/// Font usage totals for a whole book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontStats {
    font_usage: BTreeMap<String, BTreeSet<char>>,
    font_rules: BTreeMap<String, FontFaceRule>,
    embedding_buckets: BTreeMap<EmbeddingKey, EmbeddingBucket>,
    family_names: BTreeSet<String>,
    document_usage: BTreeMap<String, BTreeMap<EmbeddingKey, EmbeddingBucket>>,
    document_families: BTreeMap<String, BTreeSet<String>>,
}

impl FontStats {
    /// Merges one document's contribution. Character sets only ever grow;
    /// a later rule for the same source replaces the earlier one.
    pub fn absorb(&mut self, document: DocumentStats) {
        let DocumentStats {
            name,
            rules,
            font_usage,
            candidates,
        } = document;

        for rule in rules {
            self.font_rules.insert(rule.source.clone(), rule);
        }
        for (source, text) in font_usage {
            self.font_usage.entry(source).or_default().extend(text);
        }

        if let Some(candidates) = candidates {
            for (key, bucket) in &candidates.buckets {
                self.embedding_buckets
                    .entry(key.clone())
                    .or_insert_with(|| EmbeddingBucket::new(bucket.properties, &bucket.family))
                    .text
                    .extend(bucket.text.iter().copied());
            }
            self.family_names
                .extend(candidates.families.iter().cloned());
            self.document_usage.insert(name.clone(), candidates.buckets);
            self.document_families.insert(name, candidates.families);
        }
    }

    /// Characters rendered with each declared font, keyed by source.
    pub fn font_usage(&self) -> &BTreeMap<String, BTreeSet<char>> {
        &self.font_usage
    }

    pub fn characters(&self, source: &str) -> Option<&BTreeSet<char>> {
        self.font_usage.get(source)
    }

    /// The last `@font-face` rule seen for each source.
    pub fn font_rules(&self) -> &BTreeMap<String, FontFaceRule> {
        &self.font_rules
    }

    pub fn rule(&self, source: &str) -> Option<&FontFaceRule> {
        self.font_rules.get(source)
    }

    /// Usage of undeclared fonts across the book. Empty unless embedding
    /// candidates were collected.
    pub fn embedding_buckets(&self) -> &BTreeMap<EmbeddingKey, EmbeddingBucket> {
        &self.embedding_buckets
    }

    /// Every non-generic family named anywhere in the book.
    pub fn family_names(&self) -> &BTreeSet<String> {
        &self.family_names
    }

    /// Undeclared font usage per document.
    pub fn document_usage(&self) -> &BTreeMap<String, BTreeMap<EmbeddingKey, EmbeddingBucket>> {
        &self.document_usage
    }

    /// Families named per document.
    pub fn document_families(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.document_families
    }

    pub fn is_empty(&self) -> bool {
        self.font_usage.is_empty() && self.embedding_buckets.is_empty()
    }
}

impl fmt::Display for FontStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (source, text) in &self.font_usage {
            let text: String = text.iter().collect();
            writeln!(f, "{}: {:?}", source, text)?;
        }
        for bucket in self.embedding_buckets.values() {
            let text: String = bucket.text.iter().collect();
            writeln!(f, "[{} {}]: {:?}", bucket.family, bucket.properties, text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn package() -> BTreeSet<String> {
        ["fonts/a.otf", "fonts/b.otf"]
            .iter()
            .map(|n| n.to_string())
            .collect()
    }

    fn chars(s: &str) -> BTreeSet<char> {
        s.chars().collect()
    }

    fn doc(name: &str, src: &str, text: &str) -> RenderedDocument {
        RenderedDocument::new(name)
            .with_font_face_rules(json!([{"font-family": "A", "src": src}]))
            .with_font_usage(json!([{"text": text, "font-family": ["A"]}]))
    }

    #[test]
    fn usage_is_unioned_across_documents() {
        let stats = StatsCollector::default()
            .collect(
                &package(),
                [
                    doc("1.html", "url(fonts/a.otf)", "abc"),
                    doc("2.html", "url(fonts/a.otf)", "cde"),
                ],
            )
            .unwrap();
        assert_eq!(stats.characters("fonts/a.otf"), Some(&chars("abcde")));
        assert_eq!(stats.font_rules().len(), 1);
    }

    #[test]
    fn rules_do_not_leak_between_documents() {
        let second = RenderedDocument::new("2.html")
            .with_font_face_rules(json!([{"font-family": "B", "src": "url(fonts/b.otf)"}]))
            .with_font_usage(json!([{"text": "xyz", "font-family": ["A"]}]));
        let stats = StatsCollector::default()
            .collect(&package(), [doc("1.html", "url(fonts/a.otf)", "abc"), second])
            .unwrap();
        assert_eq!(stats.characters("fonts/a.otf"), Some(&chars("abc")));
        assert_eq!(stats.characters("fonts/b.otf"), Some(&BTreeSet::new()));
    }

    #[test]
    fn absorbing_never_shrinks() {
        let collector = StatsCollector::default();
        let pkg = package();
        let mut stats = FontStats::default();
        let mut previous = BTreeSet::new();
        for (i, text) in ["ab", "", "b", "zz"].iter().enumerate() {
            let document = doc(&format!("{}.html", i), "url(fonts/a.otf)", text);
            if let Some(document_stats) = collector.process(&pkg, &document).unwrap() {
                stats.absorb(document_stats);
            }
            let current = stats.characters("fonts/a.otf").cloned().unwrap_or_default();
            assert!(current.is_superset(&previous));
            previous = current;
        }
        assert_eq!(previous, chars("abz"));
    }

    #[test]
    fn fatal_output_aborts_the_run() {
        let broken = RenderedDocument::new("2.html").with_font_face_rules(json!({"oops": 1}));
        let result = StatsCollector::default().collect(
            &package(),
            [doc("1.html", "url(fonts/a.otf)", "abc"), broken],
        );
        assert!(matches!(result, Err(StatsError::UnexpectedOutput { ref document, .. }) if document == "2.html"));
    }

    #[test]
    fn embedding_mode_keeps_per_document_breakdowns() {
        let plain = RenderedDocument::new("1.html")
            .with_font_usage(json!([{"text": "ab", "font-family": ["Georgia"]}]))
            .with_font_families(json!({"Georgia": true}));
        let more = RenderedDocument::new("2.html")
            .with_font_usage(json!([{"text": "bc", "font-family": ["Georgia"]}]))
            .with_font_families(json!({"Palatino, serif": true}));
        let stats = StatsCollector::builder()
            .collect_embedding_candidates(true)
            .build()
            .collect(&package(), [plain, more])
            .unwrap();

        assert!(stats.font_usage().is_empty());
        assert_eq!(stats.embedding_buckets().len(), 1);
        let bucket = stats.embedding_buckets().values().next().unwrap();
        assert_eq!(bucket.text, chars("abc"));
        assert_eq!(stats.document_usage().len(), 2);
        assert_eq!(
            stats.family_names(),
            &["Georgia".to_owned(), "Palatino".to_owned()].into_iter().collect()
        );
        assert_eq!(stats.document_families()["2.html"].len(), 1);
        assert!(!stats.is_empty());
    }

    #[test]
    fn display_lists_each_font() {
        let stats = StatsCollector::default()
            .collect(&package(), [doc("1.html", "url(fonts/a.otf)", "ba")])
            .unwrap();
        assert_eq!(stats.to_string(), "fonts/a.otf: \"ab\"\n");
    }
}
