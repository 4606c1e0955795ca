//! CSS font matching against a document's `@font-face` rules.
//!
//! Candidates are narrowed by family, then stretch, then style, then weight,
//! following the font matching algorithm of CSS Fonts level 3. Rules are
//! scanned newest first so later declarations win ties.

use std::collections::HashSet;

use crate::types::{FontFaceRule, FontQuery, FontStretch, FontStyle};

/// Returns every rule that would paint text asking for `query`.
///
/// Usually this is a single rule, but several rules that differ only in
/// their source all match, and all of them are returned. An empty result
/// means none of the requested families is declared.
pub fn matching_rules<'a>(rules: &'a [FontFaceRule], query: &FontQuery) -> Vec<&'a FontFaceRule> {
    let wanted: HashSet<&str> = query.families.iter().map(String::as_str).collect();
    let candidates: Vec<&FontFaceRule> = rules
        .iter()
        .rev()
        .filter(|rule| rule.families.iter().any(|f| wanted.contains(f.as_str())))
        .collect();
    if candidates.is_empty() {
        return candidates;
    }

    let candidates = filter_stretch(candidates, query.properties.stretch);
    let candidates = filter_style(candidates, query.properties.style);
    filter_weight(candidates, query.properties.weight)
}

fn filter_stretch(candidates: Vec<&FontFaceRule>, stretch: FontStretch) -> Vec<&FontFaceRule> {
    let width = i16::from(stretch.index());
    let distance = |rule: &FontFaceRule| (width - i16::from(rule.properties.stretch.index())).abs();
    let Some(min_distance) = candidates.iter().map(|rule| distance(*rule)).min() else {
        return candidates;
    };
    let nearest: Vec<&FontFaceRule> = candidates
        .into_iter()
        .filter(|rule| distance(*rule) == min_distance)
        .collect();

    // Normal and narrower prefer the narrower face, wider prefers wider.
    let directional: Vec<&FontFaceRule> = nearest
        .iter()
        .copied()
        .filter(|rule| {
            let rule_width = i16::from(rule.properties.stretch.index());
            if width <= i16::from(FontStretch::Normal.index()) {
                rule_width <= width
            } else {
                rule_width >= width
            }
        })
        .collect();
    if directional.is_empty() { nearest } else { directional }
}

fn style_fallbacks(style: FontStyle) -> [FontStyle; 3] {
    match style {
        FontStyle::Oblique => [FontStyle::Oblique, FontStyle::Italic, FontStyle::Normal],
        FontStyle::Normal => [FontStyle::Normal, FontStyle::Oblique, FontStyle::Italic],
        FontStyle::Italic => [FontStyle::Italic, FontStyle::Oblique, FontStyle::Normal],
    }
}

fn filter_style(candidates: Vec<&FontFaceRule>, style: FontStyle) -> Vec<&FontFaceRule> {
    for wanted in style_fallbacks(style) {
        let matches: Vec<&FontFaceRule> = candidates
            .iter()
            .copied()
            .filter(|rule| rule.properties.style == wanted)
            .collect();
        if !matches.is_empty() {
            return matches;
        }
    }
    candidates
}

/// Order in which weights are tried for a requested weight.
pub fn weight_fallbacks(weight: u16) -> Vec<u16> {
    let lighter = |from: u16| (1..from / 100).rev().map(|step| step * 100);
    let heavier = |from: u16| (from / 100 + 1..=9).map(|step| step * 100);
    match weight {
        400 => vec![400, 500, 300, 200, 100, 600, 700, 800, 900],
        500 => vec![500, 400, 300, 200, 100, 600, 700, 800, 900],
        w if w < 400 => std::iter::once(w).chain(lighter(w)).chain(heavier(w)).collect(),
        w => std::iter::once(w).chain(heavier(w)).chain(lighter(w)).collect(),
    }
}

fn filter_weight(candidates: Vec<&FontFaceRule>, weight: u16) -> Vec<&FontFaceRule> {
    for wanted in weight_fallbacks(weight) {
        let matches: Vec<&FontFaceRule> = candidates
            .iter()
            .copied()
            .filter(|rule| rule.properties.weight == wanted)
            .collect();
        if !matches.is_empty() {
            return matches;
        }
    }
    Vec::new()
}
