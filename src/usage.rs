//! Works out which characters a text run actually paints.
//!
//! Only the repertoire matters here, not the rendered string, so transforms
//! are applied per character and the results are collected into a set.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::is_small_caps;
use crate::types::{TextTransform, TextUsageRecord};

static LEADING_PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{Ps}\p{Pe}\p{Pi}\p{Pf}\p{Po}]+").expect("valid punctuation pattern")
});

static LETTER_OR_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{N}]$").expect("valid letter pattern"));

const EXCLUDED: [char; 3] = ['\n', '\r', '\t'];

/// The character a `::first-letter` rule styles.
///
/// Leading punctuation such as an opening quote is skipped and the next
/// non-space character is taken. When nothing follows the punctuation, its
/// first character is the letter.
pub fn first_letter(text: &str) -> Option<char> {
    let text = text.trim();
    match LEADING_PUNCTUATION.find(text) {
        Some(prefix) => text[prefix.end()..]
            .trim_start()
            .chars()
            .next()
            .or_else(|| prefix.as_str().chars().next()),
        None => text.chars().next(),
    }
}

/// The text a record contributes before transforms are applied.
fn effective_text(record: &TextUsageRecord) -> String {
    if record.is_first_letter() {
        first_letter(&record.text).map(String::from).unwrap_or_default()
    } else if record.is_pseudo_element() {
        record.text.trim().to_owned()
    } else {
        record.text.clone()
    }
}

fn transform(c: char, text_transform: TextTransform) -> Vec<char> {
    match text_transform {
        TextTransform::None => vec![c],
        TextTransform::Uppercase => c.to_uppercase().collect(),
        TextTransform::Lowercase => c.to_lowercase().collect(),
        TextTransform::Capitalize => {
            let mut painted = vec![c];
            if LETTER_OR_NUMBER.is_match(c.encode_utf8(&mut [0; 4])) {
                painted.extend(c.to_uppercase());
            }
            painted
        }
    }
}

/// Every character needed to render `record`, with `text-transform` and
/// faked small caps taken into account. Line breaks and tabs are dropped.
pub fn used_characters(record: &TextUsageRecord) -> BTreeSet<char> {
    let small_caps = is_small_caps(&record.font_variant);
    let mut used = BTreeSet::new();
    for c in effective_text(record).chars() {
        let mut painted = transform(c, record.text_transform);
        if small_caps {
            // Readers without real small caps draw scaled capitals.
            let capitals: Vec<char> = painted.iter().flat_map(|c| c.to_uppercase()).collect();
            painted.extend(capitals);
        }
        used.extend(painted);
    }
    for c in EXCLUDED {
        used.remove(&c);
    }
    used
}
