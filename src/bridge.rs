//! What the renderer reports about one document, and decoding it into typed
//! records.
//!
//! The renderer is treated as an untrusted producer of JSON. Scalar CSS
//! values that are missing or odd are left for the normalizer to default,
//! but anything of the wrong overall shape fails the run.

use std::io::Read;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::error;

use crate::css::parse_font_families;
use crate::error::StatsError;
use crate::normalize::{RawFontProperties, normalize_text_transform};
use crate::types::TextUsageRecord;

/// Renderer output for a single spine item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderedDocument {
    /// Package name of the document.
    pub name: String,
    /// Array of `@font-face` rule objects.
    #[serde(default)]
    pub font_face_rules: Value,
    /// Array of text run objects.
    #[serde(default)]
    pub font_usage: Value,
    /// Array of `[properties, text, pseudo]` triples.
    #[serde(default)]
    pub pseudo_element_font_usage: Value,
    /// Object keyed by every raw `font-family` value in the document.
    #[serde(default)]
    pub font_families: Value,
}

impl RenderedDocument {
    /// A document with no rules, no text and no families.
    pub fn new(name: impl Into<String>) -> RenderedDocument {
        RenderedDocument {
            name: name.into(),
            font_face_rules: Value::Array(Vec::new()),
            font_usage: Value::Array(Vec::new()),
            pseudo_element_font_usage: Value::Array(Vec::new()),
            font_families: Value::Object(Default::default()),
        }
    }

    pub fn with_font_face_rules(mut self, rules: Value) -> Self {
        self.font_face_rules = rules;
        self
    }

    pub fn with_font_usage(mut self, usage: Value) -> Self {
        self.font_usage = usage;
        self
    }

    pub fn with_pseudo_element_font_usage(mut self, usage: Value) -> Self {
        self.pseudo_element_font_usage = usage;
        self
    }

    pub fn with_font_families(mut self, families: Value) -> Self {
        self.font_families = families;
        self
    }
}

/// Reads a JSON array of [`RenderedDocument`]s, in spine order.
pub fn documents_from_reader<R: Read>(reader: R) -> Result<Vec<RenderedDocument>, StatsError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Accepts a CSS value reported either as a string or as a number
/// (`font-weight: 700`). Anything else counts as absent.
pub(crate) fn css_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// An `@font-face` rule before its family list and `src` are parsed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct RawFontFaceRule {
    #[serde(rename = "font-family", default, deserialize_with = "css_text")]
    pub family: Option<String>,
    #[serde(default, deserialize_with = "css_text")]
    pub src: Option<String>,
    #[serde(flatten)]
    pub properties: RawFontProperties,
}

#[derive(Debug, Clone, Deserialize)]
struct RawTextUsage {
    text: String,
    #[serde(rename = "font-family", default)]
    families: Vec<String>,
    #[serde(flatten)]
    properties: RawFontProperties,
    #[serde(rename = "text-transform", default, deserialize_with = "css_text")]
    text_transform: Option<String>,
    #[serde(rename = "font-variant", default, deserialize_with = "css_text")]
    font_variant: Option<String>,
}

impl From<RawTextUsage> for TextUsageRecord {
    fn from(raw: RawTextUsage) -> Self {
        TextUsageRecord {
            text: raw.text,
            families: raw.families,
            properties: raw.properties.normalize(),
            text_transform: normalize_text_transform(raw.text_transform.as_deref()),
            font_variant: raw.font_variant.unwrap_or_default(),
            pseudo: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawPseudoProperties {
    #[serde(rename = "font-family", default, deserialize_with = "css_text")]
    family: Option<String>,
    #[serde(flatten)]
    properties: RawFontProperties,
    #[serde(rename = "text-transform", default, deserialize_with = "css_text")]
    text_transform: Option<String>,
    #[serde(rename = "font-variant", default, deserialize_with = "css_text")]
    font_variant: Option<String>,
}

/// A run synthesized for a pseudo element. Its family list arrives
/// unparsed.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawPseudoUsage(RawPseudoProperties, String, Option<String>);

impl RawPseudoUsage {
    pub(crate) fn raw_family(&self) -> &str {
        self.0.family.as_deref().unwrap_or("")
    }

    pub(crate) fn to_record(&self) -> TextUsageRecord {
        let RawPseudoUsage(properties, text, pseudo) = self;
        TextUsageRecord {
            text: text.clone(),
            families: parse_font_families(self.raw_family()),
            properties: properties.properties.normalize(),
            text_transform: normalize_text_transform(properties.text_transform.as_deref()),
            font_variant: properties.font_variant.clone().unwrap_or_default(),
            pseudo: Some(pseudo.clone().unwrap_or_default()),
        }
    }
}

pub(crate) fn decode_list<T: DeserializeOwned>(
    document: &str,
    what: &str,
    value: &Value,
) -> Result<Vec<T>, StatsError> {
    let Value::Array(items) = value else {
        error!("Expected a list of {} for {}, got {}", what, document, value);
        return Err(StatsError::unexpected(document, format!("{} is not a list", what)));
    };
    items
        .iter()
        .map(|item| {
            T::deserialize(item).map_err(|e| {
                error!("Malformed entry in {} for {}: {}", what, document, item);
                StatsError::unexpected(document, format!("malformed entry in {}: {}", what, e))
            })
        })
        .collect()
}

pub(crate) fn decode_usage(document: &str, value: &Value) -> Result<Vec<TextUsageRecord>, StatsError> {
    let usage: Vec<RawTextUsage> = decode_list(document, "font usage", value)?;
    Ok(usage.into_iter().map(TextUsageRecord::from).collect())
}

/// Raw `font-family` values named in the document.
pub(crate) fn decode_family_values(document: &str, value: &Value) -> Result<Vec<String>, StatsError> {
    let Value::Object(map) = value else {
        error!("Expected a mapping of font families for {}, got {}", document, value);
        return Err(StatsError::unexpected(document, "font families is not a mapping"));
    };
    Ok(map.keys().cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FontStretch, FontStyle, TextTransform};
    use serde_json::json;

    #[test]
    fn numeric_weight_is_accepted() {
        let rules: Vec<RawFontFaceRule> = decode_list(
            "ch.html",
            "font-face rules",
            &json!([{"font-family": "Foo", "font-weight": 700, "src": "url(a.otf)"}]),
        )
        .unwrap();
        assert_eq!(rules[0].properties.weight.as_deref(), Some("700"));
        assert_eq!(rules[0].family.as_deref(), Some("Foo"));
    }

    #[test]
    fn usage_is_normalized() {
        let records = decode_usage(
            "ch.html",
            &json!([{
                "text": "abc",
                "font-family": ["Foo", "serif"],
                "font-weight": "bold",
                "font-style": "italic",
                "font-stretch": "bogus",
                "text-transform": "UPPERCASE",
                "font-variant": null
            }]),
        )
        .unwrap();
        let record = &records[0];
        assert_eq!(record.families, vec!["Foo", "serif"]);
        assert_eq!(record.properties.weight, 700);
        assert_eq!(record.properties.style, FontStyle::Italic);
        assert_eq!(record.properties.stretch, FontStretch::Normal);
        assert_eq!(record.text_transform, TextTransform::Uppercase);
        assert_eq!(record.font_variant, "");
        assert!(!record.is_pseudo_element());
    }

    #[test]
    fn pseudo_usage_parses_family_string() {
        let pseudo: Vec<RawPseudoUsage> = decode_list(
            "ch.html",
            "pseudo element font usage",
            &json!([[{"font-family": "\"Drop Cap\", serif", "font-size": "3em"}, "\u{201c}Once", "first-letter"]]),
        )
        .unwrap();
        let record = pseudo[0].to_record();
        assert_eq!(record.families, vec!["Drop Cap", "serif"]);
        assert!(record.is_first_letter());
        assert_eq!(pseudo[0].raw_family(), "\"Drop Cap\", serif");
    }

    #[test]
    fn wrong_shapes_are_fatal() {
        let err = decode_usage("ch.html", &json!({"text": "abc"})).unwrap_err();
        assert!(matches!(err, StatsError::UnexpectedOutput { .. }));

        let err = decode_usage("ch.html", &json!([{"font-family": ["Foo"]}])).unwrap_err();
        assert!(matches!(err, StatsError::UnexpectedOutput { .. }));

        let err = decode_usage("ch.html", &json!(["abc"])).unwrap_err();
        assert!(matches!(err, StatsError::UnexpectedOutput { .. }));

        let err = decode_family_values("ch.html", &json!(["Foo"])).unwrap_err();
        assert!(err.to_string().contains("ch.html"));
    }

    #[test]
    fn documents_from_json_dump() {
        let raw = r#"[{"name": "a.html", "font_face_rules": [], "font_usage": []}]"#;
        let documents = documents_from_reader(raw.as_bytes()).unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].name, "a.html");
        assert!(documents[0].pseudo_element_font_usage.is_null());
    }
}
