use tracing::warn;

use crate::bridge::RawFontFaceRule;
use crate::container::{Container, resolve_href};
use crate::css::{parse_font_families, parse_src_urls};
use crate::error::RuleError;
use crate::normalize::fold_family;
use crate::types::FontFaceRule;

impl FontFaceRule {
    /// Turns a raw `@font-face` rule from `document` into a usable one.
    ///
    /// The source is the first `src` URL that names an existing file in the
    /// package. Rules without a family, with `font-family: inherit` or with
    /// no resolvable source are rejected.
    pub fn resolve<C: Container + ?Sized>(
        raw: &RawFontFaceRule,
        container: &C,
        document: &str,
    ) -> Result<FontFaceRule, RuleError> {
        let family = raw
            .family
            .as_deref()
            .map(str::trim)
            .filter(|family| !family.is_empty())
            .ok_or(RuleError::MissingFamily)?;
        let families = parse_font_families(family);
        match families.first() {
            None => return Err(RuleError::MissingFamily),
            Some(first) if first.eq_ignore_ascii_case("inherit") => {
                return Err(RuleError::InheritFamily);
            }
            Some(_) => {}
        }

        let src = raw
            .src
            .as_deref()
            .map(str::trim)
            .filter(|src| !src.is_empty())
            .ok_or(RuleError::MissingSrc)?;
        let mut source = None;
        for href in parse_src_urls(src) {
            match resolve_href(container, document, &href) {
                Ok(name) => {
                    source = Some(name);
                    break;
                }
                Err(e) => warn!("Ignoring {} in @font-face rule in {}: {}", href, document, e),
            }
        }
        let source = source.ok_or_else(|| RuleError::UnresolvedSrc(src.to_owned()))?;

        Ok(FontFaceRule {
            families: families.iter().map(|f| fold_family(f)).collect(),
            properties: raw.properties.normalize(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::normalize::RawFontProperties;
    use crate::types::{FontStretch, FontStyle};

    fn package() -> BTreeSet<String> {
        ["fonts/foo.otf", "fonts/foo-bold.otf"]
            .iter()
            .map(|n| n.to_string())
            .collect()
    }

    fn raw(family: Option<&str>, src: Option<&str>) -> RawFontFaceRule {
        RawFontFaceRule {
            family: family.map(str::to_owned),
            src: src.map(str::to_owned),
            properties: RawFontProperties::default(),
        }
    }

    #[test_log::test]
    fn first_resolvable_url_wins() {
        let rule = FontFaceRule::resolve(
            &raw(
                Some("\"Foo\", FooFallback"),
                Some("url(http://example.com/foo.otf), url(fonts/missing.otf), url(fonts/foo.otf), url(fonts/foo-bold.otf)"),
            ),
            &package(),
            "index.html",
        )
        .unwrap();
        assert_eq!(rule.source, "fonts/foo.otf");
        assert_eq!(
            rule.families,
            ["foo", "foofallback"].iter().map(|s| s.to_string()).collect()
        );
        assert_eq!(rule.properties.weight, 400);
        assert_eq!(rule.properties.style, FontStyle::Normal);
        assert_eq!(rule.properties.stretch, FontStretch::Normal);
    }

    #[test]
    fn descriptors_are_normalized() {
        let mut r = raw(Some("Foo"), Some("url(fonts/foo-bold.otf)"));
        r.properties = RawFontProperties {
            weight: Some("bold".to_owned()),
            style: Some("italic".to_owned()),
            stretch: Some("condensed".to_owned()),
        };
        let rule = FontFaceRule::resolve(&r, &package(), "index.html").unwrap();
        assert_eq!(rule.properties.weight, 700);
        assert_eq!(rule.properties.style, FontStyle::Italic);
        assert_eq!(rule.properties.stretch.index(), 2);
    }

    #[test_log::test]
    fn unusable_rules_are_rejected() {
        let pkg = package();
        let resolve = |family, src| FontFaceRule::resolve(&raw(family, src), &pkg, "index.html");
        assert_eq!(resolve(None, Some("url(fonts/foo.otf)")), Err(RuleError::MissingFamily));
        assert_eq!(resolve(Some("  "), Some("url(fonts/foo.otf)")), Err(RuleError::MissingFamily));
        assert_eq!(resolve(Some("inherit"), Some("url(fonts/foo.otf)")), Err(RuleError::InheritFamily));
        assert_eq!(resolve(Some("Foo"), None), Err(RuleError::MissingSrc));
        assert_eq!(
            resolve(Some("Foo"), Some("local(Foo)")),
            Err(RuleError::UnresolvedSrc("local(Foo)".to_owned()))
        );
        assert_eq!(
            resolve(Some("Foo"), Some("url(fonts/gone.otf)")),
            Err(RuleError::UnresolvedSrc("url(fonts/gone.otf)".to_owned()))
        );
    }
}
