//! Looking up font files inside the book package.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::error::RuleError;

/// The book package, addressed by slash-separated names relative to its
/// root (`OEBPS/fonts/a.otf`).
pub trait Container {
    fn contains(&self, name: &str) -> bool;

    /// Maps an absolute filesystem path back to a package name, for
    /// renderers that report `file:` URLs.
    fn name_for_path(&self, _path: &Path) -> Option<String> {
        None
    }
}

/// A package unpacked into a directory.
#[derive(Debug, Clone)]
pub struct DirectoryContainer {
    root: PathBuf,
}

impl DirectoryContainer {
    pub fn new<P: Into<PathBuf>>(root: P) -> DirectoryContainer {
        let root = root.into();
        let root = std::fs::canonicalize(&root).unwrap_or(root);
        DirectoryContainer { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Container for DirectoryContainer {
    fn contains(&self, name: &str) -> bool {
        let relative = Path::new(name);
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return false;
        }
        std::fs::canonicalize(self.root.join(relative))
            .is_ok_and(|path| path.starts_with(&self.root) && path.is_file())
    }

    fn name_for_path(&self, path: &Path) -> Option<String> {
        let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts = relative
            .components()
            .map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Option<Vec<String>>>()?;
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }
}

/// A fixed set of names, handy when the package lives in memory.
impl Container for BTreeSet<String> {
    fn contains(&self, name: &str) -> bool {
        BTreeSet::contains(self, name)
    }
}

/// Joins a relative href onto the document's own name. Segments are decoded
/// one at a time, after `..` has been applied, so none may decode to a
/// separator or a dot segment.
fn relative_name(document: &str, href: &str) -> Result<String, RuleError> {
    let missing = || RuleError::MissingResource(href.to_owned());
    let url = Url::parse("file:///")
        .and_then(|root| root.join(document))
        .and_then(|base| base.join(href))
        .map_err(|_| missing())?;
    // Protocol-relative, e.g. `//cdn.example.com/a.otf`
    if url.host_str().is_some_and(|host| !host.is_empty()) {
        return Err(RuleError::NonLocal(href.to_owned()));
    }

    let mut parts = Vec::new();
    for segment in url.path_segments().ok_or_else(missing)? {
        if segment.is_empty() {
            continue;
        }
        let part = urlencoding::decode(segment).map_err(|_| missing())?;
        if part == "." || part == ".." || part.contains(['/', '\\']) {
            return Err(missing());
        }
        parts.push(part.into_owned());
    }
    if parts.is_empty() { Err(missing()) } else { Ok(parts.join("/")) }
}

/// Resolves a URL found in `document` to the name of an existing file in
/// the package.
///
/// Relative URLs are taken relative to the document itself. `file:` URLs
/// are mapped back into the package; any other scheme is rejected.
pub fn resolve_href<C: Container + ?Sized>(
    container: &C,
    document: &str,
    href: &str,
) -> Result<String, RuleError> {
    let name = match Url::parse(href) {
        Ok(url) => {
            if url.scheme() != "file" {
                return Err(RuleError::NonLocal(href.to_owned()));
            }
            url.to_file_path()
                .ok()
                .and_then(|path| container.name_for_path(&path))
                .ok_or_else(|| RuleError::MissingResource(href.to_owned()))?
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => relative_name(document, href)?,
        Err(_) => return Err(RuleError::UnresolvedSrc(href.to_owned())),
    };

    if container.contains(&name) {
        Ok(name)
    } else {
        Err(RuleError::MissingResource(href.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn relative_to_document() {
        let pkg = package(&["OEBPS/fonts/a.otf", "fonts/b.otf"]);
        assert_eq!(
            resolve_href(&pkg, "OEBPS/text/ch1.html", "../fonts/a.otf"),
            Ok("OEBPS/fonts/a.otf".to_owned())
        );
        assert_eq!(
            resolve_href(&pkg, "index.html", "fonts/b.otf"),
            Ok("fonts/b.otf".to_owned())
        );
    }

    #[test]
    fn percent_encoding_and_fragments() {
        let pkg = package(&["fonts/my font.otf"]);
        assert_eq!(
            resolve_href(&pkg, "ch.html", "fonts/my%20font.otf#glyphs"),
            Ok("fonts/my font.otf".to_owned())
        );
    }

    #[test]
    fn non_local_and_missing() {
        let pkg = package(&["fonts/a.otf"]);
        assert_eq!(
            resolve_href(&pkg, "ch.html", "https://example.com/a.otf"),
            Err(RuleError::NonLocal("https://example.com/a.otf".to_owned()))
        );
        assert_eq!(
            resolve_href(&pkg, "ch.html", "fonts/nope.otf"),
            Err(RuleError::MissingResource("fonts/nope.otf".to_owned()))
        );
        assert_eq!(
            resolve_href(&pkg, "ch.html", "//cdn.example.com/a.otf"),
            Err(RuleError::NonLocal("//cdn.example.com/a.otf".to_owned()))
        );
    }

    #[test]
    fn encoded_separators_cannot_leave_the_package() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("book/fonts")).unwrap();
        std::fs::write(dir.path().join("book/fonts/a.otf"), b"OTTO").unwrap();
        std::fs::write(dir.path().join("secret.otf"), b"OTTO").unwrap();
        let container = DirectoryContainer::new(dir.path().join("book"));

        let secret = std::fs::canonicalize(dir.path().join("secret.otf")).unwrap();
        let absolute = urlencoding::encode(&secret.to_string_lossy()).into_owned();
        for href in [absolute.as_str(), "..%2Fsecret.otf", "fonts%2F..%2F..%2Fsecret.otf"] {
            assert!(
                matches!(
                    resolve_href(&container, "ch.html", href),
                    Err(RuleError::MissingResource(_))
                ),
                "{} resolved",
                href
            );
        }
        assert_eq!(
            resolve_href(&container, "ch.html", "fonts%2Fa.otf"),
            Err(RuleError::MissingResource("fonts%2Fa.otf".to_owned()))
        );
        assert_eq!(resolve_href(&container, "ch.html", "fonts/a.otf"), Ok("fonts/a.otf".to_owned()));
    }

    #[test]
    fn directory_lookups_stay_under_the_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("book/fonts")).unwrap();
        std::fs::write(dir.path().join("book/fonts/a.otf"), b"OTTO").unwrap();
        std::fs::write(dir.path().join("secret.otf"), b"OTTO").unwrap();
        let container = DirectoryContainer::new(dir.path().join("book"));

        assert!(container.contains("fonts/a.otf"));
        assert!(!container.contains("fonts"));
        assert!(!container.contains("../secret.otf"));
        assert!(!container.contains("fonts/../../secret.otf"));
        let secret = dir.path().join("secret.otf");
        assert!(!container.contains(&secret.to_string_lossy()));
        assert_eq!(container.name_for_path(&dir.path().join("book/../secret.otf")), None);
    }

    #[test]
    fn file_urls_map_into_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("fonts")).unwrap();
        std::fs::write(dir.path().join("fonts/a.otf"), b"OTTO").unwrap();
        let container = DirectoryContainer::new(dir.path());

        let href = Url::from_file_path(container.root().join("fonts/a.otf"))
            .unwrap()
            .to_string();
        assert_eq!(resolve_href(&container, "ch.html", &href), Ok("fonts/a.otf".to_owned()));
        assert_eq!(
            resolve_href(&container, "text/ch.html", "../fonts/a.otf"),
            Ok("fonts/a.otf".to_owned())
        );

        let outside = Url::from_file_path(std::env::temp_dir().join("elsewhere.otf"))
            .unwrap()
            .to_string();
        assert!(matches!(
            resolve_href(&container, "ch.html", &outside),
            Err(RuleError::MissingResource(_))
        ));
    }
}
