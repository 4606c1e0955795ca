use std::fmt::Formatter;

/// Errors that abort a whole run.
#[derive(Debug)]
pub enum StatsError {
    /// The renderer handed back data of the wrong shape, so nothing it says
    /// about the book can be trusted.
    UnexpectedOutput { document: String, what: String },
    JsonError(serde_json::Error),
    IoError(std::io::Error),
}

impl StatsError {
    pub(crate) fn unexpected(document: &str, what: impl Into<String>) -> StatsError {
        StatsError::UnexpectedOutput {
            document: document.to_owned(),
            what: what.into(),
        }
    }
}

impl std::fmt::Display for StatsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            StatsError::UnexpectedOutput { document, what } => {
                write!(f, "Unexpected renderer output for {}: {}", document, what)
            }
            StatsError::JsonError(e) => write!(f, "JSON error: {}", e),
            StatsError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StatsError {}

impl From<serde_json::Error> for StatsError {
    fn from(e: serde_json::Error) -> Self {
        StatsError::JsonError(e)
    }
}

impl From<std::io::Error> for StatsError {
    fn from(e: std::io::Error) -> Self {
        StatsError::IoError(e)
    }
}

/// Why an `@font-face` rule was left out. None of these stop the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    MissingFamily,
    InheritFamily,
    MissingSrc,
    /// No URL in `src` points at a file in the book.
    UnresolvedSrc(String),
    /// The URL points outside the book, e.g. at a web server.
    NonLocal(String),
    /// The URL is local but the book has no such file.
    MissingResource(String),
}

impl std::fmt::Display for RuleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            RuleError::MissingFamily => write!(f, "no font-family"),
            RuleError::InheritFamily => write!(f, "font-family is inherit"),
            RuleError::MissingSrc => write!(f, "no src"),
            RuleError::UnresolvedSrc(src) => {
                write!(f, "src refers to a font file that does not exist in the book: {}", src)
            }
            RuleError::NonLocal(href) => write!(f, "non-local URI: {}", href),
            RuleError::MissingResource(href) => write!(f, "missing resource: {}", href),
        }
    }
}

impl std::error::Error for RuleError {}
