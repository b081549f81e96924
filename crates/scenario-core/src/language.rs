//! The programming-language filter applied to file paths during mining.

use std::path::Path;

/// Which language's files the miner should track for file-commit-gram
/// accounting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LanguageFilter {
    /// `.py` files.
    Python,
    /// `.java` files.
    Java,
    /// `.kt` files.
    Kotlin,
    /// `.txt` files.
    Text,
}

impl LanguageFilter {
    /// Parse a CLI value (`python`, `java`, `kotlin`, `text`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "python" => Some(Self::Python),
            "java" => Some(Self::Java),
            "kotlin" => Some(Self::Kotlin),
            "text" => Some(Self::Text),
            _ => None,
        }
    }

    /// The filter's suffix string.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Python => ".py",
            Self::Java => ".java",
            Self::Kotlin => ".kt",
            Self::Text => ".txt",
        }
    }

    /// Whether `path` matches this filter.
    ///
    /// Matching is substring, not suffix: `foo.py.bak` matches `.py`. This
    /// is a deliberate parity choice (documented in DESIGN.md) rather than
    /// an oversight — switching to a trailing-suffix check is a one-line
    /// change here if a caller needs the stricter behavior.
    #[must_use]
    pub fn matches(self, path: &Path) -> bool {
        path.to_string_lossy().contains(self.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn substring_match_admits_trailing_extension() {
        assert!(LanguageFilter::Python.matches(&PathBuf::from("foo.py.bak")));
    }

    #[test]
    fn suffix_mismatch_is_rejected() {
        assert!(!LanguageFilter::Python.matches(&PathBuf::from("foo.txt")));
    }

    #[test]
    fn parse_rejects_unknown_values() {
        assert!(LanguageFilter::parse("rust").is_none());
    }
}
