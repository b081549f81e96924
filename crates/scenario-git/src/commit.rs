//! Core commit types: validated commit identifiers, change-list entries, and
//! the parsed `Commit` record.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A validated 40-character lowercase-hex Git object ID.
///
/// Mirrors the rest of the corpus's "validate once at the boundary, carry a
/// typed value everywhere after" convention: once a `CommitId` exists, every
/// downstream consumer can trust its shape without re-checking.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitId(String);

/// A `CommitId` failed validation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid commit id `{value}`: {reason}")]
pub struct InvalidCommitId {
    value: String,
    reason: String,
}

impl CommitId {
    /// Validate and wrap a 40-hex-character commit id.
    ///
    /// # Errors
    /// Returns [`InvalidCommitId`] if `s` is not exactly 40 lowercase hex
    /// characters.
    pub fn new(s: impl Into<String>) -> Result<Self, InvalidCommitId> {
        let s = s.into();
        if s.len() != 40 {
            return Err(InvalidCommitId {
                reason: format!("expected 40 hex characters, got {}", s.len()),
                value: s,
            });
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()) {
            return Err(InvalidCommitId {
                reason: "must contain only lowercase hex characters (0-9, a-f)".to_owned(),
                value: s,
            });
        }
        Ok(Self(s))
    }

    /// Borrow the inner hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CommitId {
    type Err = InvalidCommitId;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CommitId {
    type Error = InvalidCommitId;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<CommitId> for String {
    fn from(id: CommitId) -> Self {
        id.0
    }
}

/// The kind of change a `name-status` row reports for one path.
///
/// Only `Added`, `Modified`, and `ModifiedConflict` participate in
/// file-commit-gram accounting; `Renamed` is recognized but never drives
/// scenario state; `Other` absorbs everything else (deletions, type changes,
/// copies) so the parser never has to reject a row outright.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// `A` — file added.
    Added,
    /// `M` — file modified.
    Modified,
    /// `MM` — modified with conflict resolution recorded during a merge.
    ModifiedConflict,
    /// `R` (with any trailing similarity digits, e.g. `R100`) — renamed.
    Renamed,
    /// Anything else (`D`, `C`, `T`, ...) — ignored for scenario purposes.
    Other,
}

impl ChangeKind {
    /// Parse the leading status code of a `name-status` row.
    ///
    /// Accepts codes of length 1 or 2. Rename/copy codes carry a trailing
    /// similarity percentage (`R100`, `C87`); only the leading letter
    /// matters.
    #[must_use]
    pub fn parse(code: &str) -> Self {
        match code.as_bytes().first() {
            Some(b'A') => Self::Added,
            Some(b'M') if code.len() == 1 => Self::Modified,
            Some(b'M') => Self::ModifiedConflict,
            Some(b'R') => Self::Renamed,
            _ => Self::Other,
        }
    }

    /// Whether this kind participates in file-commit-gram accounting.
    #[must_use]
    pub const fn counts_toward_grams(self) -> bool {
        matches!(self, Self::Added | Self::Modified | Self::ModifiedConflict)
    }
}

/// One row of a commit's change list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEntry {
    /// The parsed change kind.
    pub kind: ChangeKind,
    /// The path affected. For renames this is the destination path.
    pub path: PathBuf,
    /// For renames, the source path; `None` otherwise.
    pub from_path: Option<PathBuf>,
}

/// A single commit as seen by [`crate::GitView`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    /// The commit's own id.
    pub id: CommitId,
    /// Parent ids in declaration order (empty for a root commit).
    pub parents: Vec<CommitId>,
    /// Committer timestamp, seconds since the Unix epoch.
    pub timestamp: i64,
    /// Full commit message (subject + body).
    pub message: String,
}

impl Commit {
    /// `true` if this is a merge commit (two or more parents).
    #[must_use]
    pub fn is_merge(&self) -> bool {
        self.parents.len() >= 2
    }

    /// `true` if this is a root commit (no parents).
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_id_rejects_wrong_length() {
        assert!(CommitId::new("abc").is_err());
    }

    #[test]
    fn commit_id_rejects_uppercase() {
        assert!(CommitId::new("A".repeat(40)).is_err());
    }

    #[test]
    fn commit_id_accepts_valid_hex() {
        let id = CommitId::new("a".repeat(40)).expect("valid");
        assert_eq!(id.as_str(), "a".repeat(40));
    }

    #[test]
    fn change_kind_parses_single_and_double_letter_codes() {
        assert_eq!(ChangeKind::parse("A"), ChangeKind::Added);
        assert_eq!(ChangeKind::parse("M"), ChangeKind::Modified);
        assert_eq!(ChangeKind::parse("MM"), ChangeKind::ModifiedConflict);
        assert_eq!(ChangeKind::parse("R100"), ChangeKind::Renamed);
        assert_eq!(ChangeKind::parse("D"), ChangeKind::Other);
    }

    #[test]
    fn only_add_modify_conflict_count_toward_grams() {
        assert!(ChangeKind::Added.counts_toward_grams());
        assert!(ChangeKind::Modified.counts_toward_grams());
        assert!(ChangeKind::ModifiedConflict.counts_toward_grams());
        assert!(!ChangeKind::Renamed.counts_toward_grams());
        assert!(!ChangeKind::Other.counts_toward_grams());
    }
}
