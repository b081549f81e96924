//! Patch-identity fingerprinting.
//!
//! Normalizes a commit's textual diff into a fingerprint that is stable
//! under the noise cherry-picking introduces (different blob hashes,
//! possibly different file paths on rename, trailing-newline drift) so two
//! commits carrying the same payload hash identically.

use regex::Regex;
use sha1::{Digest, Sha1};
use std::sync::OnceLock;

/// A normalized-patch fingerprint.
///
/// The all-zero value is reserved to mean "could not be computed" (the diff
/// failed to decode as UTF-8, or was empty input). Spec §4.3 requires that
/// two empty fingerprints never compare equal to each other, which is why
/// this type does not derive `PartialEq` — see the hand-written impl below.
///
/// Deliberately does not derive or implement `Eq`: `Eq` requires equality to
/// be reflexive (`a == a`), which the empty sentinel violates by design.
#[derive(Clone, Copy, Debug, Hash)]
pub struct PatchFingerprint {
    digest: [u8; 20],
    empty: bool,
}

impl PatchFingerprint {
    /// The sentinel returned when a diff cannot be decoded.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            digest: [0u8; 20],
            empty: true,
        }
    }

    /// `true` if this is the "could not be computed" sentinel.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.empty
    }
}

impl PartialEq for PatchFingerprint {
    /// Two fingerprints are equal iff neither is the empty sentinel and
    /// their digests match. This is the one place in the crate where a
    /// derived `PartialEq` would silently make two undecodable diffs compare
    /// equal to each other, so it is written out by hand.
    fn eq(&self, other: &Self) -> bool {
        !self.empty && !other.empty && self.digest == other.digest
    }
}

fn header_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(index|diff|---|\+\+\+) ").expect("static regex is valid")
    })
}

/// Compute the fingerprint of a commit's diff bytes.
///
/// Drops lines matching `^(index|diff|---|\+\+\+) ` (these carry only blob
/// hashes and paths, which vary across cherry-picks) and blank lines, then
/// SHA-1s the remainder. Returns [`PatchFingerprint::empty`] if `diff` is not
/// valid UTF-8.
#[must_use]
pub fn fingerprint(diff: &[u8]) -> PatchFingerprint {
    let Ok(text) = std::str::from_utf8(diff) else {
        return PatchFingerprint::empty();
    };

    let header = header_line_pattern();
    let mut hasher = Sha1::new();
    for line in text.lines() {
        if line.is_empty() || header.is_match(line) {
            continue;
        }
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    let digest: [u8; 20] = hasher.finalize().into();
    PatchFingerprint {
        digest,
        empty: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fingerprints_never_compare_equal() {
        let a = PatchFingerprint::empty();
        let b = PatchFingerprint::empty();
        assert_ne!(a, b);
    }

    #[test]
    fn invalid_utf8_yields_empty_fingerprint() {
        let invalid = [0xff, 0xfe, 0xfd];
        let fp = fingerprint(&invalid);
        assert!(fp.is_empty());
    }

    #[test]
    fn identical_payload_under_different_blob_hashes_matches() {
        let a = b"diff --git a/foo.py b/foo.py\nindex abc123..def456 100644\n--- a/foo.py\n+++ b/foo.py\n@@ -1,1 +1,1 @@\n-old\n+new\n";
        let b = b"diff --git a/bar.py b/bar.py\nindex 111111..222222 100644\n--- a/bar.py\n+++ b/bar.py\n@@ -1,1 +1,1 @@\n-old\n+new\n";
        assert_eq!(fingerprint(a), fingerprint(b));
    }

    #[test]
    fn differing_payload_does_not_match() {
        let a = b"@@ -1,1 +1,1 @@\n-old\n+new\n";
        let b = b"@@ -1,1 +1,1 @@\n-old\n+different\n";
        assert_ne!(fingerprint(a), fingerprint(b));
    }

    #[test]
    fn blank_line_drift_does_not_change_fingerprint() {
        let a = b"@@ -1,1 +1,1 @@\n-old\n+new\n";
        let b = b"@@ -1,1 +1,1 @@\n\n-old\n\n+new\n\n";
        assert_eq!(fingerprint(a), fingerprint(b));
    }
}
