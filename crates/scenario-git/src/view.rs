//! Read-only view over a cloned Git repository.
//!
//! `GitView` shells out to the system `git` binary rather than binding to a
//! library (`gix`, `git2`). The surface this type depends on is pinned to an
//! exact CLI contract (`git show --name-status --format=oneline`, `git diff`,
//! `git rev-list --count`) — shelling out keeps behavior identical to what
//! that contract actually describes instead of reimplementing it atop a
//! library's own object model.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::commit::{ChangeEntry, ChangeKind, Commit, CommitId};
use crate::error::GitViewError;

/// Read-only handle onto one already-cloned repository working tree.
#[derive(Clone, Debug)]
pub struct GitView {
    root: PathBuf,
}

impl GitView {
    /// Open a view onto the working tree rooted at `root`.
    ///
    /// Does not itself verify that `root` is a git repository; the first
    /// failing git invocation will surface [`GitViewError::NotARepository`]
    /// via [`Self::ensure_repository`] if the caller opts in.
    #[must_use]
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The working tree root this view operates on.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Confirm `root` is a working git repository.
    ///
    /// # Errors
    /// Returns [`GitViewError::NotARepository`] if `git rev-parse
    /// --is-inside-work-tree` fails.
    pub fn ensure_repository(&self) -> Result<(), GitViewError> {
        match self.run(&["rev-parse", "--is-inside-work-tree"]) {
            Ok(_) => Ok(()),
            Err(_) => Err(GitViewError::NotARepository {
                path: self.root.clone(),
            }),
        }
    }

    /// Resolve `reference` (branch name, tag, or commit-ish) to its tip
    /// commit.
    ///
    /// The miner drives traversal itself via parent pointers, so this view
    /// only needs to resolve the tip — it is not asked to enumerate history.
    ///
    /// # Errors
    /// Returns [`GitViewError::UnknownRef`] if `reference` does not resolve,
    /// or [`GitViewError::CommandFailed`]/[`GitViewError::Spawn`] on other
    /// git failures.
    pub fn resolve(&self, reference: &str) -> Result<Commit, GitViewError> {
        let rev = self
            .run(&["rev-parse", reference])
            .map_err(|_| GitViewError::UnknownRef {
                reference: reference.to_owned(),
            })?;
        let id = rev.trim().to_owned();
        self.commit(&id)
    }

    /// Fetch a single commit's metadata by id.
    ///
    /// # Errors
    /// Returns [`GitViewError::UnknownRef`] if `id` does not resolve.
    pub fn commit(&self, id: &str) -> Result<Commit, GitViewError> {
        // %H=id, %P=parents (space separated), %ct=committer timestamp, %B=raw body
        let format = "%H%x01%P%x01%ct%x01%B%x02";
        let out = self
            .run(&["log", "-1", &format!("--format={format}"), id])
            .map_err(|_| GitViewError::UnknownRef {
                reference: id.to_owned(),
            })?;
        let record = out.trim_end_matches('\u{2}').trim_end_matches('\n');
        let mut fields = record.splitn(4, '\u{1}');
        let hex = fields.next().unwrap_or_default().trim();
        let parents = fields.next().unwrap_or_default();
        let ts = fields.next().unwrap_or_default();
        let message = fields.next().unwrap_or_default().to_owned();

        let commit_id = CommitId::new(hex).map_err(|_| GitViewError::UnknownRef {
            reference: id.to_owned(),
        })?;
        let parents = parents
            .split_whitespace()
            .filter_map(|p| CommitId::new(p).ok())
            .collect();
        let timestamp = ts.trim().parse().unwrap_or(0);

        Ok(Commit {
            id: commit_id,
            parents,
            timestamp,
            message,
        })
    }

    /// Parse the per-commit name-status change list.
    ///
    /// `git show <id> --name-status --format=oneline` emits the commit title
    /// on the first line, then blank-delimited rows of
    /// shape `<KIND>\t<PATH>` or `<KIND>\t<FROM>\t<TO>` for renames. Blank
    /// lines are dropped; change-kind codes of length 1 or 2 are accepted;
    /// rename rows are recognized but their kind never counts toward grams.
    ///
    /// # Errors
    /// Returns a `GitViewError` if `git show` fails outright (unknown commit).
    pub fn change_list(&self, id: &CommitId) -> Result<Vec<ChangeEntry>, GitViewError> {
        let out = self.run(&[
            "show",
            id.as_str(),
            "--name-status",
            "--format=oneline",
        ])?;
        Ok(parse_name_status(&out))
    }

    /// Produce the textual diff of `id` against its first parent, or the
    /// empty tree if `id` is a root commit.
    ///
    /// Returns an empty byte vector if the diff cannot be decoded as UTF-8 —
    /// callers treat that commit as having no patch identity, not as an
    /// error.
    ///
    /// # Errors
    /// Returns a `GitViewError` if the underlying `git diff`/`git hash-object`
    /// invocation fails to run at all.
    pub fn patch(&self, id: &CommitId) -> Result<Vec<u8>, GitViewError> {
        let parent_arg = self.first_parent(id)?;
        let base = parent_arg.unwrap_or_else(Self::empty_tree_hash);
        let bytes = self.run_bytes(&["diff", &base, id.as_str()])?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text.into_bytes(),
            Err(_) => Vec::new(),
        })
    }

    /// All references excluding `HEAD` pseudorefs.
    ///
    /// # Errors
    /// Returns a `GitViewError` if `git for-each-ref` fails.
    pub fn branches(&self) -> Result<Vec<String>, GitViewError> {
        let out = self.run(&[
            "for-each-ref",
            "--format=%(refname:short)",
            "refs/heads",
            "refs/remotes",
            "refs/tags",
        ])?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && *l != "HEAD" && !l.ends_with("/HEAD"))
            .map(str::to_owned)
            .collect())
    }

    fn first_parent(&self, id: &CommitId) -> Result<Option<String>, GitViewError> {
        let commit = self.commit(id.as_str())?;
        Ok(commit.parents.first().map(|p| p.as_str().to_owned()))
    }

    /// The well-known empty tree object id, valid in every Git repository.
    fn empty_tree_hash() -> String {
        "4b825dc642cb6eb9a060e54bf8d69288fbee4904".to_owned()
    }

    fn run(&self, args: &[&str]) -> Result<String, GitViewError> {
        let bytes = self.run_bytes(args)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn run_bytes(&self, args: &[&str]) -> Result<Vec<u8>, GitViewError> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|source| GitViewError::Spawn {
                args: args.join(" "),
                source,
            })?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(GitViewError::CommandFailed {
                args: args.join(" "),
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            })
        }
    }
}

/// Parse `git show --name-status --format=oneline` output into change
/// entries, tolerating blank lines and variable-width status codes.
fn parse_name_status(out: &str) -> Vec<ChangeEntry> {
    let mut lines = out.lines();
    lines.next(); // commit title line

    let mut entries = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let mut cols = line.split('\t');
        let Some(code) = cols.next() else { continue };
        let kind = ChangeKind::parse(code);
        match kind {
            ChangeKind::Renamed => {
                let (Some(from), Some(to)) = (cols.next(), cols.next()) else {
                    continue;
                };
                entries.push(ChangeEntry {
                    kind,
                    path: PathBuf::from(to),
                    from_path: Some(PathBuf::from(from)),
                });
            }
            _ => {
                let Some(path) = cols.next() else { continue };
                entries.push(ChangeEntry {
                    kind,
                    path: PathBuf::from(path),
                    from_path: None,
                });
            }
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_list_parses_blank_delimited_rows_and_renames() {
        let sample =
            "abcdef1 subject line\n\nA\tfoo.py\nM\tbar.py\n\nR100\told.py\tnew.py\nMM\tconflict.py\n";
        let entries = parse_name_status(sample);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].kind, ChangeKind::Added);
        assert_eq!(entries[0].path, PathBuf::from("foo.py"));
        assert_eq!(entries[2].kind, ChangeKind::Renamed);
        assert_eq!(entries[2].from_path, Some(PathBuf::from("old.py")));
        assert_eq!(entries[2].path, PathBuf::from("new.py"));
        assert_eq!(entries[3].kind, ChangeKind::ModifiedConflict);
    }

    #[test]
    fn change_list_drops_blank_lines_and_ignores_unknown_codes() {
        let sample = "abc subject\n\n\nD\tgone.py\n\nA\tkept.py\n";
        let entries = parse_name_status(sample);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, ChangeKind::Other);
        assert_eq!(entries[1].kind, ChangeKind::Added);
    }
}
