//! Error types for [`crate::GitView`] operations.
//!
//! [`GitViewError`] is the single error type returned by fallible `GitView`
//! methods. Parser-tolerant paths (malformed `name-status` rows, undecodable
//! diffs) do not raise errors — they degrade per the contracts documented on
//! the methods that produce them.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by [`crate::GitView`] operations.
#[derive(Debug, Error)]
pub enum GitViewError {
    /// The `git` binary could not be spawned at all.
    #[error("failed to spawn `git {args}`: {source}")]
    Spawn {
        /// The argument string that was passed to `git`.
        args: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// `git` exited non-zero.
    #[error("`git {args}` failed (exit {exit_code:?}): {stderr}")]
    CommandFailed {
        /// The argument string that was passed to `git`.
        args: String,
        /// Process exit code, if the process was not killed by a signal.
        exit_code: Option<i32>,
        /// Captured stderr, trimmed.
        stderr: String,
    },

    /// `ref` did not resolve to a commit.
    #[error("ref `{reference}` does not resolve to a commit")]
    UnknownRef {
        /// The ref or commit-ish that failed to resolve.
        reference: String,
    },

    /// The repository working tree does not exist or is not a git repository.
    #[error("`{path}` is not a git working tree")]
    NotARepository {
        /// The path that was checked.
        path: PathBuf,
    },
}
