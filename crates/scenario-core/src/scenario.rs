//! Scenario record types: the immutable output of mining one repository.

use std::path::PathBuf;

use scenario_git::CommitId;
use serde::{Deserialize, Serialize};

/// A run of consecutive same-file modifications on one branch.
///
/// `first_commit` is chronologically newest and `last_commit` is
/// chronologically oldest in the run, matching traversal direction
/// (child→parent).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCommitGramScenario {
    /// Path of the file the run is about, relative to the repository root.
    pub file_path: PathBuf,
    /// Name of the branch the run was observed on.
    pub branch_name: String,
    /// Newest commit in the run.
    pub first_commit: CommitId,
    /// Oldest commit in the run.
    pub last_commit: CommitId,
    /// Number of commits in the run (`>= window_size`).
    pub length: usize,
}

/// A merge commit, with or without recorded textual conflict resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeScenario {
    /// The merge commit itself.
    pub merge_commit: CommitId,
    /// All parents of the merge commit (two or more).
    pub parents: Vec<CommitId>,
    /// `true` iff any file in the merge's change list has kind `MM`.
    pub had_conflicts: bool,
}

/// A commit detected as a cherry-pick of another commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CherryPickScenario {
    /// The commit that carries the cherry-picked payload.
    pub cherry_pick_commit: CommitId,
    /// The commit the payload was cherry-picked from.
    pub source_commit: CommitId,
    /// Parents of `cherry_pick_commit`.
    pub parents: Vec<CommitId>,
}

/// The complete output of mining one repository.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    /// All emitted file-commit-gram scenarios.
    pub file_commit_grams: Vec<FileCommitGramScenario>,
    /// All emitted merge scenarios.
    pub merges: Vec<MergeScenario>,
    /// All emitted cherry-pick scenarios.
    pub cherry_picks: Vec<CherryPickScenario>,
    /// Diagnostic trace of commits skipped due to parse failures, if any.
    /// `None` when mining completed without incident.
    pub error_trace: Option<String>,
}

impl ScenarioRecord {
    /// Append a line to the error trace, creating it if absent.
    pub fn push_diagnostic(&mut self, message: impl Into<String>) {
        let message = message.into();
        match &mut self.error_trace {
            Some(trace) => {
                trace.push('\n');
                trace.push_str(&message);
            }
            None => self.error_trace = Some(message),
        }
    }
}
