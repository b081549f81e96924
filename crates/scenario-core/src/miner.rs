//! Cross-branch deduplicated traversal that emits file-commit-gram, merge,
//! and cherry-pick scenarios from a [`GitView`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use scenario_git::{Commit, CommitId, GitView};
use tracing::warn;

use crate::language::LanguageFilter;
use crate::scenario::{CherryPickScenario, FileCommitGramScenario, MergeScenario, ScenarioRecord};

/// Maximum number of additional cherry-pick scenarios the duplicate-message
/// pass may emit, bounding the cost of the pairwise comparison on
/// repositories with many mechanically-regenerated commit messages.
const DUPLICATE_MESSAGE_CAP: usize = 50;

fn cherry_pick_trailer() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // The reference trailer grammar is a lookbehind
    // (`(?<=cherry picked from commit )[0-9a-f]{40}`); the `regex` crate has
    // no lookaround support, so the same literal prefix is captured as a
    // group instead of asserted behind a zero-width match. The matched hash
    // is identical either way.
    PATTERN.get_or_init(|| {
        Regex::new(r"cherry picked from commit ([0-9a-f]{40})").expect("static regex is valid")
    })
}

/// An in-progress file-commit-gram run tracked per `(branch, file)`.
#[derive(Clone, Debug)]
struct GramRun {
    first: CommitId,
    last: CommitId,
    length: usize,
}

/// Transient per-repository mining state.
///
/// Exclusively owned by [`ScenarioMiner`]; the visited set and message
/// tracker never escape it.
#[derive(Default)]
struct MinerState {
    /// `branch -> file -> run`, cleared after each branch finishes.
    runs: HashMap<String, HashMap<PathBuf, GramRun>>,
    /// Commit ids visited on any branch so far, persists across branches.
    visited: HashSet<CommitId>,
    /// `message -> commits carrying it`, used by the duplicate-message pass.
    messages: HashMap<String, Vec<Commit>>,
}

/// Configuration for one mining run.
#[derive(Clone, Copy, Debug)]
pub struct MinerConfig {
    /// Minimum run length for a file-commit-gram to be emitted.
    pub window_size: NonZeroUsize,
    /// Which file paths to track.
    pub language_filter: LanguageFilter,
}

/// Graph traversal and state machine that mines scenarios from one
/// repository.
pub struct ScenarioMiner {
    config: MinerConfig,
    state: MinerState,
}

impl ScenarioMiner {
    /// Create a miner for the given configuration.
    #[must_use]
    pub fn new(config: MinerConfig) -> Self {
        Self {
            config,
            state: MinerState::default(),
        }
    }

    /// Mine every branch of `view`, returning the accumulated scenario
    /// record.
    ///
    /// Per-commit parsing failures are swallowed into a diagnostic line
    /// appended to [`ScenarioRecord::error_trace`] rather than aborting the
    /// whole run — a single malformed commit must not lose the scenarios
    /// already found elsewhere in the repository.
    pub fn mine(&mut self, view: &GitView) -> ScenarioRecord {
        let mut record = ScenarioRecord::default();

        let branches = match view.branches() {
            Ok(branches) => branches,
            Err(err) => {
                record.push_diagnostic(format!("failed to list branches: {err}"));
                return record;
            }
        };

        for branch in branches {
            self.mine_branch(view, &branch, &mut record);
        }

        self.duplicate_message_pass(view, &mut record);
        record
    }

    fn mine_branch(&mut self, view: &GitView, branch: &str, record: &mut ScenarioRecord) {
        let tip = match view.resolve(branch) {
            Ok(commit) => commit,
            Err(err) => {
                record.push_diagnostic(format!("failed to resolve branch `{branch}`: {err}"));
                return;
            }
        };

        let mut frontier: VecDeque<CommitId> = VecDeque::new();
        let mut frontier_seen: HashSet<CommitId> = HashSet::new();
        frontier_seen.insert(tip.id.clone());
        frontier.push_back(tip.id.clone());

        let window = self.config.window_size.get();
        let mut keepalive = window.saturating_sub(1);

        while let Some(id) = frontier.pop_front() {
            let commit = match view.commit(id.as_str()) {
                Ok(commit) => commit,
                Err(err) => {
                    warn!(%branch, %id, %err, "skipping unreadable commit");
                    record.push_diagnostic(format!(
                        "skipped commit {id} on branch `{branch}`: {err}"
                    ));
                    continue;
                }
            };

            let already_visited = self.state.visited.contains(&commit.id);
            let first_time = if already_visited {
                if keepalive > 0 {
                    keepalive -= 1;
                    false
                } else {
                    break;
                }
            } else {
                self.state.visited.insert(commit.id.clone());
                self.state
                    .messages
                    .entry(commit.message.clone())
                    .or_default()
                    .push(commit.clone());
                for parent in &commit.parents {
                    if !self.state.visited.contains(parent) && frontier_seen.insert(parent.clone())
                    {
                        frontier.push_back(parent.clone());
                    }
                }
                true
            };

            self.process_commit(view, branch, &commit, first_time, record);
        }

        self.finalize_branch(branch, record);
    }

    /// Process one commit: merge/cherry-pick detection on first visit only,
    /// file-commit-gram state update on every visit (first or keepalive).
    fn process_commit(
        &mut self,
        view: &GitView,
        branch: &str,
        commit: &Commit,
        first_time: bool,
        record: &mut ScenarioRecord,
    ) {
        let is_merge = commit.is_merge();

        if first_time {
            if let Some(captures) = cherry_pick_trailer().captures(&commit.message) {
                if let Ok(source) = CommitId::new(&captures[1]) {
                    record.cherry_picks.push(CherryPickScenario {
                        cherry_pick_commit: commit.id.clone(),
                        source_commit: source,
                        parents: commit.parents.clone(),
                    });
                }
            }
        }

        let change_list = match view.change_list(&commit.id) {
            Ok(entries) => entries,
            Err(err) => {
                record.push_diagnostic(format!(
                    "skipped change list for {}: {err}",
                    commit.id
                ));
                return;
            }
        };

        let should_process = change_list.iter().any(|e| e.kind.counts_toward_grams());
        let mut had_conflicts = false;

        if should_process {
            let affected_files: Vec<(scenario_git::ChangeKind, PathBuf)> = change_list
                .iter()
                .filter(|e| e.kind.counts_toward_grams() && self.config.language_filter.matches(&e.path))
                .map(|e| (e.kind, e.path.clone()))
                .collect();

            let branch_runs = self.state.runs.entry(branch.to_owned()).or_default();

            for (kind, path) in &affected_files {
                if is_merge && matches!(kind, scenario_git::ChangeKind::ModifiedConflict) {
                    had_conflicts = true;
                }
                branch_runs
                    .entry(path.clone())
                    .and_modify(|run| {
                        run.length += 1;
                        if run.length >= self.config.window_size.get() {
                            run.last = commit.id.clone();
                        }
                    })
                    .or_insert_with(|| GramRun {
                        first: commit.id.clone(),
                        last: commit.id.clone(),
                        length: 1,
                    });
            }

            let affected_paths: HashSet<&PathBuf> =
                affected_files.iter().map(|(_, path)| path).collect();
            let stale: Vec<PathBuf> = branch_runs
                .keys()
                .filter(|path| !affected_paths.contains(*path))
                .cloned()
                .collect();
            for path in stale {
                if let Some(run) = branch_runs.remove(&path) {
                    Self::emit_gram_if_long_enough(
                        &path,
                        branch,
                        &run,
                        self.config.window_size.get(),
                        record,
                    );
                }
            }
        }

        if is_merge && first_time {
            record.merges.push(MergeScenario {
                merge_commit: commit.id.clone(),
                parents: commit.parents.clone(),
                had_conflicts,
            });
        }
    }

    fn finalize_branch(&mut self, branch: &str, record: &mut ScenarioRecord) {
        if let Some(branch_runs) = self.state.runs.remove(branch) {
            let window = self.config.window_size.get();
            for (path, run) in branch_runs {
                Self::emit_gram_if_long_enough(&path, branch, &run, window, record);
            }
        }
    }

    fn emit_gram_if_long_enough(
        path: &std::path::Path,
        branch: &str,
        run: &GramRun,
        window: usize,
        record: &mut ScenarioRecord,
    ) {
        if run.length >= window {
            record.file_commit_grams.push(FileCommitGramScenario {
                file_path: path.to_path_buf(),
                branch_name: branch.to_owned(),
                first_commit: run.first.clone(),
                last_commit: run.last.clone(),
                length: run.length,
            });
        }
    }

    /// Compare every unordered pair of commits sharing a message, emitting a
    /// cherry-pick scenario for each pair whose normalized-patch fingerprint
    /// matches and is non-empty. Stops after [`DUPLICATE_MESSAGE_CAP`]
    /// additional scenarios.
    fn duplicate_message_pass(&self, view: &GitView, record: &mut ScenarioRecord) {
        let mut fingerprints: HashMap<CommitId, scenario_git::PatchFingerprint> = HashMap::new();
        let mut emitted = 0usize;

        for commits in self.state.messages.values() {
            if commits.len() < 2 {
                continue;
            }
            for i in 0..commits.len() {
                for j in (i + 1)..commits.len() {
                    if emitted >= DUPLICATE_MESSAGE_CAP {
                        return;
                    }
                    let a = &commits[i];
                    let b = &commits[j];

                    let fp_a = *fingerprints
                        .entry(a.id.clone())
                        .or_insert_with(|| Self::fingerprint_of(view, a));
                    let fp_b = *fingerprints
                        .entry(b.id.clone())
                        .or_insert_with(|| Self::fingerprint_of(view, b));

                    if fp_a != fp_b {
                        continue;
                    }

                    let (source, cherry_pick) = if a.timestamp < b.timestamp {
                        (a, b)
                    } else if b.timestamp < a.timestamp {
                        (b, a)
                    } else {
                        continue;
                    };

                    record.cherry_picks.push(CherryPickScenario {
                        cherry_pick_commit: cherry_pick.id.clone(),
                        source_commit: source.id.clone(),
                        parents: cherry_pick.parents.clone(),
                    });
                    emitted += 1;
                }
            }
        }
    }

    fn fingerprint_of(view: &GitView, commit: &Commit) -> scenario_git::PatchFingerprint {
        match view.patch(&commit.id) {
            Ok(diff) => scenario_git::fingerprint(&diff),
            Err(_) => scenario_git::PatchFingerprint::empty(),
        }
    }
}
