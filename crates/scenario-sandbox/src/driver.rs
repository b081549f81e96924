//! Per-repository scenario replay: precondition setup, agent-branch
//! isolation, evaluation, and teardown.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{info, warn};

use scenario_core::{CherryPickScenario, FileCommitGramScenario, MergeScenario, ScenarioError};

use crate::runtime::{ExecOutcome, SandboxRuntime};

/// Name of the branch the agent is confined to while it works a scenario.
const AGENT_BRANCH: &str = "current-scenario-branch";

/// A context bundle handed to the agent before it starts working: a
/// mapping of command-name-without-punctuation to captured output. A
/// command that fails or cannot be run degrades to `"unavailable"` rather
/// than aborting setup.
pub type ContextBundle = HashMap<String, String>;

/// One of the four scenario shapes a driver can arm.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind")]
pub enum ScenarioInput {
    /// Replay a file-commit-gram run as a single-diff "split this commit"
    /// task.
    FileCommitGramChunk(FileCommitGramScenario),
    /// Replay a file-commit-gram run as a "squash this history" task.
    FileCommitGramRebase(FileCommitGramScenario),
    /// Replay a merge as a "reproduce this merge" task.
    Merge(MergeScenario),
    /// Replay a cherry-pick as a "reproduce this cherry-pick" task.
    CherryPick(CherryPickScenario),
}

/// Which predicate a `FileCommitGramRebase` evaluation uses.
///
/// The originating evaluator only ever checks the commit count for this
/// scenario type, never diff emptiness, which may be intentional (rebase is
/// permitted to change content) or a latent gap. Both predicates are
/// implemented; `CountOnly` is the default to preserve behavioral parity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebaseEvaluationMode {
    /// Only the agent's commit count is checked.
    #[default]
    CountOnly,
    /// The agent's commit count is checked and the resulting diff against
    /// `first_commit` must be empty.
    CountAndDiffEmpty,
}

/// Driver-wide configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScenarioDriverConfig {
    /// Evaluation mode for `FileCommitGramRebase` scenarios.
    pub rebase_mode: RebaseEvaluationMode,
}

/// Outcome of an evaluation, distinct from an environment failure: a
/// non-zero exit from an evaluation command is always an `Err`, never a
/// `Verdict::Failure`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The agent's branch satisfies the scenario's success predicate.
    Success,
    /// The agent's branch does not satisfy it.
    Failure,
}

/// Per-scenario-type success/total counts, accumulated across every
/// `evaluate()` call a [`ScenarioDriver`] completes without an environment
/// error. Spec.md §7 calls these "the user-visible artifact of a run" — the
/// aggregate a caller reports once mining/replay finishes, distinct from any
/// single verdict.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct Tally {
    /// Evaluations that returned [`Verdict::Success`].
    pub successes: u64,
    /// Evaluations that completed (successfully or not) without an
    /// environment error.
    pub totals: u64,
}

impl Tally {
    fn record(&mut self, verdict: Verdict) {
        self.totals += 1;
        if verdict == Verdict::Success {
            self.successes += 1;
        }
    }
}

/// Aggregate evaluation counters, one [`Tally`] per scenario type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ScenarioStats {
    /// `FileCommitGramChunk` tally.
    pub file_commit_gram_chunk: Tally,
    /// `FileCommitGramRebase` tally.
    pub file_commit_gram_rebase: Tally,
    /// `Merge` tally.
    pub merge: Tally,
    /// `CherryPick` tally.
    pub cherry_pick: Tally,
}

impl ScenarioStats {
    fn record(&mut self, input: &ScenarioInput, verdict: Verdict) {
        let tally = match input {
            ScenarioInput::FileCommitGramChunk(_) => &mut self.file_commit_gram_chunk,
            ScenarioInput::FileCommitGramRebase(_) => &mut self.file_commit_gram_rebase,
            ScenarioInput::Merge(_) => &mut self.merge,
            ScenarioInput::CherryPick(_) => &mut self.cherry_pick,
        };
        tally.record(verdict);
    }
}

#[derive(Clone, Debug)]
struct ArmedScenario {
    input: ScenarioInput,
    agent_branch: String,
}

enum DriverState {
    Empty,
    Ready { default_branch: String },
    Armed { scenario: ArmedScenario },
    Done { scenario: ArmedScenario },
}

/// Drives one repository's working tree through the
/// setup→arm→evaluate→teardown cycle inside a [`SandboxRuntime`].
///
/// Transitions are modeled as a state machine so illegal call orders
/// (evaluating before arming, tearing down an empty repository) are caught
/// here rather than surfacing as a confusing container-side git error.
pub struct ScenarioDriver<'a> {
    runtime: &'a SandboxRuntime,
    clone_dir: String,
    repo_name: Option<String>,
    config: ScenarioDriverConfig,
    state: DriverState,
    stats: ScenarioStats,
}

impl<'a> ScenarioDriver<'a> {
    /// Create a driver over `runtime`, with repository clones placed under
    /// `clone_dir` inside the container.
    #[must_use]
    pub fn new(runtime: &'a SandboxRuntime, clone_dir: impl Into<String>, config: ScenarioDriverConfig) -> Self {
        Self {
            runtime,
            clone_dir: clone_dir.into(),
            repo_name: None,
            config,
            state: DriverState::Empty,
            stats: ScenarioStats::default(),
        }
    }

    /// `true` if no repository is currently cloned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.state, DriverState::Empty)
    }

    /// The per-scenario-type success/total tallies accumulated so far across
    /// every `evaluate()` this driver has completed.
    #[must_use]
    pub const fn stats(&self) -> &ScenarioStats {
        &self.stats
    }

    fn run(&self, command: impl AsRef<str>) -> Result<(i32, String), ScenarioError> {
        match self.runtime.exec(command.as_ref(), &self.clone_dir)? {
            ExecOutcome::Completed { exit_code, output, .. } => {
                Ok((exit_code, String::from_utf8_lossy(&output).into_owned()))
            }
            ExecOutcome::Denied { reason } => Err(ScenarioError::Environment(format!(
                "driver-issued command `{}` was rejected by the deny list: {reason}",
                command.as_ref()
            ))),
        }
    }

    fn run_ok(&self, command: impl AsRef<str> + std::fmt::Display) -> Result<String, ScenarioError> {
        let (exit_code, output) = self.run(&command)?;
        if exit_code != 0 {
            return Err(ScenarioError::Environment(format!(
                "`{command}` exited {exit_code}: {output}"
            )));
        }
        Ok(output)
    }

    /// Clone `https://github.com/<repo_name>.git` and discover its default
    /// branch by parsing the first line of `git status`.
    ///
    /// # Errors
    /// Returns [`ScenarioError::Environment`] on clone or status failure.
    /// Returns [`ScenarioError::Precondition`] if called outside `Empty`.
    pub fn setup_repository(&mut self, repo_name: &str) -> Result<(), ScenarioError> {
        if !matches!(self.state, DriverState::Empty) {
            return Err(ScenarioError::Precondition(
                "setup_repository called while a repository is already checked out".to_owned(),
            ));
        }

        let url = format!("https://github.com/{repo_name}.git");
        self.run_ok(format!("git clone {url} {}", self.clone_dir))?;

        let status = self.run_ok("git status")?;
        let first_line = status.lines().next().unwrap_or_default();
        let default_branch = first_line
            .strip_prefix("On branch ")
            .ok_or_else(|| {
                ScenarioError::Data(format!(
                    "unexpected `git status` output, expected `On branch <name>`: {first_line}"
                ))
            })?
            .trim()
            .to_owned();

        info!(%repo_name, %default_branch, "repository ready");
        self.repo_name = Some(repo_name.to_owned());
        self.state = DriverState::Ready { default_branch };
        Ok(())
    }

    /// Arm one scenario: run its type-specific precondition, create and
    /// check out the agent isolation branch, then gather a read-only
    /// context bundle.
    ///
    /// # Errors
    /// Returns [`ScenarioError::Precondition`] if called outside `Ready`,
    /// or if a precondition step fails (checkout refused, unknown commit).
    pub fn setup_scenario(&mut self, input: ScenarioInput) -> Result<ContextBundle, ScenarioError> {
        let DriverState::Ready { .. } = &self.state else {
            return Err(ScenarioError::Precondition(
                "setup_scenario called outside Ready state".to_owned(),
            ));
        };

        match &input {
            ScenarioInput::FileCommitGramChunk(scenario) => {
                self.checkout_detached(scenario.first_commit.as_str())?;
                self.run_ok(format!(
                    "git checkout {} -- {}",
                    scenario.last_commit,
                    scenario.file_path.display()
                ))?;
            }
            ScenarioInput::FileCommitGramRebase(scenario) => {
                self.checkout_detached(scenario.first_commit.as_str())?;
            }
            ScenarioInput::Merge(scenario) => {
                let parent = scenario
                    .parents
                    .first()
                    .ok_or_else(|| ScenarioError::Precondition("merge scenario has no parents".to_owned()))?;
                self.checkout_detached(parent.as_str())?;
            }
            ScenarioInput::CherryPick(scenario) => {
                let parent = scenario
                    .parents
                    .first()
                    .ok_or_else(|| ScenarioError::Precondition("cherry-pick scenario has no parents".to_owned()))?;
                self.checkout_detached(parent.as_str())?;
            }
        }

        self.run_ok(format!("git checkout -b {AGENT_BRANCH}"))?;

        let mut bundle = ContextBundle::new();
        bundle.insert("gitstatus".to_owned(), self.captured_or_unavailable("git status"));
        if matches!(input, ScenarioInput::FileCommitGramChunk(_)) {
            bundle.insert(
                "gitdiffcached".to_owned(),
                self.captured_or_unavailable("git diff --cached"),
            );
        }

        self.state = DriverState::Armed {
            scenario: ArmedScenario {
                input,
                agent_branch: AGENT_BRANCH.to_owned(),
            },
        };
        Ok(bundle)
    }

    /// The tool surface exposed to the external agent: `execute_bash_command(command,
    /// reason) -> string`. `reason` is documentation only — it exists so an agent's
    /// transcript records *why* a command was run, and is never inspected here.
    ///
    /// Forwards to [`SandboxRuntime::exec`] under the driver's current working
    /// directory, so the deny list, timeout wrapper, and output cap all apply exactly
    /// as they do to driver-issued commands. A denied command returns its rejection
    /// reason as the result string rather than an `Err` — the agent sees its own
    /// infraction, per spec, it is never raised as an error.
    ///
    /// # Errors
    /// Returns [`ScenarioError::Precondition`] if no repository is checked out yet
    /// (`Empty`), and [`ScenarioError::Environment`] if `docker exec` itself cannot be
    /// spawned.
    pub fn execute_bash_command(&self, command: &str, _reason: &str) -> Result<String, ScenarioError> {
        if matches!(self.state, DriverState::Empty) {
            return Err(ScenarioError::Precondition(
                "execute_bash_command called before a repository is checked out".to_owned(),
            ));
        }
        match self.runtime.exec(command, &self.clone_dir)? {
            ExecOutcome::Completed { output, .. } => Ok(String::from_utf8_lossy(&output).into_owned()),
            ExecOutcome::Denied { reason } => Ok(reason),
        }
    }

    fn checkout_detached(&self, commit: &str) -> Result<(), ScenarioError> {
        self.run_ok(format!("git checkout {commit}"))?;
        Ok(())
    }

    fn captured_or_unavailable(&self, command: &str) -> String {
        match self.run(command) {
            Ok((0, output)) => output,
            Ok(_) | Err(_) => "unavailable".to_owned(),
        }
    }

    /// Mark the armed scenario as done, i.e. the agent has finished
    /// working its branch. Evaluation may run in either `Armed` or `Done`.
    ///
    /// # Errors
    /// Returns [`ScenarioError::Precondition`] if called outside `Armed`.
    pub fn mark_done(&mut self) -> Result<(), ScenarioError> {
        let DriverState::Armed { scenario } = std::mem::replace(&mut self.state, DriverState::Empty) else {
            return Err(ScenarioError::Precondition(
                "mark_done called outside Armed state".to_owned(),
            ));
        };
        self.state = DriverState::Done { scenario };
        Ok(())
    }

    /// Evaluate the armed/done scenario's success predicate.
    ///
    /// # Errors
    /// Returns [`ScenarioError::Environment`] if an evaluation command
    /// exits non-zero or produces unparseable output — distinct from a
    /// `Verdict::Failure`, which means the commands ran cleanly but the
    /// agent's branch did not satisfy the predicate.
    pub fn evaluate(&mut self) -> Result<Verdict, ScenarioError> {
        let scenario = match &self.state {
            DriverState::Armed { scenario } | DriverState::Done { scenario } => scenario,
            DriverState::Empty | DriverState::Ready { .. } => {
                return Err(ScenarioError::Precondition(
                    "evaluate called before setup_scenario".to_owned(),
                ));
            }
        };

        let verdict = match &scenario.input {
            ScenarioInput::FileCommitGramChunk(s) => {
                let diff_empty = self.diff_is_empty(s.first_commit.as_str(), &scenario.agent_branch, Some(&s.file_path))?;
                let count = self.rev_list_count(s.last_commit.as_str(), &scenario.agent_branch)?;
                Ok(Self::verdict(chunk_success(diff_empty, count)))
            }
            ScenarioInput::FileCommitGramRebase(s) => {
                let count = self.rev_list_count(s.first_commit.as_str(), &scenario.agent_branch)?;
                let diff_empty = match self.config.rebase_mode {
                    RebaseEvaluationMode::CountOnly => None,
                    RebaseEvaluationMode::CountAndDiffEmpty => Some(self.diff_is_empty(
                        s.first_commit.as_str(),
                        &scenario.agent_branch,
                        None,
                    )?),
                };
                Ok(Self::verdict(rebase_success(count, u64::try_from(s.length).unwrap_or(u64::MAX), diff_empty)))
            }
            ScenarioInput::Merge(s) => {
                let diff_empty = self.diff_is_empty(s.merge_commit.as_str(), &scenario.agent_branch, None)?;
                Ok(Self::verdict(diff_empty))
            }
            ScenarioInput::CherryPick(s) => {
                let diff_empty = self.diff_is_empty(s.cherry_pick_commit.as_str(), &scenario.agent_branch, None)?;
                Ok(Self::verdict(diff_empty))
            }
        };

        if let Ok(v) = &verdict {
            self.stats.record(&scenario.input, *v);
        }
        verdict
    }

    const fn verdict(success: bool) -> Verdict {
        if success {
            Verdict::Success
        } else {
            Verdict::Failure
        }
    }

    fn diff_is_empty(&self, base: &str, head: &str, path: Option<&std::path::Path>) -> Result<bool, ScenarioError> {
        let command = match path {
            Some(path) => format!("git diff {base} {head} -- {}", path.display()),
            None => format!("git diff {base} {head}"),
        };
        let output = self.run_ok(command)?;
        Ok(output.trim().is_empty())
    }

    /// Run `git rev-list --count` and parse its output.
    ///
    /// A non-zero exit is an [`ScenarioError::Environment`] (the evaluation
    /// command itself failed to run). Output that exits zero but is not a
    /// base-10 integer is not an error — the `git rev-list --count` contract
    /// guarantees an integer on success, so this can only mean the agent's
    /// branch is in a state the predicate was never meant to score; it
    /// degrades to `None`, which the predicate functions treat as
    /// not-satisfied rather than propagating a fatal error.
    fn rev_list_count(&self, base: &str, head: &str) -> Result<Option<u64>, ScenarioError> {
        let output = self.run_ok(format!("git rev-list --count {base}..{head}"))?;
        Ok(output.trim().parse().ok())
    }

    /// Tear down the armed scenario: reset, return to the default branch,
    /// delete the agent branch, prune. No-op (and idempotent) if no
    /// scenario is armed.
    ///
    /// # Errors
    /// Returns `Ok(())` even after escalating to a full repository
    /// teardown; propagates the underlying error only if that escalation
    /// also fails.
    pub fn teardown_scenario(&mut self) -> Result<(), ScenarioError> {
        let default_branch = match &self.state {
            DriverState::Empty | DriverState::Ready { .. } => return Ok(()),
            DriverState::Armed { .. } | DriverState::Done { .. } => self.default_branch_name(),
        };

        match self.try_teardown_scenario(&default_branch) {
            Ok(()) => {
                self.state = DriverState::Ready { default_branch };
                Ok(())
            }
            Err(err) => {
                warn!(%err, "scenario teardown failed, escalating to full repository teardown");
                self.teardown_repository()
            }
        }
    }

    fn default_branch_name(&self) -> String {
        // Recovered lazily: the default branch is not carried by
        // `Armed`/`Done`, so the driver re-derives it once at teardown time
        // via the same `git status` contract used during setup. This keeps
        // `ArmedScenario` free of bookkeeping it never needs while armed.
        self.run("git status")
            .ok()
            .and_then(|(code, out)| (code == 0).then_some(out))
            .and_then(|out| {
                out.lines()
                    .next()
                    .and_then(|line| line.strip_prefix("On branch "))
                    .map(str::trim)
                    .map(ToOwned::to_owned)
            })
            .unwrap_or_else(|| "main".to_owned())
    }

    fn try_teardown_scenario(&self, default_branch: &str) -> Result<(), ScenarioError> {
        self.run_ok("git reset --hard HEAD")?;
        self.run_ok(format!("git checkout {default_branch}"))?;
        self.run_ok(format!("git branch -D {AGENT_BRANCH}"))?;
        self.run_ok("git prune")?;

        let remaining = self.run_ok(format!("git branch --list {AGENT_BRANCH}"))?;
        if !remaining.trim().is_empty() {
            return Err(ScenarioError::Environment(format!(
                "agent branch `{AGENT_BRANCH}` survived teardown"
            )));
        }
        Ok(())
    }

    /// Remove the working directory entirely. No-op (and idempotent) if
    /// already `Empty`.
    ///
    /// # Errors
    /// Returns [`ScenarioError::Environment`] if removal fails; the caller
    /// should skip the repository for the remainder of the run in that
    /// case.
    pub fn teardown_repository(&mut self) -> Result<(), ScenarioError> {
        if matches!(self.state, DriverState::Empty) {
            return Ok(());
        }
        // `-r`, not `-rf`: the deny list rejects any command containing the
        // literal substring `-rf`, and this command is itself issued
        // through `exec` like everything else the driver runs.
        match self.runtime.exec(&format!("rm -r {}", self.clone_dir), "/") {
            Ok(ExecOutcome::Completed { exit_code, .. }) if exit_code == 0 => {
                self.state = DriverState::Empty;
                self.repo_name = None;
                Ok(())
            }
            Ok(ExecOutcome::Completed { exit_code, output, .. }) => Err(ScenarioError::Environment(format!(
                "repository teardown exited {exit_code}: {}",
                String::from_utf8_lossy(&output)
            ))),
            Ok(ExecOutcome::Denied { reason }) => Err(ScenarioError::Environment(format!(
                "repository teardown was rejected by the deny list: {reason}"
            ))),
            Err(err) => Err(err),
        }
    }
}

/// `FileCommitGramChunk` success predicate: the agent's branch must not
/// diverge from `first_commit` on the scenario file, and must have split
/// the chunk into more than one commit. `count` is `None` when
/// `git rev-list --count` produced output that was not a base-10 integer —
/// that can only happen on an agent-mutated branch the predicate was never
/// meant to score, so it is treated as not-satisfied rather than an error.
fn chunk_success(diff_empty: bool, count: Option<u64>) -> bool {
    diff_empty && count.is_some_and(|count| count > 1)
}

/// `FileCommitGramRebase` success predicate: the agent's commit count must
/// land in `(0, length]`, reducing but preserving the run. `diff_empty` is
/// `None` under [`RebaseEvaluationMode::CountOnly`] (diff divergence is
/// permitted) and `Some(_)` under `CountAndDiffEmpty`.
fn rebase_success(count: Option<u64>, length: u64, diff_empty: Option<bool>) -> bool {
    let count_ok = count.is_some_and(|count| count > 0 && count <= length);
    let diff_ok = diff_empty.unwrap_or(true);
    count_ok && diff_ok
}

#[cfg(test)]
mod predicate_tests {
    use super::{chunk_success, rebase_success};

    #[test]
    fn chunk_succeeds_on_empty_diff_and_split_commits() {
        assert!(chunk_success(true, Some(2)));
        assert!(!chunk_success(true, Some(1)));
        assert!(!chunk_success(false, Some(2)));
    }

    #[test]
    fn chunk_non_integer_count_is_not_satisfied() {
        assert!(!chunk_success(true, None));
    }

    #[test]
    fn rebase_count_only_ignores_diff() {
        // times_seen_consecutively = 7, per spec.md §8 fixture 6.
        assert!(rebase_success(Some(4), 7, None));
        assert!(rebase_success(Some(7), 7, None));
        assert!(!rebase_success(Some(0), 7, None));
        assert!(!rebase_success(Some(8), 7, None));
        assert!(!rebase_success(None, 7, None));
    }

    #[test]
    fn rebase_count_and_diff_empty_requires_both() {
        assert!(rebase_success(Some(4), 7, Some(true)));
        assert!(!rebase_success(Some(4), 7, Some(false)));
        assert!(!rebase_success(Some(0), 7, Some(true)));
    }
}

#[cfg(test)]
mod stats_tests {
    use super::{MergeScenario, ScenarioInput, ScenarioStats, Verdict};
    use scenario_git::CommitId;

    fn merge_input() -> ScenarioInput {
        ScenarioInput::Merge(MergeScenario {
            merge_commit: CommitId::new("c".repeat(40)).expect("valid"),
            parents: vec![
                CommitId::new("a".repeat(40)).expect("valid"),
                CommitId::new("b".repeat(40)).expect("valid"),
            ],
            had_conflicts: false,
        })
    }

    #[test]
    fn tally_counts_successes_within_totals_per_scenario_type() {
        let mut stats = ScenarioStats::default();
        stats.record(&merge_input(), Verdict::Success);
        stats.record(&merge_input(), Verdict::Failure);

        assert_eq!(stats.merge.totals, 2);
        assert_eq!(stats.merge.successes, 1);
        assert_eq!(stats.file_commit_gram_chunk.totals, 0);
    }
}

#[cfg(test)]
mod state_machine_tests {
    use super::{ScenarioDriver, ScenarioDriverConfig, ScenarioError, ScenarioInput};
    use crate::runtime::{RuntimeConfig, SandboxRuntime};
    use scenario_core::FileCommitGramScenario;
    use scenario_git::CommitId;

    fn gram_scenario() -> FileCommitGramScenario {
        FileCommitGramScenario {
            file_path: "a.py".into(),
            branch_name: "main".to_owned(),
            first_commit: CommitId::new("a".repeat(40)).expect("valid"),
            last_commit: CommitId::new("b".repeat(40)).expect("valid"),
            length: 3,
        }
    }

    fn idle_driver(runtime: &SandboxRuntime) -> ScenarioDriver<'_> {
        ScenarioDriver::new(runtime, "/work/repo", ScenarioDriverConfig::default())
    }

    #[test]
    fn new_driver_is_empty() {
        let runtime = SandboxRuntime::new("scratch:latest", RuntimeConfig::default());
        assert!(idle_driver(&runtime).is_empty());
    }

    #[test]
    fn setup_scenario_before_setup_repository_is_a_precondition_error() {
        let runtime = SandboxRuntime::new("scratch:latest", RuntimeConfig::default());
        let mut driver = idle_driver(&runtime);
        let err = driver
            .setup_scenario(ScenarioInput::FileCommitGramChunk(gram_scenario()))
            .expect_err("no repository checked out yet");
        assert!(matches!(err, ScenarioError::Precondition(_)));
    }

    #[test]
    fn evaluate_before_setup_scenario_is_a_precondition_error() {
        let runtime = SandboxRuntime::new("scratch:latest", RuntimeConfig::default());
        let mut driver = idle_driver(&runtime);
        let err = driver.evaluate().expect_err("nothing armed yet");
        assert!(matches!(err, ScenarioError::Precondition(_)));
    }

    #[test]
    fn mark_done_outside_armed_is_a_precondition_error() {
        let runtime = SandboxRuntime::new("scratch:latest", RuntimeConfig::default());
        let mut driver = idle_driver(&runtime);
        let err = driver.mark_done().expect_err("nothing armed yet");
        assert!(matches!(err, ScenarioError::Precondition(_)));
    }

    #[test]
    fn teardown_scenario_on_idle_driver_is_a_no_op() {
        let runtime = SandboxRuntime::new("scratch:latest", RuntimeConfig::default());
        let mut driver = idle_driver(&runtime);
        driver.teardown_scenario().expect("idempotent on Empty");
        assert!(driver.is_empty());
    }

    #[test]
    fn teardown_repository_on_idle_driver_is_a_no_op() {
        let runtime = SandboxRuntime::new("scratch:latest", RuntimeConfig::default());
        let mut driver = idle_driver(&runtime);
        driver.teardown_repository().expect("idempotent on Empty");
        assert!(driver.is_empty());
    }

    #[test]
    fn execute_bash_command_before_repository_setup_is_a_precondition_error() {
        let runtime = SandboxRuntime::new("scratch:latest", RuntimeConfig::default());
        let driver = idle_driver(&runtime);
        let err = driver
            .execute_bash_command("echo hi", "smoke test")
            .expect_err("no repository checked out yet");
        assert!(matches!(err, ScenarioError::Precondition(_)));
    }
}
