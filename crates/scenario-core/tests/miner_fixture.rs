use std::num::NonZeroUsize;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use scenario_core::{LanguageFilter, MinerConfig, ScenarioMiner};
use scenario_git::GitView;

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .expect("git must be installed");
    assert!(status.success(), "git {args:?} failed");
}

fn setup_repo() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    git(dir.path(), &["init", "-q", "-b", "main"]);
    git(dir.path(), &["config", "user.email", "test@example.com"]);
    git(dir.path(), &["config", "user.name", "Test"]);
    dir
}

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).expect("write file");
}

fn commit(dir: &Path, message: &str) {
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "-m", message]);
}

#[test]
fn file_commit_gram_emitted_once_run_reaches_window() {
    let dir = setup_repo();
    for i in 0..4 {
        write(dir.path(), "module.py", &format!("version {i}\n"));
        commit(dir.path(), &format!("edit {i}"));
    }
    // unrelated file breaks nothing since window is reached before it.
    write(dir.path(), "other.py", "noise\n");
    commit(dir.path(), "unrelated");

    let view = GitView::open(dir.path());
    let mut miner = ScenarioMiner::new(MinerConfig {
        window_size: NonZeroUsize::new(3).expect("nonzero"),
        language_filter: LanguageFilter::Python,
    });
    let record = miner.mine(&view);

    assert!(record
        .file_commit_grams
        .iter()
        .any(|g| g.file_path == Path::new("module.py") && g.length >= 3));
    assert!(record.error_trace.is_none());
}

#[test]
fn language_filter_excludes_non_matching_files() {
    let dir = setup_repo();
    for i in 0..3 {
        write(dir.path(), "notes.txt", &format!("line {i}\n"));
        commit(dir.path(), &format!("note {i}"));
    }

    let view = GitView::open(dir.path());
    let mut miner = ScenarioMiner::new(MinerConfig {
        window_size: NonZeroUsize::new(3).expect("nonzero"),
        language_filter: LanguageFilter::Python,
    });
    let record = miner.mine(&view);

    assert!(record.file_commit_grams.is_empty());
}

#[test]
fn merge_commit_without_conflicts_is_recorded() {
    let dir = setup_repo();
    write(dir.path(), "a.py", "base\n");
    commit(dir.path(), "base");
    git(dir.path(), &["checkout", "-q", "-b", "feature"]);
    write(dir.path(), "b.py", "feature work\n");
    commit(dir.path(), "feature work");
    git(dir.path(), &["checkout", "-q", "main"]);
    write(dir.path(), "c.py", "main work\n");
    commit(dir.path(), "main work");
    git(
        dir.path(),
        &["merge", "-q", "--no-ff", "-m", "merge feature", "feature"],
    );

    let view = GitView::open(dir.path());
    let mut miner = ScenarioMiner::new(MinerConfig {
        window_size: NonZeroUsize::new(2).expect("nonzero"),
        language_filter: LanguageFilter::Python,
    });
    let record = miner.mine(&view);

    assert_eq!(record.merges.len(), 1);
    assert!(!record.merges[0].had_conflicts);
}

#[test]
fn cherry_pick_trailer_is_detected() {
    let dir = setup_repo();
    write(dir.path(), "a.py", "one\n");
    commit(dir.path(), "first");
    git(dir.path(), &["checkout", "-q", "-b", "topic"]);
    write(dir.path(), "b.py", "topic change\n");
    commit(dir.path(), "topic change");
    let topic_commit = {
        let out = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(dir.path())
            .output()
            .expect("rev-parse");
        String::from_utf8(out.stdout).expect("utf8").trim().to_owned()
    };
    git(dir.path(), &["checkout", "-q", "main"]);
    git(dir.path(), &["cherry-pick", "-q", "-x", &topic_commit]);

    let view = GitView::open(dir.path());
    let mut miner = ScenarioMiner::new(MinerConfig {
        window_size: NonZeroUsize::new(2).expect("nonzero"),
        language_filter: LanguageFilter::Python,
    });
    let record = miner.mine(&view);

    assert_eq!(record.cherry_picks.len(), 1);
    assert_eq!(record.cherry_picks[0].source_commit.as_str(), topic_commit);
}
