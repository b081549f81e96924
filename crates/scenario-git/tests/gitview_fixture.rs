use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use scenario_git::{ChangeKind, GitView};

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

fn commit(dir: &Path, message: &str) -> String {
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "-m", message]);
    let out = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(dir)
        .output()
        .expect("rev-parse");
    String::from_utf8(out.stdout).expect("utf8").trim().to_owned()
}

#[test]
fn resolves_tip_and_parents() {
    let dir = setup_repo();
    write(dir.path(), "a.txt", "one\n");
    let first = commit(dir.path(), "first");
    write(dir.path(), "a.txt", "two\n");
    let second = commit(dir.path(), "second");

    let view = GitView::open(dir.path());
    let head = view.resolve("main").expect("resolves main");
    assert_eq!(head.id.as_str(), second);
    assert_eq!(head.parents.len(), 1);
    assert_eq!(head.parents[0].as_str(), first);
}

#[test]
fn change_list_reports_added_and_modified() {
    let dir = setup_repo();
    write(dir.path(), "a.txt", "one\n");
    let first = commit(dir.path(), "first");
    write(dir.path(), "a.txt", "two\n");
    let second = commit(dir.path(), "second");

    let view = GitView::open(dir.path());
    let first_id = view.resolve(&first).expect("resolve first").id;
    let second_id = view.resolve(&second).expect("resolve second").id;

    let first_changes = view.change_list(&first_id).expect("change list");
    assert_eq!(first_changes.len(), 1);
    assert_eq!(first_changes[0].kind, ChangeKind::Added);

    let second_changes = view.change_list(&second_id).expect("change list");
    assert_eq!(second_changes.len(), 1);
    assert_eq!(second_changes[0].kind, ChangeKind::Modified);
}

#[test]
fn patch_of_root_commit_diffs_against_empty_tree() {
    let dir = setup_repo();
    write(dir.path(), "a.txt", "hello\n");
    let first = commit(dir.path(), "first");

    let view = GitView::open(dir.path());
    let id = view.resolve(&first).expect("resolve").id;
    let diff = view.patch(&id).expect("patch");
    let text = String::from_utf8(diff).expect("utf8 diff");
    assert!(text.contains("+hello"));
}

#[test]
fn branches_excludes_head_pseudoref() {
    let dir = setup_repo();
    write(dir.path(), "a.txt", "one\n");
    commit(dir.path(), "first");
    git(dir.path(), &["branch", "feature"]);

    let view = GitView::open(dir.path());
    let branches = view.branches().expect("branches");
    assert!(branches.iter().any(|b| b == "main"));
    assert!(branches.iter().any(|b| b == "feature"));
    assert!(!branches.iter().any(|b| b == "HEAD"));
}

#[test]
fn branches_includes_tag_only_refs() {
    let dir = setup_repo();
    write(dir.path(), "a.txt", "one\n");
    commit(dir.path(), "first");
    git(dir.path(), &["tag", "v1.0.0"]);
    git(dir.path(), &["checkout", "-q", "--detach", "HEAD"]);
    git(dir.path(), &["branch", "-D", "main"]);

    let view = GitView::open(dir.path());
    let branches = view.branches().expect("branches");
    assert!(branches.iter().any(|b| b == "v1.0.0"));
    assert!(!branches.iter().any(|b| b == "main"));
}
