use crate::git;
use crate::reconcile::{drifted_files, split_case};
use crate::snapshots::stderr_name;
use crate::stages::slug;
use crate::{CommandBuilder, FailTests};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[test]
fn stderr_names() {
    assert_eq!(stderr_name("foo.rs"), "foo.stderr");
    assert_eq!(stderr_name("no_extension"), "no_extension.stderr");
}

#[test]
fn slugs_are_filename_safe() {
    let name = "msrv build (1.56.1)";
    assert!(slug(name)
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-'));
    assert_eq!(slug("test . +stable"), "test----stable");
}

#[test]
fn command_builder_renders_and_builds() {
    let cmd = CommandBuilder::cargo("stable")
        .args(["test", "--quiet"])
        .env("TRYBUILD", "overwrite")
        .current_dir("/tmp");
    assert_eq!(cmd.display(), "cargo +stable test --quiet");
    let built = cmd.build();
    assert_eq!(built.get_program(), "cargo");
    assert_eq!(built.get_current_dir(), Some(Path::new("/tmp")));
}

#[test]
fn drift_detection() {
    let dir = Path::new("/crate/tests/fail/case");
    let files = vec!["a.rs".to_string(), "b.rs".to_string()];
    let mut before = BTreeMap::new();
    before.insert(dir.join("a.stderr"), b"old".to_vec());
    before.insert(dir.join("b.stderr"), b"same".to_vec());
    let mut after = before.clone();
    after.insert(dir.join("a.stderr"), b"new".to_vec());

    assert_eq!(drifted_files(dir, &files, &before, &after), ["a.rs"]);
    assert!(drifted_files(dir, &files, &before, &before).is_empty());
}

#[test]
fn splitting_a_shared_case() {
    let tmp = tempfile::tempdir().unwrap();
    let case = tmp.path().join("case");
    fs::create_dir(&case).unwrap();
    fs::write(case.join("foo.rs"), "fn main() {}").unwrap();
    fs::write(case.join("foo.stderr"), "nightly error").unwrap();
    // The recorded pre-nightly state carries the stable output.
    let mut before = BTreeMap::new();
    before.insert(case.join("foo.stderr"), b"stable error".to_vec());

    split_case(&case, &["foo.rs".to_string()], &before).unwrap();

    assert!(!case.join("foo.rs").exists());
    assert!(!case.join("foo.stderr").exists());
    assert_eq!(
        fs::read(case.join("stable/foo.stderr")).unwrap(),
        b"stable error"
    );
    assert_eq!(
        fs::read(case.join("nightly/foo.stderr")).unwrap(),
        b"nightly error"
    );
    assert_eq!(
        fs::read_to_string(case.join("stable/foo.rs")).unwrap(),
        fs::read_to_string(case.join("nightly/foo.rs")).unwrap()
    );
}

#[test]
fn splitting_only_drifted_files_keeps_the_layout_valid() {
    let tmp = tempfile::tempdir().unwrap();
    let case = tmp.path().join("tests/fail/case");
    fs::create_dir_all(&case).unwrap();
    for name in ["a.rs", "b.rs"] {
        fs::write(case.join(name), "fn main() {}").unwrap();
    }
    // The nightly run rewrote `a.stderr` only.
    fs::write(case.join("a.stderr"), "error[E0599]: nightly wording").unwrap();
    fs::write(case.join("b.stderr"), "error: same everywhere").unwrap();
    let mut before = BTreeMap::new();
    before.insert(case.join("a.stderr"), b"error[E0308]: stable wording".to_vec());
    before.insert(case.join("b.stderr"), b"error: same everywhere".to_vec());

    let tests = FailTests::discover(tmp.path()).unwrap();
    let after = tests.snapshot_contents().unwrap();
    let drifted = drifted_files(&case, &tests.cases[0].shared, &before, &after);
    assert_eq!(drifted, ["a.rs"]);

    split_case(&case, &drifted, &before).unwrap();

    // The result passes its own invariant checks: `a.rs` is split, `b.rs`
    // stays shared instead of gaining two identical snapshots.
    let tests = FailTests::discover(tmp.path()).unwrap();
    assert!(tests.verify().is_empty());
    assert_eq!(tests.cases[0].shared, ["b.rs"]);
    assert_eq!(tests.cases[0].split, ["a.rs"]);
    assert!(!case.join("a.rs").exists());
    assert_eq!(
        fs::read(case.join("stable/a.stderr")).unwrap(),
        b"error[E0308]: stable wording"
    );
    assert_eq!(fs::read(case.join("b.stderr")).unwrap(), b"error: same everywhere");
}

fn git_ok(dir: &Path, args: &[&str]) {
    let status = std::process::Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed");
}

#[test]
fn git_detects_and_restores_snapshot_drift() {
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path();
    git_ok(repo, &["init", "-q"]);
    git_ok(repo, &["config", "user.email", "gauntlet@example.com"]);
    git_ok(repo, &["config", "user.name", "gauntlet"]);
    // The case name contains a space, which makes git quote the path in
    // porcelain output.
    let fail = repo.join("tests/fail/my case");
    fs::create_dir_all(&fail).unwrap();
    fs::write(fail.join("foo.rs"), "fn main() {}").unwrap();
    fs::write(fail.join("foo.stderr"), "error: original").unwrap();
    git_ok(repo, &["add", "-A"]);
    git_ok(repo, &["commit", "-q", "-m", "init"]);

    let root = git::repo_root(&fail).unwrap();
    assert_eq!(
        root.canonicalize().unwrap(),
        repo.canonicalize().unwrap()
    );

    fs::write(fail.join("foo.stderr"), "error: drifted").unwrap();
    fs::write(fail.join("bar.stderr"), "error: untracked").unwrap();
    fs::write(fail.join("unrelated.txt"), "ignored").unwrap();

    let changed = git::changed_files(&root, &root.join("tests/fail"), "stderr").unwrap();
    assert_eq!(changed.len(), 2);
    let untracked: Vec<_> = changed.iter().filter(|c| c.untracked).collect();
    assert_eq!(untracked.len(), 1);
    assert!(untracked[0].path.ends_with("bar.stderr"));

    let head = git::head_contents(&root, &root.join("tests/fail/my case/foo.stderr")).unwrap();
    assert_eq!(head.unwrap(), b"error: original");
    let missing = git::head_contents(&root, &root.join("tests/fail/my case/bar.stderr")).unwrap();
    assert!(missing.is_none());

    git::restore(&root, &changed).unwrap();
    assert_eq!(fs::read(fail.join("foo.stderr")).unwrap(), b"error: original");
    assert!(!fail.join("bar.stderr").exists());
    assert_eq!(fs::read(fail.join("unrelated.txt")).unwrap(), b"ignored");
}
