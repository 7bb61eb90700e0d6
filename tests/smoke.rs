use cargo_gauntlet::{
    normalize, parse_rust_version, scratch_dir, Args, Config, Error, FailTests, Pin,
    SnapshotHandling,
};
use std::fs;

#[test]
fn unknown_argument_is_a_usage_error() {
    assert!(Args::parse_args(["frobnicate".to_string()].into_iter()).is_err());
    assert!(Args::parse_args(["overwrite".to_string(), "extra".to_string()].into_iter()).is_err());
    assert!(
        Args::parse_args(["overwrite".to_string(), "overwrite".to_string()].into_iter()).is_err()
    );
    assert!(Args::parse_args(["--help".to_string()].into_iter()).is_err());
}

#[test]
fn overwrite_argument_is_accepted() {
    let args = Args::parse_args(std::iter::empty::<String>()).unwrap();
    assert!(!args.overwrite);
    let args = Args::parse_args(["overwrite".to_string()].into_iter()).unwrap();
    assert!(args.overwrite);
}

#[test]
fn overwrite_switches_snapshot_handling() {
    let mut config = Config::new(".");
    config.with_args(&Args { overwrite: true });
    assert!(matches!(config.snapshots, SnapshotHandling::Overwrite));
    config.with_args(&Args { overwrite: false });
    assert!(matches!(config.snapshots, SnapshotHandling::Check(_)));
}

#[test]
fn dependency_pins() {
    let pin = Pin::parse("serde@1.0.100").unwrap();
    assert_eq!(pin.name, "serde");
    assert_eq!(pin.version, "1.0.100");
    assert_eq!(pin.to_string(), "serde@1.0.100");
    assert!(Pin::parse("serde").is_err());
    assert!(Pin::parse("@1.0").is_err());
    assert!(Pin::parse("serde@").is_err());
}

#[test]
fn manifest_rust_version() {
    let manifest = r#"
[package]
name = "demo"
rust-version = "1.56.1"
"#;
    assert_eq!(parse_rust_version(manifest).as_deref(), Some("1.56.1"));
    assert_eq!(parse_rust_version("[package]\nname = \"demo\"\n"), None);
    assert_eq!(parse_rust_version("rust-version.workspace = true\n"), None);
}

#[test]
fn normalization_hides_toolchain_text() {
    let stable = b"note: compiled with rustc 1.75.0 on stable";
    let nightly = b"note: compiled with rustc 1.77.0-nightly (abc1234de 2024-01-15) on nightly";
    assert_eq!(normalize(stable), normalize(nightly));
    assert_ne!(
        normalize(b"error[E0308]: mismatched types"),
        normalize(b"error[E0599]: no method named `frob`")
    );
}

#[cfg(unix)]
#[test]
fn scratch_mirrors_through_symlinks() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("crate");
    fs::create_dir_all(src.join("src")).unwrap();
    fs::create_dir_all(src.join("target/debug")).unwrap();
    fs::write(src.join("Cargo.toml"), "[package]\nname = \"demo\"\n").unwrap();
    fs::write(src.join("Cargo.lock"), "# lock\n").unwrap();
    fs::write(src.join("src/lib.rs"), "").unwrap();

    let out = tmp.path().join("out");
    let scratch = scratch_dir(&src, &out, "msrv").unwrap();
    assert_eq!(scratch, out.join("scratch/msrv"));

    // Symlinks point back at the source entries.
    let canonical_src = src.canonicalize().unwrap();
    assert_eq!(
        fs::read_link(scratch.join("Cargo.toml")).unwrap(),
        canonical_src.join("Cargo.toml")
    );
    assert_eq!(
        fs::read_link(scratch.join("src")).unwrap(),
        canonical_src.join("src")
    );
    // The lockfile is a private copy cargo may rewrite.
    let lock = fs::symlink_metadata(scratch.join("Cargo.lock")).unwrap();
    assert!(lock.file_type().is_file());
    // Build output is not mirrored.
    assert!(!scratch.join("target").exists());

    // A second call starts from a clean slate.
    fs::write(scratch.join("stray.txt"), "x").unwrap();
    let scratch = scratch_dir(&src, &out, "msrv").unwrap();
    assert!(!scratch.join("stray.txt").exists());
}

#[test]
fn layout_invariants_are_detected() {
    let tmp = tempfile::tempdir().unwrap();
    let fail = tmp.path().join("tests/fail");

    // A healthy shared case.
    let ok = fail.join("ok");
    fs::create_dir_all(&ok).unwrap();
    fs::write(ok.join("a.rs"), "").unwrap();
    fs::write(ok.join("a.stderr"), "error: a").unwrap();

    // A healthy split case: the sides differ beyond toolchain text.
    let split_ok = fail.join("split-ok");
    fs::create_dir_all(split_ok.join("stable")).unwrap();
    fs::create_dir_all(split_ok.join("nightly")).unwrap();
    fs::write(split_ok.join("stable/e.rs"), "").unwrap();
    fs::write(split_ok.join("nightly/e.rs"), "").unwrap();
    fs::write(split_ok.join("stable/e.stderr"), "error[E0308]: mismatched types").unwrap();
    fs::write(split_ok.join("nightly/e.stderr"), "error[E0599]: no method").unwrap();

    // A shared case missing its snapshot.
    let missing = fail.join("missing");
    fs::create_dir_all(&missing).unwrap();
    fs::write(missing.join("b.rs"), "").unwrap();

    // A split case with a test on one side only.
    let unpaired = fail.join("unpaired");
    fs::create_dir_all(unpaired.join("stable")).unwrap();
    fs::create_dir_all(unpaired.join("nightly")).unwrap();
    fs::write(unpaired.join("stable/c.rs"), "").unwrap();
    fs::write(unpaired.join("stable/c.stderr"), "error: stable c").unwrap();

    // A split case whose sides only differ in toolchain text.
    let redundant = fail.join("redundant");
    fs::create_dir_all(redundant.join("stable")).unwrap();
    fs::create_dir_all(redundant.join("nightly")).unwrap();
    fs::write(redundant.join("stable/d.rs"), "").unwrap();
    fs::write(redundant.join("nightly/d.rs"), "").unwrap();
    fs::write(redundant.join("stable/d.stderr"), "error produced by rustc 1.75.0").unwrap();
    fs::write(
        redundant.join("nightly/d.stderr"),
        "error produced by rustc 1.77.0-nightly (abc1234de 2024-01-15)",
    )
    .unwrap();

    let tests = FailTests::discover(tmp.path()).unwrap();
    assert_eq!(tests.cases.len(), 5);

    let errors = tests.verify();
    assert_eq!(errors.len(), 3);
    assert!(errors
        .iter()
        .any(|e| matches!(e, Error::MissingSnapshot { .. })));
    assert!(errors
        .iter()
        .any(|e| matches!(e, Error::UnpairedTest { file, .. } if file == "c.rs")));
    assert!(errors
        .iter()
        .any(|e| matches!(e, Error::RedundantSplit { file, .. } if file == "d.rs")));
}

#[test]
fn no_fail_directory_means_no_cases() {
    let tmp = tempfile::tempdir().unwrap();
    let tests = FailTests::discover(tmp.path()).unwrap();
    assert!(tests.cases.is_empty());
    assert!(tests.verify().is_empty());
}
