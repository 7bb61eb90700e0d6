//! Reconciles "expected compiler error" snapshots between the stable and
//! nightly channels.
//!
//! Both channels run the crate's compile-fail tests with the snapshot
//! harness in overwrite mode; git tells us what actually changed. A shared
//! case whose snapshot the nightly run rewrote means the two compilers
//! disagree and the case has to move to the split layout. In check mode
//! nothing is kept: drift is diffed, reverted and reported, and the operator
//! may retry after fixing things up.

use crate::cmd::CommandBuilder;
use crate::config::{Config, SnapshotHandling};
use crate::error::{Error, Errors};
use crate::exec;
use crate::git;
use crate::report::Report;
use crate::snapshots::{stderr_name, FailTests};
use crate::status::{self, Text};
use crate::toolchain::Channel;
use color_eyre::eyre::{bail, Result};
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;

/// Run the fail tests under both channels and reconcile their snapshots.
/// On failure the operator is asked whether to re-run the whole check;
/// declining (or a closed stdin) aborts with an error.
pub(crate) fn run_error_message_tests(
    config: &Config,
    status: &Text,
    report: &mut Report,
) -> Result<()> {
    loop {
        let errors = run_once(config, status, report)?;
        if errors.is_empty() {
            return Ok(());
        }
        for error in &errors {
            status::print_error(error);
        }
        if !config.interactive || !ask_retry()? {
            bail!("{} error message test failure(s)", errors.len());
        }
    }
}

fn ask_retry() -> Result<bool> {
    eprint!("re-run the error message tests? [y/N] ");
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y"))
}

fn run_once(config: &Config, status: &Text, report: &mut Report) -> Result<Errors> {
    let tests = FailTests::discover(&config.base_dir)?;
    if tests.cases.is_empty() {
        status.note(&format!(
            "no fail tests found under `{}`, skipping",
            tests.root.display()
        ));
        return Ok(vec![]);
    }
    let errors = tests.verify();
    if !errors.is_empty() {
        return Ok(errors);
    }

    let repo = git::repo_root(&config.base_dir)?;
    let dirty = git::changed_files(&repo, &tests.root, "stderr")?;
    if !dirty.is_empty() {
        // We cannot tell uncommitted edits apart from toolchain drift.
        bail!(
            "uncommitted snapshot changes under `{}`, commit or revert them first",
            tests.root.display()
        );
    }

    if let Some(err) = run_channel(config, status, report, Channel::Stable)? {
        cleanup(config, &repo, &tests.root)?;
        return Ok(vec![err]);
    }
    let stable_drift = git::changed_files(&repo, &tests.root, "stderr")?;
    match &config.snapshots {
        SnapshotHandling::Check(bless_command) => {
            if !stable_drift.is_empty() {
                let mut errors = vec![];
                for changed in &stable_drift {
                    errors.push(Error::SnapshotDrift {
                        expected: git::head_contents(&repo, &changed.path)?.unwrap_or_default(),
                        actual: std::fs::read(&changed.path)?,
                        path: changed.path.clone(),
                        bless_command: bless_command.clone(),
                    });
                }
                git::restore(&repo, &stable_drift)?;
                return Ok(errors);
            }
        }
        SnapshotHandling::Overwrite => {
            if !stable_drift.is_empty() {
                status.note(&format!("updated {} stable snapshot(s)", stable_drift.len()));
            }
        }
    }

    let before_nightly = tests.snapshot_contents()?;
    if let Some(err) = run_channel(config, status, report, Channel::Nightly)? {
        cleanup(config, &repo, &tests.root)?;
        return Ok(vec![err]);
    }
    let after_nightly = tests.snapshot_contents()?;

    let mut errors = vec![];
    for case in &tests.cases {
        let drifted = drifted_files(&case.dir, &case.shared, &before_nightly, &after_nightly);
        if !drifted.is_empty() {
            match &config.snapshots {
                SnapshotHandling::Overwrite => {
                    // Only the disagreeing files move, the rest of the case
                    // stays shared. Splitting an unchanged file would leave
                    // two identical snapshots behind, which `verify` rejects.
                    split_case(&case.dir, &drifted, &before_nightly)?;
                    status.note(&format!(
                        "split {drifted:?} in `{}` into stable/nightly snapshots",
                        case.dir.display()
                    ));
                }
                SnapshotHandling::Check(bless_command) => errors.push(Error::NeedsSplit {
                    case: case.dir.clone(),
                    files: drifted,
                    bless_command: bless_command.clone(),
                }),
            }
        }
        let nightly_dir = case.dir.join(Channel::Nightly.dir_name());
        for file in drifted_files(&nightly_dir, &case.split, &before_nightly, &after_nightly) {
            match &config.snapshots {
                SnapshotHandling::Overwrite => {
                    status.note(&format!(
                        "updated nightly snapshot for `{file}` in `{}`",
                        case.dir.display()
                    ));
                }
                SnapshotHandling::Check(bless_command) => {
                    let path = nightly_dir.join(stderr_name(&file));
                    errors.push(Error::SnapshotDrift {
                        expected: before_nightly.get(&path).cloned().unwrap_or_default(),
                        actual: after_nightly.get(&path).cloned().unwrap_or_default(),
                        path,
                        bless_command: bless_command.clone(),
                    });
                }
            }
        }
    }

    cleanup(config, &repo, &tests.root)?;
    Ok(errors)
}

/// Run the whole test suite for one channel with the snapshot harness in
/// overwrite mode. A failing run is reported as a stage error, not a hard
/// abort, so the operator gets the retry prompt.
fn run_channel(
    config: &Config,
    status: &Text,
    report: &mut Report,
    channel: Channel,
) -> Result<Option<Error>> {
    let name = format!("error message tests ({channel})");
    let stage = status.stage(&name);
    let cmd = CommandBuilder::cargo(config.toolchain(channel))
        .arg("test")
        .env("TRYBUILD", "overwrite")
        .current_dir(&config.base_dir);
    let output = exec::run_streaming(&cmd, |line| stage.line(line))?;
    let log = config
        .out_dir
        .join("logs")
        .join(format!("error-message-tests-{channel}.log"));
    std::fs::write(&log, &output.log)?;
    report.record(&name, output.status.success(), &log);
    if output.status.success() {
        stage.done(true);
        Ok(None)
    } else {
        stage.done(false);
        Ok(Some(Error::Stage {
            stage: name,
            command: cmd.display(),
            status: output.status,
            log,
        }))
    }
}

/// In check mode, revert whatever the overwrite runs left behind.
fn cleanup(config: &Config, repo: &Path, root: &Path) -> Result<()> {
    if let SnapshotHandling::Check(_) = config.snapshots {
        let drift = git::changed_files(repo, root, "stderr")?;
        if !drift.is_empty() {
            git::restore(repo, &drift)?;
        }
    }
    Ok(())
}

/// The files in `files` whose snapshot under `dir` changed between the two
/// recorded states.
pub(crate) fn drifted_files(
    dir: &Path,
    files: &[String],
    before: &BTreeMap<std::path::PathBuf, Vec<u8>>,
    after: &BTreeMap<std::path::PathBuf, Vec<u8>>,
) -> Vec<String> {
    files
        .iter()
        .filter(|file| {
            let path = dir.join(stderr_name(file.as_str()));
            before.get(&path) != after.get(&path)
        })
        .cloned()
        .collect()
}

/// Move the given shared tests of a case into the split layout. The
/// recorded pre-nightly contents become the stable snapshots, the on-disk
/// (post-nightly) contents the nightly ones; the test files exist on both
/// sides. Shared tests not listed stay where they are.
pub(crate) fn split_case(
    case_dir: &Path,
    files: &[String],
    before: &BTreeMap<std::path::PathBuf, Vec<u8>>,
) -> Result<()> {
    let stable = case_dir.join(Channel::Stable.dir_name());
    let nightly = case_dir.join(Channel::Nightly.dir_name());
    std::fs::create_dir_all(&stable)?;
    std::fs::create_dir_all(&nightly)?;
    for file in files {
        let rs = case_dir.join(file);
        let stderr = case_dir.join(stderr_name(file));
        std::fs::copy(&rs, stable.join(file))?;
        std::fs::copy(&rs, nightly.join(file))?;
        std::fs::copy(&stderr, nightly.join(stderr_name(file)))?;
        let stable_contents = before.get(&stderr).cloned().unwrap_or_default();
        std::fs::write(stable.join(stderr_name(file)), stable_contents)?;
        std::fs::remove_file(rs)?;
        std::fs::remove_file(stderr)?;
    }
    Ok(())
}
