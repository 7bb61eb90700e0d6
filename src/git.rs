//! Thin wrappers around the `git` command line. The snapshot reconciliation
//! uses the working tree state to tell toolchain drift from committed
//! expectations.

use bstr::ByteSlice;
use color_eyre::eyre::{bail, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn git(repo: &Path, args: &[&OsStr]) -> Result<Output> {
    let mut cmd = Command::new("git");
    // Without this, paths with spaces or non-ASCII bytes come back C-quoted
    // and would not resolve on disk.
    cmd.arg("-C")
        .arg(repo)
        .args(["-c", "core.quotepath=off"])
        .args(args);
    let output = cmd.output()?;
    if !output.status.success() {
        bail!(
            "{cmd:?} failed:\n{}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(output)
}

/// The root of the working tree containing `dir`.
pub fn repo_root(dir: &Path) -> Result<PathBuf> {
    let output = git(dir, &["rev-parse".as_ref(), "--show-toplevel".as_ref()])?;
    let root = output.stdout.to_str()?.trim_end();
    Ok(PathBuf::from(root))
}

/// A path that `git status` reported as changed.
#[derive(Debug, Clone)]
pub struct Changed {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// The file is not tracked yet.
    pub untracked: bool,
}

/// All files with the given extension under `dir` that differ from the last
/// commit, including untracked ones.
pub fn changed_files(repo: &Path, dir: &Path, ext: &str) -> Result<Vec<Changed>> {
    let args: Vec<&OsStr> = vec![
        "status".as_ref(),
        "--porcelain=v1".as_ref(),
        "--untracked-files=all".as_ref(),
        "--".as_ref(),
        dir.as_os_str(),
    ];
    let output = git(repo, &args)?;
    let mut changed = vec![];
    for line in output.stdout.lines() {
        if line.len() < 4 {
            continue;
        }
        let path = line[3..].to_str()?;
        // Rename entries list both sides, the right hand one is current.
        let path = path.rsplit(" -> ").next().unwrap_or(path);
        let path = repo.join(path.trim_matches('"'));
        if path.extension().is_some_and(|e| e == ext) {
            changed.push(Changed {
                path,
                untracked: line.starts_with(b"??"),
            });
        }
    }
    Ok(changed)
}

/// Revert the given files: tracked files are checked out from `HEAD`,
/// untracked ones are deleted.
pub fn restore(repo: &Path, paths: &[Changed]) -> Result<()> {
    for changed in paths.iter().filter(|c| c.untracked) {
        std::fs::remove_file(&changed.path)?;
    }
    let tracked: Vec<&OsStr> = paths
        .iter()
        .filter(|c| !c.untracked)
        .map(|c| c.path.as_os_str())
        .collect();
    if !tracked.is_empty() {
        let mut args: Vec<&OsStr> = vec!["checkout".as_ref(), "--".as_ref()];
        args.extend(tracked);
        git(repo, &args)?;
    }
    Ok(())
}

/// Contents of the file as of `HEAD`, or `None` if it is not committed.
pub fn head_contents(repo: &Path, path: &Path) -> Result<Option<Vec<u8>>> {
    let rel = path.strip_prefix(repo).unwrap_or(path);
    let mut spec = std::ffi::OsString::from("HEAD:./");
    spec.push(rel);
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .arg("show")
        .arg(&spec)
        .output()?;
    if output.status.success() {
        Ok(Some(output.stdout))
    } else {
        Ok(None)
    }
}
