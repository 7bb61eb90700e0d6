//! Scratch directories that mirror the crate under test through symlinks.
//! Builds that rewrite the lockfile (`cargo update --precise`,
//! `-Z minimal-versions`) run in a scratch directory so they never dirty
//! the source tree.

use color_eyre::eyre::{Context, Result};
use std::path::{Path, PathBuf};

/// Entries that are never mirrored into a scratch directory.
const SKIPPED: &[&str] = &["target", ".git"];

/// Set up `out_dir/scratch/<name>`, wiping whatever a previous run left
/// there. Every top-level entry of `src` is symlinked into it, except the
/// lockfile, which is copied so cargo can rewrite it in place.
pub fn scratch_dir(src: &Path, out_dir: &Path, name: &str) -> Result<PathBuf> {
    let dir = out_dir.join("scratch").join(name);
    if dir.exists() {
        std::fs::remove_dir_all(&dir)
            .wrap_err_with(|| format!("failed to clear `{}`", dir.display()))?;
    }
    std::fs::create_dir_all(&dir)?;
    let src = src
        .canonicalize()
        .wrap_err_with(|| format!("failed to resolve `{}`", src.display()))?;
    for entry in std::fs::read_dir(&src)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if SKIPPED.contains(&name.as_ref()) {
            continue;
        }
        let link = dir.join(name.as_ref());
        if name == "Cargo.lock" {
            std::fs::copy(entry.path(), &link)?;
        } else {
            symlink(&entry.path(), &link)?;
        }
    }
    Ok(dir)
}

#[cfg(unix)]
fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    if original.is_dir() {
        std::os::windows::fs::symlink_dir(original, link)
    } else {
        std::os::windows::fs::symlink_file(original, link)
    }
}
