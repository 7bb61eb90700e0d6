//! Toolchain detection and MSRV discovery.

use color_eyre::eyre::{Context, Result};
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::process::Command;

/// The two release channels whose diagnostics may differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// The stable release channel.
    Stable,
    /// The nightly release channel.
    Nightly,
}

impl Channel {
    /// Directory name used by split fail tests.
    pub fn dir_name(self) -> &'static str {
        match self {
            Channel::Stable => "stable",
            Channel::Nightly => "nightly",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Make sure the toolchain is installed and report its rustc version.
pub fn version_meta(toolchain: &str) -> Result<rustc_version::VersionMeta> {
    let mut cmd = Command::new("rustup");
    cmd.args(["run", toolchain, "rustc"]);
    rustc_version::VersionMeta::for_command(cmd).map_err(|err| {
        color_eyre::eyre::Report::new(err)
            .wrap_err(format!("failed to query rustc for toolchain `{toolchain}`"))
    })
}

/// Read the declared `rust-version` from a manifest, if there is one.
/// The plain `rust-version = "..."` key is pattern matched directly;
/// indirections like `rust-version.workspace = true` go through
/// `cargo metadata`, which resolves them for us.
pub fn msrv_from_manifest(manifest: &Path) -> Result<Option<String>> {
    let text = std::fs::read_to_string(manifest)
        .wrap_err_with(|| format!("failed to read `{}`", manifest.display()))?;
    if let Some(version) = parse_rust_version(&text) {
        return Ok(Some(version));
    }
    if !text.contains("rust-version") {
        return Ok(None);
    }
    let manifest = manifest.canonicalize()?;
    let metadata = cargo_metadata::MetadataCommand::new()
        .manifest_path(&manifest)
        .no_deps()
        .exec()?;
    Ok(metadata
        .packages
        .iter()
        .find(|package| package.manifest_path.as_std_path() == manifest)
        .and_then(|package| package.rust_version.as_ref())
        .map(|version| version.to_string()))
}

/// Extract the value of the first `rust-version = "..."` key in the given
/// manifest text.
pub fn parse_rust_version(manifest: &str) -> Option<String> {
    let key = Regex::new(r#"(?m)^\s*rust-version\s*=\s*"([^"]+)""#).unwrap();
    key.captures(manifest).map(|caps| caps[1].to_string())
}
