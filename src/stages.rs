//! The non-interactive pipeline stages: the toolchain test matrix, the MSRV
//! build, the minimal-versions build and the coverage report. Each stage is
//! one subprocess; its full output goes to a log file under `out_dir/logs`
//! and is echoed (truncated) only on failure.

use crate::cmd::CommandBuilder;
use crate::config::Config;
use crate::error::Error;
use crate::exec;
use crate::report::Report;
use crate::scratch::scratch_dir;
use crate::status::{self, Text};
use crate::toolchain;
use color_eyre::eyre::{bail, Result};
use std::path::Path;

pub(crate) fn run_stage(
    config: &Config,
    status: &Text,
    report: &mut Report,
    name: &str,
    cmd: &CommandBuilder,
) -> Result<()> {
    let stage = status.stage(name);
    let log = config.out_dir.join("logs").join(format!("{}.log", slug(name)));
    let output = exec::run_streaming(cmd, |line| stage.line(line))?;
    std::fs::write(&log, &output.log)?;
    report.record(name, output.status.success(), &log);
    if output.status.success() {
        stage.done(true);
        Ok(())
    } else {
        stage.done(false);
        status::print_error(&Error::Stage {
            stage: name.into(),
            command: cmd.display(),
            status: output.status,
            log,
        });
        bail!("stage `{name}` failed");
    }
}

/// `cargo +<toolchain> test` in the given crate directory.
pub(crate) fn test_suite(
    config: &Config,
    status: &Text,
    report: &mut Report,
    dir: &Path,
    toolchain: &str,
) -> Result<()> {
    let name = format!("test {} +{toolchain}", dir_label(config, dir));
    let cmd = CommandBuilder::cargo(toolchain).arg("test").current_dir(dir);
    run_stage(config, status, report, &name, &cmd)
}

/// Build with the declared MSRV toolchain, after pinning back dependencies
/// that no longer support it. Runs in a scratch directory so the pinned
/// lockfile never reaches the source tree.
pub(crate) fn msrv_build(config: &Config, status: &Text, report: &mut Report) -> Result<()> {
    let msrv = match &config.msrv {
        Some(msrv) => Some(msrv.clone()),
        None => toolchain::msrv_from_manifest(&config.manifest_path())?,
    };
    let Some(msrv) = msrv else {
        status.note("msrv: no `rust-version` in the manifest, skipping");
        return Ok(());
    };
    let dir = scratch_dir(&config.base_dir, &config.out_dir, "msrv")?;
    for pin in &config.msrv_pins {
        // The pin runs on stable, old cargo may not know `--precise` quirks.
        let cmd = CommandBuilder::cargo(&config.stable)
            .args(["update", "-p", pin.name.as_str(), "--precise", pin.version.as_str()])
            .current_dir(&dir);
        run_stage(config, status, report, &format!("msrv pin {pin}"), &cmd)?;
    }
    let cmd = CommandBuilder::cargo(&msrv).arg("build").current_dir(&dir);
    run_stage(config, status, report, &format!("msrv build ({msrv})"), &cmd)
}

/// Downgrade the lockfile to the minimal versions every dependency
/// declaration still allows, then make sure the crate builds with them.
pub(crate) fn minimal_versions_build(
    config: &Config,
    status: &Text,
    report: &mut Report,
) -> Result<()> {
    let dir = scratch_dir(&config.base_dir, &config.out_dir, "minimal-versions")?;
    let update = CommandBuilder::cargo(&config.nightly)
        .args(["update", "-Z", "minimal-versions"])
        .current_dir(&dir);
    run_stage(config, status, report, "minimal-versions update", &update)?;
    let build = CommandBuilder::cargo(&config.stable)
        .args(["build", "--all-targets"])
        .current_dir(&dir);
    run_stage(config, status, report, "minimal-versions build", &build)
}

/// Produce an HTML coverage report under `out_dir/coverage` via
/// `cargo llvm-cov`.
pub(crate) fn coverage(config: &Config, status: &Text, report: &mut Report) -> Result<()> {
    let html = config.out_dir.join("coverage");
    let cmd = CommandBuilder::cargo(&config.stable)
        .args(["llvm-cov", "--html", "--output-dir"])
        .arg(&html)
        .current_dir(&config.base_dir);
    run_stage(config, status, report, "coverage", &cmd)
}

fn dir_label(config: &Config, dir: &Path) -> String {
    dir.strip_prefix(&config.base_dir)
        .ok()
        .filter(|rel| !rel.as_os_str().is_empty())
        .map(|rel| rel.display().to_string())
        .unwrap_or_else(|| ".".into())
}

/// Log file name for a stage.
pub(crate) fn slug(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}
