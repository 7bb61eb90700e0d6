#![deny(missing_docs)]

//! A release pipeline for Rust crates, meant to run as pre-release (or CI)
//! glue around `cargo` and `rustup`.
//!
//! The pipeline runs, in order: the test suite on stable and nightly (for
//! the crate and each configured subdirectory), a build with the declared
//! MSRV after optionally pinning back dependencies, a build against minimal
//! dependency versions, an optional coverage report, and, for proc-macro
//! crates, reconciliation of "expected compiler error" snapshots between
//! the stable and nightly channels.

use colored::Colorize;

mod cmd;
mod config;
mod diff;
mod error;
mod exec;
pub mod git;
mod reconcile;
mod report;
mod scratch;
mod snapshots;
mod stages;
mod status;
mod toolchain;
#[cfg(test)]
mod tests;

pub use cmd::*;
pub use config::*;
pub use error::*;
pub use report::*;
pub use scratch::scratch_dir;
pub use snapshots::{normalize, Case, FailTests};
pub use toolchain::*;

pub use color_eyre;
use color_eyre::eyre::Result;

/// Run the full pipeline as described by the config. The first failing
/// stage aborts the run; the partial report is still written.
pub fn run(config: Config) -> Result<()> {
    let status = status::Text::new();
    std::fs::create_dir_all(config.out_dir.join("logs"))?;

    // Fail early if a toolchain is missing entirely.
    for name in [&config.stable, &config.nightly] {
        let meta = toolchain::version_meta(name)?;
        status.note(&format!("toolchain {name}: rustc {}", meta.semver));
    }

    let mut report = Report::default();
    let result = run_stages(&config, &status, &mut report);
    report.write(&config.out_dir)?;
    result?;
    eprintln!("{}", "pipeline passed".green().bold());
    Ok(())
}

fn run_stages(config: &Config, status: &status::Text, report: &mut Report) -> Result<()> {
    for dir in config.crate_dirs() {
        stages::test_suite(config, status, report, &dir, &config.stable)?;
        stages::test_suite(config, status, report, &dir, &config.nightly)?;
    }
    stages::msrv_build(config, status, report)?;
    stages::minimal_versions_build(config, status, report)?;
    if config.coverage {
        stages::coverage(config, status, report)?;
    }
    if config.is_proc_macro {
        reconcile::run_error_message_tests(config, status, report)?;
    }
    Ok(())
}
