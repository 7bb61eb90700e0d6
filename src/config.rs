use crate::toolchain::Channel;
use color_eyre::eyre::{bail, Result};
use std::fmt;
use std::path::PathBuf;

mod args;
pub use args::Args;

/// Central datastructure containing all information to run the pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// The crate under test.
    pub base_dir: PathBuf,
    /// Additional member crates to run the test stages in, relative to
    /// `base_dir`.
    pub subdirs: Vec<String>,
    /// Whether the crate is a proc macro with compile-fail snapshot tests.
    pub is_proc_macro: bool,
    /// Explicit MSRV; read from the manifest when `None`.
    pub msrv: Option<String>,
    /// Dependency downgrades applied before the MSRV build.
    pub msrv_pins: Vec<Pin>,
    /// What to do when snapshots differ from the compiler output.
    pub snapshots: SnapshotHandling,
    /// Where logs, scratch directories and reports go.
    /// Defaults to `$CARGO_TARGET_DIR` (or `<base_dir>/target`) + `gauntlet`.
    pub out_dir: PathBuf,
    /// Name of the stable toolchain.
    pub stable: String,
    /// Name of the nightly toolchain.
    pub nightly: String,
    /// Produce a coverage report under `out_dir`.
    pub coverage: bool,
    /// Ask whether to retry when error message tests fail.
    pub interactive: bool,
}

impl Config {
    /// Create a configuration for testing the crate in `base_dir` with
    /// default settings.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            out_dir: std::env::var_os("CARGO_TARGET_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| base_dir.join("target"))
                .join("gauntlet"),
            base_dir,
            subdirs: Vec::new(),
            is_proc_macro: false,
            msrv: None,
            msrv_pins: Vec::new(),
            snapshots: SnapshotHandling::Check("cargo-gauntlet overwrite".into()),
            stable: "stable".into(),
            nightly: "nightly".into(),
            coverage: false,
            interactive: true,
        }
    }

    /// Build the config from `GAUNTLET_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(var("GAUNTLET_DIR").unwrap_or_else(|| ".".into()));
        if let Some(subdirs) = var("GAUNTLET_SUBDIRS") {
            config.subdirs = subdirs.split_whitespace().map(Into::into).collect();
        }
        config.is_proc_macro = flag("GAUNTLET_PROC_MACRO");
        config.msrv = var("GAUNTLET_MSRV");
        if let Some(pins) = var("GAUNTLET_MSRV_PINS") {
            config.msrv_pins = pins.split_whitespace().map(Pin::parse).collect::<Result<_>>()?;
        }
        config.coverage = flag("GAUNTLET_COVERAGE");
        Ok(config)
    }

    /// Apply parsed command line arguments. Without `overwrite` the conflict
    /// handling suggests re-running the current command with it appended.
    pub fn with_args(&mut self, args: &Args) {
        self.snapshots = if args.overwrite {
            SnapshotHandling::Overwrite
        } else {
            let argv0 = std::env::args()
                .next()
                .unwrap_or_else(|| "cargo-gauntlet".into());
            SnapshotHandling::Check(format!("{argv0} overwrite"))
        };
    }

    /// All crate directories the test stages run in.
    pub fn crate_dirs(&self) -> Vec<PathBuf> {
        std::iter::once(self.base_dir.clone())
            .chain(self.subdirs.iter().map(|sub| self.base_dir.join(sub)))
            .collect()
    }

    /// Path to the manifest of the crate under test.
    pub fn manifest_path(&self) -> PathBuf {
        self.base_dir.join("Cargo.toml")
    }

    /// The configured toolchain name for the given channel.
    pub fn toolchain(&self, channel: Channel) -> &str {
        match channel {
            Channel::Stable => &self.stable,
            Channel::Nightly => &self.nightly,
        }
    }
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn flag(name: &str) -> bool {
    matches!(var(name).as_deref(), Some("1" | "true" | "yes"))
}

/// A `name@version` dependency downgrade for the MSRV build. Newer versions
/// of a dependency frequently require a newer compiler than the crate's own
/// MSRV, so the lockfile is pinned back before building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    /// Crate name as it appears in the lockfile.
    pub name: String,
    /// Exact version passed to `cargo update --precise`.
    pub version: String,
}

impl Pin {
    /// Parse a `name@version` pair.
    pub fn parse(pin: &str) -> Result<Self> {
        match pin.split_once('@') {
            Some((name, version)) if !name.is_empty() && !version.is_empty() => Ok(Self {
                name: name.into(),
                version: version.into(),
            }),
            _ => bail!("invalid dependency pin `{pin}`, expected `name@version`"),
        }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// The different options for what to do when snapshots differ from the
/// actual compiler output.
#[derive(Debug, Clone)]
pub enum SnapshotHandling {
    /// Error out on drift. The string is a command that can be executed to
    /// accept the new snapshots instead.
    Check(String),
    /// Replace drifted snapshots with the compiler output and split cases
    /// the channels disagree on.
    Overwrite,
}
