//! Command line processing for the `cargo-gauntlet` binary.

use color_eyre::eyre::{bail, Result};

/// Plain arguments for the pipeline binary.
#[derive(Debug, Default)]
pub struct Args {
    /// Accept changed snapshots instead of erroring on them.
    pub overwrite: bool,
}

impl Args {
    /// Parse the process arguments.
    pub fn parse() -> Result<Self> {
        Self::parse_args(std::env::args().skip(1))
    }

    /// Parse an argument list. The only accepted argument is `overwrite`;
    /// anything else is a usage error.
    pub fn parse_args(iter: impl Iterator<Item = String>) -> Result<Self> {
        let mut this = Self::default();
        for arg in iter {
            match arg.as_str() {
                "" => {}
                "overwrite" if this.overwrite => {
                    bail!("duplicate argument `overwrite`, usage: cargo-gauntlet [overwrite]")
                }
                "overwrite" => this.overwrite = true,
                "--help" | "-h" => bail!("usage: cargo-gauntlet [overwrite]"),
                _ => bail!("unknown argument `{arg}`, usage: cargo-gauntlet [overwrite]"),
            }
        }
        Ok(this)
    }
}
