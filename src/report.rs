//! Machine readable summary of a pipeline run, for CI to pick up alongside
//! the per-stage log files.

use color_eyre::eyre::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of a single stage.
#[derive(Debug, Serialize)]
pub struct StageOutcome {
    /// Stage name.
    pub name: String,
    /// Whether the stage passed.
    pub ok: bool,
    /// The log file holding the full output.
    pub log: PathBuf,
}

/// Outcome of every stage that ran, in execution order. Written to
/// `out_dir/report.json` even when the pipeline aborts early.
#[derive(Debug, Default, Serialize)]
pub struct Report {
    /// The recorded stages.
    pub stages: Vec<StageOutcome>,
}

impl Report {
    /// Record one finished stage.
    pub fn record(&mut self, name: &str, ok: bool, log: &Path) {
        self.stages.push(StageOutcome {
            name: name.into(),
            ok,
            log: log.into(),
        });
    }

    /// Serialize the report into `out_dir/report.json`.
    pub fn write(&self, out_dir: &Path) -> Result<PathBuf> {
        let path = out_dir.join("report.json");
        std::fs::write(&path, serde_json::to_vec_pretty(self)?)?;
        Ok(path)
    }
}
