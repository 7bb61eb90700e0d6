//! Human readable progress output. Each stage gets a spinner whose message
//! is the most recent output line of the underlying subprocess; `indicatif`
//! truncates it to the terminal width. Full logs only show up on failure.

use crate::error::Error;
use bstr::ByteSlice;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// How many log lines are echoed when a stage fails.
const LOG_TAIL: usize = 50;

/// Progress output for the whole pipeline.
pub(crate) struct Text {
    bars: MultiProgress,
}

impl Text {
    pub(crate) fn new() -> Self {
        Self {
            bars: MultiProgress::new(),
        }
    }

    /// Start a spinner for a stage.
    pub(crate) fn stage(&self, name: &str) -> StageStatus {
        let spinner = self.bars.add(ProgressBar::new_spinner());
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {prefix:.bold} {wide_msg}").unwrap(),
        );
        spinner.set_prefix(name.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        StageStatus {
            bars: self.bars.clone(),
            spinner,
            name: name.to_string(),
        }
    }

    /// Print a message above any active spinner.
    pub(crate) fn note(&self, msg: &str) {
        let _ = self.bars.println(msg);
    }
}

/// Live handle for a single running stage.
pub(crate) struct StageStatus {
    bars: MultiProgress,
    spinner: ProgressBar,
    name: String,
}

impl StageStatus {
    /// Show the given output line as the live tail of this stage.
    pub(crate) fn line(&self, line: &str) {
        self.spinner.set_message(line.to_string());
    }

    /// Finish the stage, leaving a one line verdict behind.
    pub(crate) fn done(self, ok: bool) {
        self.spinner.finish_and_clear();
        let verdict = if ok {
            format!("{} {}", "ok".green().bold(), self.name)
        } else {
            format!("{} {}", "FAILED".red().bold(), self.name)
        };
        let _ = self.bars.println(verdict);
    }
}

/// Render a single failure.
pub(crate) fn print_error(error: &Error) {
    let error_prefix = "error".red().bold();
    match error {
        Error::Stage {
            stage,
            command,
            status,
            log,
        } => {
            eprintln!("{error_prefix}: stage `{stage}` (`{command}`) exited with {status}");
            print_log_tail(log);
        }
        Error::MissingSnapshot { path } => {
            eprintln!(
                "{error_prefix}: `{}` has no matching `.stderr` snapshot",
                path.display()
            );
        }
        Error::UnpairedTest {
            case,
            file,
            missing,
        } => {
            eprintln!(
                "{error_prefix}: `{file}` in `{}` has no {missing} counterpart",
                case.display()
            );
        }
        Error::RedundantSplit { case, file } => {
            eprintln!(
                "{error_prefix}: the stable and nightly snapshots for `{file}` in `{}` are \
                 identical after normalization, merge the case back into a shared layout",
                case.display()
            );
        }
        Error::SnapshotDrift {
            path,
            expected,
            actual,
            bless_command,
        } => {
            eprintln!(
                "{error_prefix}: actual output differed from expected `{}`",
                path.display()
            );
            crate::diff::print_diff(expected, actual);
            eprintln!("run `{bless_command}` to accept the new output");
        }
        Error::NeedsSplit {
            case,
            files,
            bless_command,
        } => {
            eprintln!(
                "{error_prefix}: stable and nightly disagree on {files:?} in `{}`",
                case.display()
            );
            eprintln!("run `{bless_command}` to split the case into stable/nightly snapshots");
        }
    }
}

fn print_log_tail(log: &Path) {
    let Ok(contents) = std::fs::read(log) else {
        return;
    };
    let lines: Vec<_> = contents.lines().collect();
    let skipped = lines.len().saturating_sub(LOG_TAIL);
    if skipped > 0 {
        eprintln!("... {skipped} lines skipped ...");
    }
    for line in &lines[skipped..] {
        eprintln!("{}", line.to_str_lossy());
    }
    eprintln!("full log: {}", log.display());
}
