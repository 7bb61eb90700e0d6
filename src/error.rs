use crate::toolchain::Channel;
use std::path::PathBuf;
use std::process::ExitStatus;

/// All the ways in which a pipeline run can fail.
#[derive(Debug)]
#[must_use]
pub enum Error {
    /// A stage subprocess exited with a non-zero status.
    Stage {
        /// Human readable stage name.
        stage: String,
        /// The command that was run.
        command: String,
        /// The exit status of the command.
        status: ExitStatus,
        /// Where the full output was written.
        log: PathBuf,
    },
    /// A fail test without a sibling `.stderr` snapshot.
    MissingSnapshot {
        /// Path to the test file.
        path: PathBuf,
    },
    /// A split case where one channel has a test the other lacks.
    UnpairedTest {
        /// The case directory.
        case: PathBuf,
        /// The test file present on one side only.
        file: String,
        /// The channel that is missing the file.
        missing: Channel,
    },
    /// A split case whose stable and nightly snapshots no longer differ
    /// once toolchain specific text is normalized away.
    RedundantSplit {
        /// The case directory.
        case: PathBuf,
        /// The test file whose snapshots are equivalent.
        file: String,
    },
    /// A snapshot differed from the compiler output.
    SnapshotDrift {
        /// The snapshot file that drifted.
        path: PathBuf,
        /// The expected contents.
        expected: Vec<u8>,
        /// The output the compiler actually produced.
        actual: Vec<u8>,
        /// A command, that when run, accepts the new output instead of erroring.
        bless_command: String,
    },
    /// Stable and nightly produced different output for a shared case,
    /// so the case has to move to the split layout.
    NeedsSplit {
        /// The case directory.
        case: PathBuf,
        /// The test files the two channels disagree on.
        files: Vec<String>,
        /// A command, that when run, performs the split.
        bless_command: String,
    },
}

pub(crate) type Errors = Vec<Error>;
