//! Discovery and validation of the `tests/fail` snapshot layout.
//!
//! A *case* is a directory under `tests/fail`. A `.rs` file with its sibling
//! `.stderr` snapshot directly in the case directory is *shared*, both
//! channels produce the same diagnostics for it. A test with per-channel
//! copies under `stable/` and `nightly/` subdirectories is *split*. Both
//! kinds may coexist in the same case, only the tests the channels actually
//! disagree on get split.

use crate::error::{Error, Errors};
use crate::toolchain::Channel;
use color_eyre::eyre::Result;
use regex::Regex;
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// A single directory under `tests/fail`.
#[derive(Debug)]
pub struct Case {
    /// The case directory.
    pub dir: PathBuf,
    /// `.rs` file names directly in the case directory, used by both
    /// channels.
    pub shared: Vec<String>,
    /// `.rs` file names with per-channel copies, expected under both the
    /// `stable/` and the `nightly/` directory.
    pub split: Vec<String>,
}

/// All fail-test cases of a crate.
#[derive(Debug)]
pub struct FailTests {
    /// The `tests/fail` directory.
    pub root: PathBuf,
    /// All discovered cases, sorted by name.
    pub cases: Vec<Case>,
}

impl FailTests {
    /// Find all cases under `<crate_dir>/tests/fail`. A missing directory
    /// simply yields no cases.
    pub fn discover(crate_dir: &Path) -> Result<Self> {
        let root = crate_dir.join("tests").join("fail");
        let mut cases = vec![];
        if root.is_dir() {
            let mut entries = std::fs::read_dir(&root)?.collect::<Result<Vec<_>, _>>()?;
            entries.sort_by_key(|entry| entry.file_name());
            for entry in entries {
                let dir = entry.path();
                if !dir.is_dir() {
                    continue;
                }
                let mut split = rs_files(&dir.join(Channel::Stable.dir_name()))?;
                for test in rs_files(&dir.join(Channel::Nightly.dir_name()))? {
                    if !split.contains(&test) {
                        split.push(test);
                    }
                }
                split.sort();
                let shared = rs_files(&dir)?;
                cases.push(Case { dir, shared, split });
            }
        }
        Ok(Self { root, cases })
    }

    /// Check all layout invariants, collecting every violation instead of
    /// stopping at the first.
    pub fn verify(&self) -> Errors {
        let mut errors = vec![];
        for case in &self.cases {
            for file in &case.shared {
                if !case.dir.join(stderr_name(file)).is_file() {
                    errors.push(Error::MissingSnapshot {
                        path: case.dir.join(file),
                    });
                }
            }
            for file in &case.split {
                let mut contents = vec![];
                for channel in [Channel::Stable, Channel::Nightly] {
                    let side = case.dir.join(channel.dir_name());
                    if !side.join(file).is_file() {
                        errors.push(Error::UnpairedTest {
                            case: case.dir.clone(),
                            file: file.clone(),
                            missing: channel,
                        });
                        continue;
                    }
                    match std::fs::read(side.join(stderr_name(file))) {
                        Ok(bytes) => contents.push(bytes),
                        Err(_) => errors.push(Error::MissingSnapshot {
                            path: side.join(file),
                        }),
                    }
                }
                if let [stable, nightly] = &contents[..] {
                    if normalize(stable) == normalize(nightly) {
                        errors.push(Error::RedundantSplit {
                            case: case.dir.clone(),
                            file: file.clone(),
                        });
                    }
                }
            }
        }
        errors
    }

    /// The current contents of every `.stderr` snapshot below the root.
    pub fn snapshot_contents(&self) -> Result<BTreeMap<PathBuf, Vec<u8>>> {
        let mut contents = BTreeMap::new();
        let mut todo = VecDeque::from([self.root.clone()]);
        while let Some(path) = todo.pop_front() {
            if path.is_dir() {
                for entry in std::fs::read_dir(&path)? {
                    todo.push_back(entry?.path());
                }
            } else if path.extension().is_some_and(|ext| ext == "stderr") {
                let bytes = std::fs::read(&path)?;
                contents.insert(path, bytes);
            }
        }
        Ok(contents)
    }
}

/// The snapshot file name belonging to a test file.
pub(crate) fn stderr_name(rs: &str) -> String {
    format!("{}.stderr", rs.strip_suffix(".rs").unwrap_or(rs))
}

fn rs_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = vec![];
    if dir.is_dir() {
        for entry in std::fs::read_dir(dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if name.ends_with(".rs") {
                files.push(name);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Blank out toolchain specific text so stable and nightly snapshots can be
/// compared for anything beyond the toolchain difference itself: rustc
/// version strings (with their optional hash/date suffix) and bare channel
/// names.
pub fn normalize(snapshot: &[u8]) -> Vec<u8> {
    static VERSION: OnceLock<Regex> = OnceLock::new();
    static CHANNEL: OnceLock<Regex> = OnceLock::new();
    let version = VERSION.get_or_init(|| {
        Regex::new(
            r"1\.[0-9]+\.[0-9]+(-(nightly|beta(\.[0-9]+)?))?( \([0-9a-f]+ [0-9]{4}-[0-9]{2}-[0-9]{2}\))?",
        )
        .unwrap()
    });
    let channel = CHANNEL.get_or_init(|| Regex::new(r"\b(stable|beta|nightly)\b").unwrap());
    let text = String::from_utf8_lossy(snapshot);
    let text = version.replace_all(&text, "$$VERSION");
    let text = channel.replace_all(&text, "$$CHANNEL");
    text.into_owned().into_bytes()
}
