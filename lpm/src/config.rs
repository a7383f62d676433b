//! Runtime configuration.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Suffix appended to the mapping path for the persisted IPv4 trie.
pub const TREE4_SUFFIX: &str = ".tree4";
/// Suffix appended to the mapping path for the persisted IPv6 trie.
pub const TREE6_SUFFIX: &str = ".tree6";

/// What a run does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Answer queries, fast-starting from persisted tries when possible.
    Match,
    /// Rebuild and persist both tries, then exit.
    Generate,
    /// Like `Match`, with a timing and size report on stderr.
    Debug,
    /// Like `Match`, printing only the throughput on stderr.
    Speed,
}

impl Mode {
    /// True for every mode that reads queries.
    pub fn answers_queries(self) -> bool {
        self != Mode::Generate
    }
}

/// Configuration for a run.
#[derive(Debug, Clone)]
pub struct Config {
    /// What to do.
    pub mode: Mode,
    /// Prefix-to-label mapping file.
    pub mapping_path: PathBuf,
    /// Persisted IPv4 trie.
    pub tree4_path: PathBuf,
    /// Persisted IPv6 trie.
    pub tree6_path: PathBuf,
    /// Output token for addresses without a route.
    pub sentinel: String,
}

impl Config {
    /// Configuration for `mapping_path`, with the persisted tries next to it.
    pub fn new(mode: Mode, mapping_path: impl Into<PathBuf>) -> Self {
        let mapping_path = mapping_path.into();
        Self {
            mode,
            tree4_path: with_suffix(&mapping_path, TREE4_SUFFIX),
            tree6_path: with_suffix(&mapping_path, TREE6_SUFFIX),
            mapping_path,
            sentinel: String::from("-"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Mode::Match, "mapping.txt")
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = OsString::from(path.as_os_str());
    s.push(suffix);
    PathBuf::from(s)
}
