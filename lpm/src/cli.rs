//! Command-line interface.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use crate::config::{Config, Mode};

/// Longest-prefix match of IP addresses against a prefix-to-AS mapping.
///
/// Addresses are read from stdin, one per line; each gets one output line
/// with the matching label or the sentinel.
#[derive(Debug, Parser)]
#[command(name = "lpm", version, about, long_about = None)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["ip", "generate", "debug", "speed"])
))]
pub struct Cli {
    /// Match addresses from stdin against MAPPING
    #[arg(short = 'i')]
    pub ip: bool,

    /// Regenerate the persisted tries for MAPPING and exit
    #[arg(short = 'g')]
    pub generate: bool,

    /// Match, then report timings and sizes on stderr
    #[arg(short = 'd')]
    pub debug: bool,

    /// Match, then print entries per second on stderr
    #[arg(short = 's')]
    pub speed: bool,

    /// Prefix-to-label mapping file
    #[arg(value_name = "MAPPING")]
    pub mapping: PathBuf,

    /// Output for addresses without a route
    #[arg(long, default_value = "-")]
    pub sentinel: String,

    /// Persisted IPv4 trie [default: MAPPING.tree4]
    #[arg(long, value_name = "PATH")]
    pub tree4: Option<PathBuf>,

    /// Persisted IPv6 trie [default: MAPPING.tree6]
    #[arg(long, value_name = "PATH")]
    pub tree6: Option<PathBuf>,
}

impl Cli {
    /// The selected mode. The "mode" group admits exactly one flag, and
    /// `-i` is the only one that leaves the others unset.
    pub fn mode(&self) -> Mode {
        if self.generate {
            Mode::Generate
        } else if self.debug {
            Mode::Debug
        } else if self.speed {
            Mode::Speed
        } else {
            Mode::Match
        }
    }

    /// Resolve the arguments into a [`Config`].
    pub fn into_config(self) -> Config {
        let mut config = Config::new(self.mode(), self.mapping);
        config.sentinel = self.sentinel;
        if let Some(path) = self.tree4 {
            config.tree4_path = path;
        }
        if let Some(path) = self.tree6 {
            config.tree6_path = path;
        }
        config
    }
}
