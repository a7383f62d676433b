//! # lpm
//!
//! Longest-prefix match of IP addresses against a prefix-to-AS mapping.
//!
//! The mapping file holds one `<prefix>/<length> <label>` route per line.
//! Routes are built into one trie per address family (see [`lpm_trie`]),
//! and both tries are persisted next to the mapping so later runs can
//! fast-start by parsing them instead of re-inserting every route.
//!
//! ## Modes
//!
//! - `-i <mapping>`: answer addresses from stdin, one label per line.
//! - `-g <mapping>`: regenerate the persisted tries and exit.
//! - `-d <mapping>`: answer, then report timings and sizes on stderr.
//! - `-s <mapping>`: answer, then print entries/sec on stderr.
//!
//! ## Example
//!
//! ```rust
//! use lpm::{mapping, query, TableBuilder};
//!
//! let mut builder = TableBuilder::new();
//! mapping::read_into("10.0.0.0/8 100\n10.1.0.0/16 200\n".as_bytes(), &mut builder)?;
//! let table = builder.freeze();
//!
//! let mut out = Vec::new();
//! query::run(&table, "10.1.2.3\n11.0.0.0\n".as_bytes(), &mut out, "-")?;
//! assert_eq!(out, b"200\n-\n");
//! # Ok::<(), lpm::Error>(())
//! ```

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod mapping;
pub mod query;
pub mod table;

use std::io::{BufRead, Write};

use tracing::info;

pub use config::{Config, Mode};
pub use error::{Error, Result};
pub use query::QueryStats;
pub use table::{Opened, RouteTable, Source, TableBuilder};

/// Exit status for fatal errors.
pub const EXIT_FAILURE: u8 = 1;
/// Exit status for bad command-line usage.
pub const EXIT_USAGE: u8 = 2;
/// Exit status when the mapping yields no route.
pub const EXIT_MAPPING_EMPTY: u8 = 3;

/// Execute one run of the tool.
///
/// Answers go to `output`; the `-d` and `-s` reports go to `diag`.
pub fn run(
    config: &Config,
    input: impl BufRead,
    output: impl Write,
    mut diag: impl Write,
) -> Result<()> {
    if !config.mode.answers_queries() {
        let generated = RouteTable::generate(config)?;
        if generated.routes == 0 {
            return Err(Error::EmptyTable);
        }
        return Ok(());
    }

    let opened = RouteTable::open(config)?;
    if opened.table.is_empty() {
        return Err(Error::EmptyTable);
    }
    info!(source = ?opened.source, routes = opened.table.route_count(), "route table ready");

    let stats = query::run(&opened.table, input, output, &config.sentinel)?;
    match config.mode {
        Mode::Debug => diagnostics::write_report(&mut diag, &opened, &stats)?,
        Mode::Speed => diagnostics::write_speed(&mut diag, &stats)?,
        Mode::Match | Mode::Generate => {}
    }
    Ok(())
}
