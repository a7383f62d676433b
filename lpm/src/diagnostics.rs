//! Logging setup and the `-d` / `-s` reports.

use std::io::{self, Write};
use std::time::Duration;

use lpm_trie::Family;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Mode;
use crate::query::QueryStats;
use crate::table::{Opened, Source};

const DEFAULT_FILTER: &str = "lpm=warn,lpm_trie=warn";
const DEBUG_FILTER: &str = "lpm=info,lpm_trie=info";

/// Install the global subscriber. `RUST_LOG` overrides the mode's default
/// filter. Events go to stderr; stdout carries only query answers.
pub fn init_logging(mode: Mode) {
    let default = match mode {
        Mode::Debug => DEBUG_FILTER,
        _ => DEFAULT_FILTER,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A subscriber may already be set (tests); keep it.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(io::stderr),
        )
        .try_init();
}

/// Timing and size report for `-d`.
pub fn write_report(out: &mut impl Write, opened: &Opened, stats: &QueryStats) -> io::Result<()> {
    writeln!(out, "\n=== lpm report ===")?;
    match opened.source {
        Source::Persisted => writeln!(out, "deserialization time: {}", ms(opened.elapsed))?,
        Source::Rebuilt => writeln!(out, "build time: {}", ms(opened.elapsed))?,
    }

    if let Some(load) = &opened.load {
        writeln!(
            out,
            "mapping: {} lines, {} IPv4 + {} IPv6 routes, {} rejected",
            load.lines, load.v4_routes, load.v6_routes, load.rejected
        )?;
        writeln!(
            out,
            "  encode {} / insert {}",
            ms(load.encode_time),
            ms(load.insert_time)
        )?;
    }

    for family in Family::ALL {
        let trie = opened.table.trie(family);
        let mem = trie.memory_usage();
        writeln!(
            out,
            "{family}: {} routes, {} nodes, {} arena bytes ({:.1} bytes/node)",
            trie.len(),
            mem.nodes,
            mem.arena_bytes + mem.spilled_bytes,
            mem.bytes_per_node
        )?;
    }

    match memory_stats::memory_stats() {
        Some(usage) => writeln!(
            out,
            "resident memory: {:.1} MiB",
            usage.physical_mem as f64 / (1024.0 * 1024.0)
        )?,
        None => writeln!(out, "resident memory: unavailable")?,
    }

    writeln!(
        out,
        "mapped entries: {} ({} with a route) in {}",
        stats.queries,
        stats.matched,
        ms(stats.elapsed)
    )?;
    for target in [80_000, 1_000_000] {
        writeln!(out, "  projected for {target}: {}", ms(project(stats, target)))?;
    }
    write_speed(out, stats)
}

/// Throughput line for `-s`.
pub fn write_speed(out: &mut impl Write, stats: &QueryStats) -> io::Result<()> {
    writeln!(out, "{:.0} entries/sec", stats.per_second())
}

/// Time `stats` would take for `entries` queries at the same rate.
fn project(stats: &QueryStats, entries: usize) -> Duration {
    if stats.queries == 0 {
        return Duration::ZERO;
    }
    stats.elapsed.mul_f64(entries as f64 / stats.queries as f64)
}

fn ms(d: Duration) -> String {
    format!("{:.3} ms", d.as_secs_f64() * 1e3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableBuilder;

    #[test]
    fn test_projection_scales_linearly() {
        let stats = QueryStats {
            queries: 1000,
            matched: 10,
            elapsed: Duration::from_secs(1),
        };
        assert_eq!(project(&stats, 80_000), Duration::from_secs(80));
        assert_eq!(project(&QueryStats::default(), 80_000), Duration::ZERO);
    }

    #[test]
    fn test_report_mentions_each_family() {
        let opened = Opened {
            table: TableBuilder::new().freeze(),
            source: Source::Persisted,
            elapsed: Duration::from_millis(1),
            load: None,
        };
        let mut out = Vec::new();
        write_report(&mut out, &opened, &QueryStats::default()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("deserialization time"));
        assert!(text.contains("IPv4: 0 routes, 1 nodes"));
        assert!(text.contains("IPv6: 0 routes"));
        assert!(text.contains("projected for 1000000"));
        assert!(text.ends_with("entries/sec\n"));
    }
}
