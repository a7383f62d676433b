//! Query loop: one address per input line, one answer per output line.

use std::io::{self, BufRead, BufWriter, Write};
use std::time::{Duration, Instant};

use crate::table::RouteTable;

/// Counters for one query run.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryStats {
    /// Input lines answered.
    pub queries: usize,
    /// Answers that found a route.
    pub matched: usize,
    /// Wall time of the loop, I/O included.
    pub elapsed: Duration,
}

impl QueryStats {
    /// Answered lines per second.
    pub fn per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.queries as f64 / secs
        } else {
            0.0
        }
    }
}

/// Answer every line of `input` on `output`.
///
/// Each line gets the decimal label of its longest matching prefix, or
/// `sentinel` when there is none. Lines that are not addresses, blank lines
/// included, are answered with the sentinel so the output stays aligned
/// with the input.
pub fn run(
    table: &RouteTable,
    mut input: impl BufRead,
    output: impl Write,
    sentinel: &str,
) -> io::Result<QueryStats> {
    let started = Instant::now();
    let mut out = BufWriter::new(output);
    let mut line = Vec::with_capacity(64);
    let mut stats = QueryStats::default();

    loop {
        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        stats.queries += 1;

        let label = std::str::from_utf8(&line)
            .ok()
            .and_then(|text| table.lookup(text.trim()));
        match label {
            Some(label) => {
                stats.matched += 1;
                writeln!(out, "{label}")?;
            }
            None => writeln!(out, "{sentinel}")?,
        }
    }

    out.flush()?;
    stats.elapsed = started.elapsed();
    Ok(stats)
}
