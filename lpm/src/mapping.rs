//! Mapping input: `<prefix>/<length> <label>` per line.
//!
//! A blank line ends the input. Malformed lines are reported and skipped;
//! they never abort a build.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

use lpm_trie::bits::BitString;
use lpm_trie::{key, Family, Label};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::table::TableBuilder;

/// One parsed mapping record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Family of the prefix.
    pub family: Family,
    /// Prefix bits, truncated to the prefix length.
    pub key: BitString,
    /// Label bound to the prefix.
    pub label: Label,
}

/// Summary of a mapping load.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Non-blank lines seen.
    pub lines: usize,
    /// Accepted IPv4 records.
    pub v4_routes: usize,
    /// Accepted IPv6 records.
    pub v6_routes: usize,
    /// Lines skipped as malformed.
    pub rejected: usize,
    /// Time spent parsing and encoding lines.
    pub encode_time: Duration,
    /// Time spent inserting into the tries.
    pub insert_time: Duration,
}

/// Parse one mapping line. `number` is only used for error reporting.
pub fn parse_line(number: usize, text: &str) -> Result<Route> {
    let malformed = |reason: String| Error::MalformedMappingLine {
        line: number,
        reason,
    };

    let (prefix, rest) = text
        .trim()
        .split_once('/')
        .ok_or_else(|| malformed("missing '/' between prefix and length".into()))?;
    let mut fields = rest.split_whitespace();
    let mask = fields
        .next()
        .ok_or_else(|| malformed("missing prefix length".into()))?;
    let label = fields
        .next()
        .ok_or_else(|| malformed("missing route label".into()))?;
    if let Some(extra) = fields.next() {
        return Err(malformed(format!("unexpected field {extra:?}")));
    }

    let mask: usize = mask
        .parse()
        .map_err(|_| malformed(format!("invalid prefix length {mask:?}")))?;
    let digits = label
        .strip_prefix("AS")
        .or_else(|| label.strip_prefix("as"))
        .unwrap_or(label);
    let label = digits
        .parse::<u32>()
        .map_err(|_| malformed(format!("invalid route label {label:?}")))?;
    let label = Label::new(label).ok_or_else(|| malformed("route label 0 is reserved".into()))?;

    let (family, key) = key::encode_prefix(prefix, mask).map_err(|e| malformed(e.to_string()))?;
    Ok(Route { family, key, label })
}

/// Load a mapping file into `builder`.
pub fn load(path: &Path, builder: &mut TableBuilder) -> Result<LoadReport> {
    let unreadable = |source: std::io::Error| Error::SourceFileUnreadable {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(unreadable)?;
    let report = read_into(BufReader::new(file), builder).map_err(|e| match e {
        Error::Io(source) => unreadable(source),
        other => other,
    })?;
    debug!(
        path = %path.display(),
        lines = report.lines,
        rejected = report.rejected,
        "loaded mapping"
    );
    Ok(report)
}

/// Read mapping lines from any buffered reader into `builder`.
pub fn read_into(reader: impl BufRead, builder: &mut TableBuilder) -> Result<LoadReport> {
    let mut report = LoadReport::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        report.lines += 1;

        let started = Instant::now();
        let parsed = parse_line(idx + 1, &line);
        report.encode_time += started.elapsed();

        match parsed {
            Ok(route) => {
                match route.family {
                    Family::V4 => report.v4_routes += 1,
                    Family::V6 => report.v6_routes += 1,
                }
                let started = Instant::now();
                builder.insert(route);
                report.insert_time += started.elapsed();
            }
            Err(err) => {
                report.rejected += 1;
                warn!(%err, "skipping mapping line");
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipv4() {
        let route = parse_line(1, "10.1.0.0/16 200").unwrap();
        assert_eq!(route.family, Family::V4);
        assert_eq!(route.key, b"0000101000000001".to_vec());
        assert_eq!(route.label.get(), 200);
    }

    #[test]
    fn test_parse_ipv6_and_whitespace() {
        let route = parse_line(1, "  2001:db8::/32\t2  \r").unwrap();
        assert_eq!(route.family, Family::V6);
        assert_eq!(route.key.len(), 32);
        assert_eq!(route.label.get(), 2);

        let route = parse_line(1, "::/0 1").unwrap();
        assert!(route.key.is_empty());
    }

    #[test]
    fn test_parse_as_prefix() {
        assert_eq!(parse_line(1, "1.0.0.0/24 AS13335").unwrap().label.get(), 13335);
    }

    #[test]
    fn test_malformed_lines() {
        for (text, needle) in [
            ("10.0.0.0 100", "missing '/'"),
            ("10.0.0.0/8", "missing route label"),
            ("10.0.0.0/x 100", "invalid prefix length"),
            ("10.0.0.0/8 abc", "invalid route label"),
            ("10.0.0.0/8 0", "reserved"),
            ("10.0.0.0/40 1", "exceeds"),
            ("10.0.0/8 1", "not an IPv4 address"),
            ("10.0.0.0/8 1 2", "unexpected field"),
        ] {
            match parse_line(7, text) {
                Err(Error::MalformedMappingLine { line, reason }) => {
                    assert_eq!(line, 7);
                    assert!(reason.contains(needle), "{text}: {reason}");
                }
                other => panic!("{text}: expected malformed line, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_read_into_skips_bad_lines_and_stops_at_blank() {
        let input = "10.0.0.0/8 100\nbogus\n2001:db8::/32 2\n10.1.0.0/16 0\n\n10.2.0.0/16 5\n";
        let mut builder = TableBuilder::new();
        let report = read_into(input.as_bytes(), &mut builder).unwrap();

        assert_eq!(report.lines, 4);
        assert_eq!(report.v4_routes, 1);
        assert_eq!(report.v6_routes, 1);
        assert_eq!(report.rejected, 2);
        assert_eq!(builder.route_count(), 2);
    }

    #[test]
    fn test_missing_file() {
        let mut builder = TableBuilder::new();
        let err = load(Path::new("/nonexistent/lpm/mapping.txt"), &mut builder).unwrap_err();
        assert!(matches!(err, Error::SourceFileUnreadable { .. }));
    }
}
